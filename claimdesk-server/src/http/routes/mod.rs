//! Route handlers organized by resource

pub mod api;
pub mod auth;
pub mod health;
pub mod protected;

#[cfg(test)]
pub(crate) mod test_support;
