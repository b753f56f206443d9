//! claimdesk-server: the table editor over HTTP
//!
//! Serves the login form, the protected page with both tables as editable
//! grids, and a small JSON API over the same per-user drafts.

pub mod drafts;
pub mod http;
pub mod render;
pub mod session;

pub use drafts::DraftStore;
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
