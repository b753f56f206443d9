//! Subcommand implementations

pub mod config;
pub mod serve;
pub mod tables;

pub use config::run_config;
pub use serve::run_serve;
pub use tables::{run_fetch, run_upsert, run_whoami};
