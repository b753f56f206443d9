//! claimdesk-core: tables, the page pipeline and configuration
//!
//! The HTTP server and the CLI both drive a [`Backend`]; this crate holds
//! everything that does not depend on which backend or which front end.

pub mod backend;
pub mod cell;
pub mod config;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod table;

pub use backend::{AccessToken, Backend, Session, User};
pub use config::DeskConfig;
pub use error::{BackendError, DeskError, Result};
pub use memory::MemoryBackend;
pub use pipeline::{PageLoad, SaveOutcome, SessionCheck};
pub use table::{rows_from_json, Row, Table, TableName, TableSet};
