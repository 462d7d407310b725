//! Flow Users Server
//!
//! HTTP front end for the account service: routes, extractors, error
//! responses and startup configuration. All account decisions are made in
//! `flow-core`.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use routes::app;
pub use state::AppState;
