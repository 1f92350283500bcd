//! # Shipyard Server
//!
//! Ship registry HTTP API. Every `/ships` route requires an OAuth2 bearer token
//! validated by [`shipyard_auth`]; every route counts against a per-client
//! rate limit.
//!
//! ## Architecture
//!
//! - [`routes`] - router and handlers
//! - [`middleware`] - bearer authentication, rate limiting, CORS
//! - [`store`] - in-memory ship records and startup preload
//! - [`config`] - layered configuration (defaults, file, environment)
//! - [`cli`] - command-line overrides
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - [`ServerError`] and its HTTP mapping

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{ConfigError, LogFormat, LoggingConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use routes::router;
pub use state::AppState;
pub use store::{Ship, ShipQuery, ShipStore, StoreError};

/// Server name
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Server version
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
