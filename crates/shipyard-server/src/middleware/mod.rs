//! HTTP middleware: authentication, rate limiting and CORS

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{authentication_middleware, extract_bearer_token};
pub use cors::build_cors_layer;
pub use rate_limit::{client_key, rate_limiting_middleware};
