//! # Shipyard Auth
//!
//! OAuth2 bearer-token validation against a remote identity provider, plus the
//! per-client rate limiter that sits in front of it.
//!
//! ## Architecture
//!
//! - [`jwt`] - the validation pipeline
//!   - `jwks` - OIDC discovery and a TTL-bounded key cache
//!   - `decode` - structural JWT parsing
//!   - `verify` - RSA PKCS#1 v1.5 signature verification
//!   - `claims` - `alg`/`iss`/`aud`/`exp`/`nbf`/`sub` checks
//! - [`gate`] - [`AuthGate`], composing the pipeline behind [`TokenAuthenticator`]
//! - [`rate_limit`] - fixed-window per-client limiter
//! - [`config`] - validated identity-provider settings
//! - [`error`] - internal failure taxonomy and the uniform [`Unauthenticated`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shipyard_auth::{AuthConfig, AuthGate, TokenAuthenticator};
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new(
//!     Some("RS256"),
//!     Some("https://tenant.auth.example.com/"),
//!     Some("https://api.shipyard.example.com"),
//! )?;
//! let gate = AuthGate::new(&config)?;
//!
//! match gate.authenticate(token).await {
//!     Ok(principal) => println!("hello {principal}"),
//!     Err(e) => println!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod rate_limit;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, Unauthenticated};
pub use gate::{AuthGate, TokenAuthenticator};
pub use jwt::{Principal, SignatureAlgorithm};
pub use rate_limit::{RateLimitConfig, RateLimitInfo, RateLimitKey, RateLimiter};
