//! JWT bearer-token validation pipeline
//!
//! ```text
//! token ─▶ decode ─▶ alg check ─▶ JWKS ─▶ verify ─▶ claims ─▶ Principal
//! ```
//!
//! - [`decode`](mod@decode) - structural parsing, no trust
//! - [`jwks`] - discovery, retrieval and caching of the issuer's keys
//! - [`verify`](mod@verify) - RSA PKCS#1 v1.5 signature check
//! - [`claims`] - `alg`/`iss`/`aud`/`exp`/`nbf`/`sub` checks
//!
//! [`AuthGate`](crate::AuthGate) runs the stages in order.

pub mod claims;
pub mod decode;
pub mod jwks;
pub mod verify;

pub use claims::{ClaimsValidator, Principal, check_algorithm};
pub use decode::{DecodedToken, JsonObject, base64url_decode, decode};
pub use jwks::{HttpJwksFetcher, Jwk, JwksCache, JwksDocument, JwksFetcher};
pub use verify::{SignatureAlgorithm, find_key, verify};
