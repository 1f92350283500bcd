//! Authentication error taxonomy
//!
//! Every stage of bearer-token validation reports one of these categories.
//! They exist for local diagnostics only: the [`AuthGate`](crate::AuthGate)
//! folds all of them into [`Unauthenticated`] before anything reaches a client,
//! so an attacker cannot tell an expired token from an unknown key or a bad
//! signature by looking at the response.

use thiserror::Error;

/// Result type for authentication stages
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Internal authentication failure categories
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    /// Token is not three base64url segments of JSON/JSON/bytes
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Discovery document or JWKS could not be retrieved or parsed
    #[error("JWKS fetch failed: {0}")]
    JwksFetch(String),

    /// No RSA key in the current JWKS matches the token's `kid`
    #[error("Key not found for kid: {kid}")]
    KeyNotFound {
        /// The key ID requested by the token header (empty when absent)
        kid: String,
    },

    /// Signature did not verify against the selected key
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// One of alg/iss/aud/exp/nbf/sub was rejected
    #[error("Claim rejected: {claim}")]
    ClaimRejected {
        /// Name of the offending claim or header field
        claim: &'static str,
    },

    /// Required configuration value is absent
    #[error("Missing required configuration: {key}")]
    ConfigurationMissing {
        /// Configuration key (environment variable name)
        key: &'static str,
    },

    /// Configuration value is present but unusable
    #[error("Invalid configuration for {key}: {message}")]
    ConfigurationInvalid {
        /// Configuration key (environment variable name)
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl AuthError {
    /// Create a malformed-token error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedToken(message.into())
    }

    /// Create a JWKS fetch error
    pub fn jwks_fetch(message: impl Into<String>) -> Self {
        Self::JwksFetch(message.into())
    }

    /// Create a claim rejection
    pub fn claim(claim: &'static str) -> Self {
        Self::ClaimRejected { claim }
    }

    /// Short, stable category label used as a structured log field
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::JwksFetch(_) => "jwks_fetch_failure",
            Self::KeyNotFound { .. } => "key_not_found",
            Self::SignatureInvalid => "signature_invalid",
            Self::ClaimRejected { .. } => "claim_rejected",
            Self::ConfigurationMissing { .. } => "configuration_missing",
            Self::ConfigurationInvalid { .. } => "configuration_invalid",
        }
    }
}

/// The only failure the outside world ever sees from the auth gate
///
/// Deliberately carries no detail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("Could not validate credentials")]
pub struct Unauthenticated;

impl From<AuthError> for Unauthenticated {
    fn from(_: AuthError) -> Self {
        Unauthenticated
    }
}
