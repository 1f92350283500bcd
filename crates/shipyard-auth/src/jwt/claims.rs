//! Registered-claim validation
//!
//! Runs after the signature has been verified. Checks are applied in a fixed
//! order (`iss`, `aud`, `exp`, `nbf`, `sub`) and the first failure wins.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::decode::{DecodedToken, JsonObject};
use super::verify::SignatureAlgorithm;
use crate::error::{AuthError, AuthResult};

/// The authenticated subject of a request
///
/// Built from the token's `sub` claim. A string is kept verbatim; any other
/// scalar is rendered as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal from a subject identifier
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    /// The subject identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject tokens whose header `alg` is not exactly the configured algorithm
///
/// # Errors
///
/// Returns [`AuthError::ClaimRejected`] naming `alg`.
pub fn check_algorithm(token: &DecodedToken, expected: SignatureAlgorithm) -> AuthResult<()> {
    if token.alg() == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(AuthError::claim("alg"))
    }
}

/// Validates issuer, audience, lifetime and subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsValidator {
    issuer: String,
    audience: String,
}

impl ClaimsValidator {
    /// Create a validator expecting the given issuer and audience
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Validate `payload` at unix time `now` (seconds)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ClaimRejected`] naming the first claim that fails.
    pub fn validate(&self, payload: &JsonObject, now: u64) -> AuthResult<Principal> {
        if payload.get("iss").and_then(Value::as_str) != Some(self.issuer.as_str()) {
            return Err(AuthError::claim("iss"));
        }

        // Exact string match; array audiences are not accepted
        if payload.get("aud").and_then(Value::as_str) != Some(self.audience.as_str()) {
            return Err(AuthError::claim("aud"));
        }

        let now = now as f64;

        let exp = numeric_claim(payload, "exp")?;
        if exp <= now {
            return Err(AuthError::claim("exp"));
        }

        let nbf = numeric_claim(payload, "nbf")?;
        if nbf > now {
            return Err(AuthError::claim("nbf"));
        }

        subject(payload)
    }
}

/// Absent means 0; present but non-numeric is a rejection
fn numeric_claim(payload: &JsonObject, claim: &'static str) -> AuthResult<f64> {
    match payload.get(claim) {
        None => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(|| AuthError::claim(claim)),
    }
}

fn subject(payload: &JsonObject) -> AuthResult<Principal> {
    match payload.get("sub") {
        Some(Value::String(sub)) => Ok(Principal::new(sub.as_str())),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Principal::new(value.to_string())),
        _ => Err(AuthError::claim("sub")),
    }
}
