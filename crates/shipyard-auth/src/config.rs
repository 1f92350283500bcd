//! Authentication configuration
//!
//! The three identity-provider settings (algorithm, issuer, audience) are
//! mandatory. [`AuthConfig::new`] refuses to build without them so a
//! misconfigured service fails at startup instead of rejecting every request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::jwt::SignatureAlgorithm;

/// Default JWKS cache lifetime (1 hour)
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default timeout applied to each discovery/JWKS request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The single accepted signature algorithm (`alg` header must match exactly)
    pub algorithm: SignatureAlgorithm,
    /// Expected `iss` claim; also the base URL for OIDC discovery
    pub issuer: String,
    /// Expected `aud` claim (exact string equality)
    pub audience: String,
    /// How long a fetched JWKS document stays fresh
    pub jwks_cache_ttl: Duration,
    /// Timeout for each outbound discovery/JWKS request
    pub http_timeout: Duration,
}

impl AuthConfig {
    /// Build a configuration from raw (possibly absent) values
    ///
    /// # Errors
    ///
    /// - [`AuthError::ConfigurationMissing`] if any value is absent or blank
    /// - [`AuthError::ConfigurationInvalid`] if the algorithm is not a
    ///   supported RSA PKCS#1 v1.5 scheme
    pub fn new(
        algorithm: Option<&str>,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> AuthResult<Self> {
        let algorithm = require("ALGORITHM", algorithm)?;
        let issuer = require("ISSUER", issuer)?;
        let audience = require("AUDIENCE", audience)?;

        let algorithm = algorithm
            .parse::<SignatureAlgorithm>()
            .map_err(|message| AuthError::ConfigurationInvalid {
                key: "ALGORITHM",
                message,
            })?;

        Ok(Self {
            algorithm,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Override the JWKS cache lifetime
    #[must_use]
    pub fn with_jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    /// Override the outbound request timeout
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// OIDC discovery document URL for the configured issuer
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/.well-known/openid-configuration",
            self.issuer.trim_end_matches('/')
        )
    }
}

fn require<'a>(key: &'static str, value: Option<&'a str>) -> AuthResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::ConfigurationMissing { key }),
    }
}
