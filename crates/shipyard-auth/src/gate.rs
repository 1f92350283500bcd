//! The Auth Gate: one call from bearer token to principal

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult, Unauthenticated};
use crate::jwt::{
    ClaimsValidator, HttpJwksFetcher, JwksCache, JwksFetcher, Principal, SignatureAlgorithm,
    check_algorithm, decode, verify,
};

/// "Authenticate this token" contract used by the HTTP layer
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    /// Validate a raw bearer token
    ///
    /// # Errors
    ///
    /// Returns [`Unauthenticated`] for every failure, whatever the cause.
    async fn authenticate(&self, token: &str) -> Result<Principal, Unauthenticated>;
}

/// Validates bearer tokens against the configured identity provider
///
/// Stages run in order: decode, `alg` check, JWKS lookup, signature
/// verification, claims. The `alg` check happens before any key retrieval so
/// tokens with a foreign algorithm never cause network traffic.
#[derive(Debug)]
pub struct AuthGate {
    algorithm: SignatureAlgorithm,
    jwks: JwksCache,
    claims: ClaimsValidator,
}

impl AuthGate {
    /// Build a gate that discovers keys over HTTP
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let fetcher = HttpJwksFetcher::new(config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Build a gate around an arbitrary key source
    pub fn with_fetcher(config: &AuthConfig, fetcher: Arc<dyn JwksFetcher>) -> Self {
        Self {
            algorithm: config.algorithm,
            jwks: JwksCache::new(fetcher, config.jwks_cache_ttl),
            claims: ClaimsValidator::new(&config.issuer, &config.audience),
        }
    }

    /// The key cache backing this gate
    pub fn jwks(&self) -> &JwksCache {
        &self.jwks
    }

    /// Run the full pipeline at unix time `now`, keeping the failure category
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub async fn validate(&self, token: &str, now: u64) -> AuthResult<Principal> {
        let decoded = decode(token)?;

        check_algorithm(&decoded, self.algorithm)?;

        let jwks = self.jwks.get_jwks().await?;

        if !verify(&decoded, &jwks, self.algorithm)? {
            return Err(AuthError::SignatureInvalid);
        }

        self.claims.validate(&decoded.payload, now)
    }
}

#[async_trait]
impl TokenAuthenticator for AuthGate {
    async fn authenticate(&self, token: &str) -> Result<Principal, Unauthenticated> {
        match self.validate(token, unix_now()).await {
            Ok(principal) => {
                debug!(principal = %principal, "Token accepted");
                Ok(principal)
            }
            Err(err) => {
                warn!(category = err.category(), error = %err, "Token rejected");
                Err(err.into())
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
