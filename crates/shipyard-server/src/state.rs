//! Shared application state

use std::sync::Arc;

use shipyard_auth::{RateLimiter, TokenAuthenticator};

use crate::store::ShipStore;

/// State handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    /// Ship records
    pub store: Arc<ShipStore>,
    /// Bearer-token validation
    pub authenticator: Arc<dyn TokenAuthenticator>,
    /// Per-client request budget
    pub limiter: RateLimiter,
    /// Whether proxy headers identify the client
    pub trust_forwarded_headers: bool,
}

impl AppState {
    /// Create state with forwarded headers ignored
    pub fn new(
        store: Arc<ShipStore>,
        authenticator: Arc<dyn TokenAuthenticator>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            store,
            authenticator,
            limiter,
            trust_forwarded_headers: false,
        }
    }

    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP`
    #[must_use]
    pub fn with_trusted_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ships", &self.store.len())
            .field("limiter", &self.limiter)
            .field("trust_forwarded_headers", &self.trust_forwarded_headers)
            .finish_non_exhaustive()
    }
}
