//! JWKS (JSON Web Key Set) retrieval and caching
//!
//! One document is cached for the configured issuer. A fresh document is
//! served from memory; an expired or missing one is refetched lazily by the
//! next caller. The network fetch never runs under the cache lock, and
//! concurrent callers that all see a stale cache share a single refresh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// A JSON Web Key as published by the identity provider
///
/// Only the members needed to select and rebuild an RSA key are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Key type (`RSA`, `EC`, ...)
    #[serde(default)]
    pub kty: String,
    /// Intended algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use (`sig`, `enc`)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus, unpadded base64url big-endian
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, unpadded base64url big-endian
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// `{ "keys": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksDocument {
    /// Published keys
    pub keys: Vec<Jwk>,
}

/// The part of the OpenID Connect discovery document we need
#[derive(Debug, Clone, Deserialize)]
struct OidcDiscoveryDocument {
    jwks_uri: String,
}

/// Source of JWKS documents
#[async_trait]
pub trait JwksFetcher: Send + Sync + std::fmt::Debug {
    /// Retrieve the current key set
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::JwksFetch`] when the document cannot be obtained.
    async fn fetch(&self) -> AuthResult<JwksDocument>;
}

/// Fetches keys via OpenID Connect discovery
///
/// `GET {issuer}/.well-known/openid-configuration` yields `jwks_uri`, which is
/// then fetched and parsed. Both requests share one client and its timeout.
#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    discovery_url: String,
    http_client: reqwest::Client,
}

impl HttpJwksFetcher {
    /// Create a fetcher for the configured issuer
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigurationInvalid`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::ConfigurationInvalid {
                key: "JWKS_HTTP_TIMEOUT_SECS",
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            discovery_url: config.discovery_url(),
            http_client,
        })
    }

    /// The discovery endpoint this fetcher starts from
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> AuthResult<T> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to fetch {what}");
            AuthError::jwks_fetch(format!("{what} request failed: {e}"))
        })?;

        if !response.status().is_success() {
            error!(url = %url, status = %response.status(), "{what} endpoint returned error status");
            return Err(AuthError::jwks_fetch(format!(
                "{what} endpoint returned status {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to parse {what}");
            AuthError::jwks_fetch(format!("invalid {what}: {e}"))
        })
    }
}

#[async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self) -> AuthResult<JwksDocument> {
        let discovery: OidcDiscoveryDocument = self
            .get_json(&self.discovery_url, "discovery document")
            .await?;

        debug!(jwks_uri = %discovery.jwks_uri, "Discovered JWKS endpoint");

        let jwks: JwksDocument = self.get_json(&discovery.jwks_uri, "JWKS").await?;

        info!(
            jwks_uri = %discovery.jwks_uri,
            key_count = jwks.keys.len(),
            "Fetched JWKS"
        );

        Ok(jwks)
    }
}

#[derive(Debug, Clone)]
struct CachedJwks {
    document: Arc<JwksDocument>,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Outcome of one refresh, shared with every caller that waited on it
type RefreshOutcome = AuthResult<Arc<JwksDocument>>;

enum RefreshRole {
    Lead(watch::Sender<Option<RefreshOutcome>>),
    Follow(watch::Receiver<Option<RefreshOutcome>>),
}

/// Time-bounded cache of the issuer's JWKS document
#[derive(Debug)]
pub struct JwksCache {
    fetcher: Arc<dyn JwksFetcher>,
    ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
    /// Receiver for the refresh in flight, if any. Never held across a fetch.
    inflight: Mutex<Option<watch::Receiver<Option<RefreshOutcome>>>>,
}

impl JwksCache {
    /// Create an empty cache in front of `fetcher`
    pub fn new(fetcher: Arc<dyn JwksFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            cache: RwLock::new(None),
            inflight: Mutex::new(None),
        }
    }

    /// Return the cached document, fetching it if missing or expired
    ///
    /// Concurrent callers that miss the cache wait on a single fetch and all
    /// receive its outcome, success or failure.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError::JwksFetch`] from the fetcher. A failed fetch
    /// is not cached and a stale entry is never served; the next caller after
    /// the failure starts a new fetch.
    pub async fn get_jwks(&self) -> AuthResult<Arc<JwksDocument>> {
        loop {
            if let Some(document) = self.fresh().await {
                debug!("Using cached JWKS");
                return Ok(document);
            }

            let role = {
                let mut inflight = self.inflight.lock().await;

                // Another caller may have refreshed while we waited
                if let Some(document) = self.fresh().await {
                    return Ok(document);
                }

                // A closed channel belongs to a refresh that was abandoned
                match inflight.as_ref().filter(|rx| rx.has_changed().is_ok()) {
                    Some(rx) => RefreshRole::Follow(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        *inflight = Some(rx);
                        RefreshRole::Lead(tx)
                    }
                }
            };

            match role {
                RefreshRole::Lead(tx) => return self.refresh(tx).await,
                RefreshRole::Follow(mut rx) => {
                    if let Ok(outcome) = rx.wait_for(Option::is_some).await {
                        if let Some(outcome) = outcome.clone() {
                            return outcome;
                        }
                    }
                    debug!("JWKS refresh abandoned, retrying");
                }
            }
        }
    }

    async fn refresh(&self, tx: watch::Sender<Option<RefreshOutcome>>) -> RefreshOutcome {
        let outcome = self.fetcher.fetch().await.map(Arc::new);

        if let Ok(document) = &outcome {
            *self.cache.write().await = Some(CachedJwks {
                document: Arc::clone(document),
                fetched_at: Instant::now(),
            });
        }

        tx.send_replace(Some(outcome.clone()));
        *self.inflight.lock().await = None;

        outcome
    }

    /// Drop the cached document so the next call refetches
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
        debug!("JWKS cache cleared");
    }

    async fn fresh(&self) -> Option<Arc<JwksDocument>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.is_fresh(self.ttl))
            .map(|cached| Arc::clone(&cached.document))
    }
}
