//! Per-client fixed-window rate limiting
//!
//! Each client key owns a counter and a window boundary. When a request
//! arrives after the boundary the counter restarts and a new window opens;
//! the request is then counted and rejected if the count exceeds the limit.
//!
//! ```rust,no_run
//! use shipyard_auth::rate_limit::{RateLimitConfig, RateLimitKey, RateLimiter};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(
//!     RateLimitConfig::builder()
//!         .limit(100, Duration::from_secs(60))
//!         .build(),
//! );
//!
//! match limiter.check(&RateLimitKey::ip("192.168.1.1")).await {
//!     Ok(()) => { /* serve the request */ }
//!     Err(info) => println!("Retry after {} seconds", info.retry_after_secs()),
//! }
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default requests per window when none is configured
pub const DEFAULT_LIMIT: u32 = 100;

/// Default window length when none is configured
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Longest window the limiter honours; longer windows are clamped to it
pub const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed-window rate limiter keyed by client
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<RwLock<RateLimitState>>,
}

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
    /// Whether the limiter is active
    pub enabled: bool,
    /// How often idle counters are swept
    pub cleanup_interval: Duration,
}

/// Client identity for rate limiting
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RateLimitKey {
    /// Key type (`ip`, ...)
    pub key_type: String,
    /// Key value
    pub value: String,
}

/// Details of a rejected request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Time until the current window closes
    pub retry_after: Duration,
    /// Requests counted in the current window, this one included
    pub current_count: u32,
    /// Maximum allowed requests
    pub limit: u32,
    /// Window length
    pub window: Duration,
}

#[derive(Debug, Default)]
struct RateLimitState {
    entries: HashMap<RateLimitKey, WindowCounter>,
    last_cleanup: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_reset: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(RateLimitState::default())),
        }
    }

    /// Create a disabled rate limiter (for testing)
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::builder().enabled(false).build())
    }

    /// The active configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request for `key` and decide whether it may proceed
    ///
    /// Returns `Ok(())` if allowed, `Err(RateLimitInfo)` if over the limit.
    /// Rejected requests are still counted.
    pub async fn check(&self, key: &RateLimitKey) -> Result<(), RateLimitInfo> {
        if !self.config.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let window = self.config.window;
        let window_end = self.window_end(now);
        let mut state = self.state.write().await;

        self.maybe_cleanup(&mut state, now);

        let counter = state.entries.entry(key.clone()).or_insert(WindowCounter {
            count: 0,
            window_reset: window_end,
        });

        if now > counter.window_reset {
            counter.count = 0;
            counter.window_reset = window_end;
        }

        counter.count = counter.count.saturating_add(1);

        if counter.count > self.config.limit {
            let info = RateLimitInfo {
                retry_after: counter.window_reset.saturating_duration_since(now),
                current_count: counter.count,
                limit: self.config.limit,
                window,
            };
            warn!(
                key_type = %key.key_type,
                client = %key.value,
                count = info.current_count,
                limit = info.limit,
                "Rate limit exceeded"
            );
            return Err(info);
        }

        Ok(())
    }

    /// Current count and limit for `key`, if it has an open window
    pub async fn get_usage(&self, key: &RateLimitKey) -> Option<(u32, u32)> {
        let now = Instant::now();
        let state = self.state.read().await;

        state.entries.get(key).map(|counter| {
            let current = if now > counter.window_reset {
                0
            } else {
                counter.count
            };
            (current, self.config.limit)
        })
    }

    /// Forget the counter for a specific key
    pub async fn reset(&self, key: &RateLimitKey) {
        let mut state = self.state.write().await;
        state.entries.remove(key);
    }

    /// Number of tracked clients
    pub async fn tracked_clients(&self) -> usize {
        self.state.read().await.entries.len()
    }

    fn window_end(&self, now: Instant) -> Instant {
        let window = self.config.window.min(MAX_WINDOW);
        now.checked_add(window).unwrap_or(now)
    }

    fn maybe_cleanup(&self, state: &mut RateLimitState, now: Instant) {
        let should_cleanup = state
            .last_cleanup
            .is_none_or(|t| now.saturating_duration_since(t) > self.config.cleanup_interval);

        if should_cleanup {
            // Evict counters whose window ended more than one full window ago
            let window = self.config.window;
            let before = state.entries.len();
            state
                .entries
                .retain(|_, counter| now.saturating_duration_since(counter.window_reset) <= window);

            let evicted = before - state.entries.len();
            if evicted > 0 {
                debug!(evicted, remaining = state.entries.len(), "Evicted idle rate limit counters");
            }

            state.last_cleanup = Some(now);
        }
    }
}

impl RateLimitConfig {
    /// Create a new configuration builder
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for rate limit configuration
#[derive(Debug)]
pub struct RateLimitConfigBuilder {
    limit: u32,
    window: Duration,
    enabled: bool,
    cleanup_interval: Option<Duration>,
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            enabled: true,
            cleanup_interval: None,
        }
    }
}

impl RateLimitConfigBuilder {
    /// Set the per-window request limit and window length
    pub fn limit(mut self, requests: u32, window: Duration) -> Self {
        self.limit = requests;
        self.window = window;
        self
    }

    /// Set the cleanup interval for idle counters
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable the rate limiter
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RateLimitConfig {
        RateLimitConfig {
            limit: self.limit,
            window: self.window,
            enabled: self.enabled,
            cleanup_interval: self.cleanup_interval.unwrap_or(Duration::from_secs(300)),
        }
    }
}

impl RateLimitKey {
    /// Create a key based on client address
    pub fn ip(ip: impl Into<String>) -> Self {
        Self {
            key_type: "ip".to_string(),
            value: ip.into(),
        }
    }
}

impl RateLimitInfo {
    /// `Retry-After` value: whole seconds, rounded up, at least 1
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        let rounded = if self.retry_after.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        };
        rounded.max(1)
    }
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate limited: {}/{} requests in {:?}, retry after {:?}",
            self.current_count, self.limit, self.window, self.retry_after
        )
    }
}

impl std::error::Error for RateLimitInfo {}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig::builder()
                .limit(limit, Duration::from_secs(window_secs))
                .build(),
        )
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_up_to_limit() {
        let limiter = limiter(5, 60);
        let key = RateLimitKey::ip("192.168.1.1");

        for _ in 0..5 {
            assert!(limiter.check(&key).await.is_ok());
        }
        assert!(limiter.check(&key).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_blocks_over_limit() {
        let limiter = limiter(2, 60);
        let key = RateLimitKey::ip("192.168.1.1");

        assert!(limiter.check(&key).await.is_ok());
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(limiter.check(&key).await.is_ok());

        let info = limiter.check(&key).await.unwrap_err();
        assert_eq!(info.current_count, 3);
        assert_eq!(info.limit, 2);
        assert_eq!(info.retry_after, Duration::from_secs(40));
        assert_eq!(info.retry_after_secs(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_boundary() {
        let limiter = limiter(3, 10);
        let key = RateLimitKey::ip("10.0.0.1");

        for _ in 0..3 {
            limiter.check(&key).await.unwrap();
        }
        assert!(limiter.check(&key).await.is_err());

        // Exactly at the boundary the old window still applies
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.check(&key).await.is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        for _ in 0..3 {
            assert!(limiter.check(&key).await.is_ok());
        }
        assert!(limiter.check(&key).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::disabled();
        let key = RateLimitKey::ip("192.168.1.1");

        for _ in 0..1000 {
            assert!(limiter.check(&key).await.is_ok());
        }
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn test_rate_limiter_different_keys() {
        let limiter = limiter(1, 60);
        let key1 = RateLimitKey::ip("192.168.1.1");
        let key2 = RateLimitKey::ip("192.168.1.2");

        assert!(limiter.check(&key1).await.is_ok());
        assert!(limiter.check(&key2).await.is_ok());

        assert!(limiter.check(&key1).await.is_err());
        assert!(limiter.check(&key2).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_limiter_reset() {
        let limiter = limiter(1, 60);
        let key = RateLimitKey::ip("192.168.1.1");

        assert!(limiter.check(&key).await.is_ok());
        assert!(limiter.check(&key).await.is_err());

        limiter.reset(&key).await;
        assert!(limiter.check(&key).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_checks_lose_no_updates() {
        let limiter = limiter(50, 60);
        let key = RateLimitKey::ip("203.0.113.7");

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let limiter = limiter.clone();
                let key = key.clone();
                tokio::spawn(async move { limiter.check(&key).await.is_ok() })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 50);
        assert_eq!(limiter.get_usage(&key).await, Some((200, 50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_counters_are_evicted() {
        let limiter = RateLimiter::new(
            RateLimitConfig::builder()
                .limit(10, Duration::from_secs(10))
                .cleanup_interval(Duration::from_secs(5))
                .build(),
        );

        limiter.check(&RateLimitKey::ip("idle")).await.unwrap();
        assert_eq!(limiter.tracked_clients().await, 1);

        // Window ends at t=10; still within one window of that at t=20
        tokio::time::advance(Duration::from_secs(20)).await;
        limiter.check(&RateLimitKey::ip("active")).await.unwrap();
        assert_eq!(limiter.tracked_clients().await, 2);

        tokio::time::advance(Duration::from_secs(6)).await;
        limiter.check(&RateLimitKey::ip("active")).await.unwrap();
        assert_eq!(limiter.tracked_clients().await, 1);
        assert!(limiter.get_usage(&RateLimitKey::ip("idle")).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_is_clamped() {
        let limiter = RateLimiter::new(
            RateLimitConfig::builder()
                .limit(1, Duration::from_secs(u64::MAX))
                .build(),
        );
        let key = RateLimitKey::ip("10.9.9.9");

        assert!(limiter.check(&key).await.is_ok());
        let info = limiter.check(&key).await.unwrap_err();
        assert_eq!(info.retry_after, MAX_WINDOW);
        assert_eq!(info.retry_after_secs(), MAX_WINDOW.as_secs());

        tokio::time::advance(MAX_WINDOW + Duration::from_secs(1)).await;
        assert!(limiter.check(&key).await.is_ok());
    }

    #[test]
    fn test_retry_after_rounding() {
        let info = |retry_after| RateLimitInfo {
            retry_after,
            current_count: 2,
            limit: 1,
            window: Duration::from_secs(60),
        };

        assert_eq!(info(Duration::from_millis(1500)).retry_after_secs(), 2);
        assert_eq!(info(Duration::from_secs(3)).retry_after_secs(), 3);
        assert_eq!(info(Duration::ZERO).retry_after_secs(), 1);
    }

    #[test]
    fn test_config_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit, DEFAULT_LIMIT);
        assert_eq!(config.window, DEFAULT_WINDOW);
        assert!(config.enabled);
    }
}
