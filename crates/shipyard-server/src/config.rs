//! Server configuration management
//!
//! Layers, lowest precedence first: built-in defaults, an optional config file
//! (TOML, YAML or JSON, chosen by extension), then environment variables named
//! after the keys (`ISSUER`, `RATE_LIMIT`, ...). CLI flags are applied on top
//! by [`Cli::apply`](crate::cli::Cli::apply).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shipyard_auth::rate_limit::MAX_WINDOW;
use shipyard_auth::{AuthConfig, AuthResult, RateLimitConfig};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Signature algorithm accepted on bearer tokens (`RS256`, ...)
    pub algorithm: Option<String>,
    /// Identity provider issuer URL
    pub issuer: Option<String>,
    /// Expected token audience
    pub audience: Option<String>,
    /// Requests allowed per client per window
    pub rate_limit: u32,
    /// Rate limit window, seconds
    pub rate_limit_period: u64,
    /// `*` or a comma-separated origin list
    pub allow_origins: String,
    /// Bind address
    pub bind_address: String,
    /// Bind port
    pub port: u16,
    /// Seed file loaded at startup
    pub data_file: Option<PathBuf>,
    /// JWKS cache lifetime, seconds
    pub jwks_cache_ttl_secs: u64,
    /// Timeout for discovery/JWKS requests, seconds
    pub jwks_http_timeout_secs: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP` instead of the peer address
    pub trust_forwarded_headers: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level / filter directive
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            algorithm: None,
            issuer: None,
            audience: None,
            rate_limit: 100,
            rate_limit_period: 60,
            allow_origins: "*".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            data_file: Some(PathBuf::from("data/sample_ships.json")),
            jwks_cache_ttl_secs: 3600,
            jwks_http_timeout_secs: 10,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            trust_forwarded_headers: false,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// A value parsed but is unusable
    #[error("Invalid configuration for {key}: {message}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl ServerConfig {
    /// Load configuration from the process environment and an optional file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The file format is unsupported
    /// - A value cannot be parsed into its field type
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File, FileFormat};

        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("rate_limit", i64::from(defaults.rate_limit))?
            .set_default("rate_limit_period", defaults.rate_limit_period)?
            .set_default("allow_origins", defaults.allow_origins)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default(
                "data_file",
                defaults
                    .data_file
                    .as_deref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_default("jwks_cache_ttl_secs", defaults.jwks_cache_ttl_secs)?
            .set_default("jwks_http_timeout_secs", defaults.jwks_http_timeout_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("trust_forwarded_headers", defaults.trust_forwarded_headers)?;

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }

            let format = match path.extension().and_then(|s| s.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("yaml" | "yml") => FileFormat::Yaml,
                Some("json") => FileFormat::Json,
                _ => return Err(ConfigError::UnsupportedFormat),
            };

            builder = builder.add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ));
        }

        // Environment variables override file settings (12-factor app pattern)
        builder = builder.add_source(Environment::default().try_parsing(true).source(env));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_period == 0 || self.rate_limit_period > MAX_WINDOW.as_secs() {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_PERIOD",
                message: format!("must be between 1 and {} seconds", MAX_WINDOW.as_secs()),
            });
        }
        if self.jwks_http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "JWKS_HTTP_TIMEOUT_SECS",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Validated identity-provider settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if algorithm, issuer or audience is
    /// unset, `ConfigurationInvalid` for an unsupported algorithm.
    pub fn auth_config(&self) -> AuthResult<AuthConfig> {
        Ok(AuthConfig::new(
            self.algorithm.as_deref(),
            self.issuer.as_deref(),
            self.audience.as_deref(),
        )?
        .with_jwks_cache_ttl(Duration::from_secs(self.jwks_cache_ttl_secs))
        .with_http_timeout(Duration::from_secs(self.jwks_http_timeout_secs)))
    }

    /// Rate limiter settings
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::builder()
            .limit(self.rate_limit, Duration::from_secs(self.rate_limit_period))
            .build()
    }

    /// Logging settings
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }

    /// Address to bind the listener to
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the bind address is not an IP.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .bind_address
            .parse()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDRESS",
                message: format!("{e}"),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
