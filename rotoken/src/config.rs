use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::ConfigError;

const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_MAX_TOKEN_SIZE: usize = 8 * 1024;
/// Largest TTL or leeway, in seconds, that still fits a JWT `NumericDate`
const MAX_SECS: u64 = i64::MAX.cast_unsigned();

/// Token lifetimes and verification limits shared by the [`Signer`], the [`Verifier`]
/// and the [`Blocklist`].
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust
/// # use rotoken::config::TokenConfig;
/// let config = TokenConfig::from_json(r#"{ "access_ttl_secs": 300 }"#).unwrap();
/// assert_eq!(config.access_ttl_secs, 300);
/// assert_eq!(config.refresh_ttl_secs, 604_800);
/// ```
///
/// [`Signer`]: crate::encoding::Signer
/// [`Verifier`]: crate::validation::Verifier
/// [`Blocklist`]: crate::blocklist::Blocklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Access token lifetime, and how long a revoked access token stays blocked.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime, and how long a redeemed refresh token stays blocked.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,

    /// Clock skew tolerated on `exp` and `nbf`.
    #[serde(default)]
    pub leeway_secs: u64,

    /// Tokens longer than this many bytes are rejected before any decoding.
    /// `None` disables the check.
    #[serde(default = "default_max_token_size")]
    pub max_token_size: Option<usize>,

    /// Prefix for blocklist store keys.
    #[serde(default)]
    pub blocklist_prefix: String,
}

const fn default_access_ttl() -> u64 {
    DEFAULT_ACCESS_TTL_SECS
}

const fn default_refresh_ttl() -> u64 {
    DEFAULT_REFRESH_TTL_SECS
}

#[allow(clippy::unnecessary_wraps)]
const fn default_max_token_size() -> Option<usize> {
    Some(DEFAULT_MAX_TOKEN_SIZE)
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            leeway_secs: 0,
            max_token_size: default_max_token_size(),
            blocklist_prefix: String::new(),
        }
    }
}

impl TokenConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] when `json` is malformed or has unknown fields
    /// - [`ConfigError::Invalid`] when [`TokenConfig::validate`] fails
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration is usable.
    ///
    /// A refresh TTL no longer than the access TTL is accepted but logged, since
    /// refreshing then cannot extend a session.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when a TTL or the size limit is zero, or a TTL or the
    /// leeway exceeds `i64::MAX` seconds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, secs) in [
            ("access_ttl_secs", self.access_ttl_secs),
            ("refresh_ttl_secs", self.refresh_ttl_secs),
            ("leeway_secs", self.leeway_secs),
        ] {
            if secs > MAX_SECS {
                return Err(ConfigError::Invalid {
                    field,
                    message: "cannot exceed i64::MAX seconds",
                });
            }
        }
        if self.access_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "access_ttl_secs",
                message: "cannot be zero",
            });
        }
        if self.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "refresh_ttl_secs",
                message: "cannot be zero",
            });
        }
        if self.max_token_size == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_token_size",
                message: "cannot be zero; use null to disable",
            });
        }
        if self.refresh_ttl_secs <= self.access_ttl_secs {
            tracing::warn!(
                access_ttl_secs = self.access_ttl_secs,
                refresh_ttl_secs = self.refresh_ttl_secs,
                "refresh ttl is not longer than access ttl"
            );
        }
        Ok(())
    }

    /// Access token lifetime
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    /// Refresh token lifetime
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// Tolerated clock skew
    #[must_use]
    pub const fn leeway(&self) -> Duration {
        Duration::from_secs(self.leeway_secs)
    }

    /// Sets the access token lifetime, truncated to whole seconds.
    #[must_use]
    pub const fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the refresh token lifetime, truncated to whole seconds.
    #[must_use]
    pub const fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the tolerated clock skew, truncated to whole seconds.
    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs();
        self
    }

    /// Sets the token size limit; `None` disables it.
    #[must_use]
    pub const fn with_max_token_size(mut self, max: Option<usize>) -> Self {
        self.max_token_size = max;
        self
    }

    /// Sets the blocklist key prefix.
    #[must_use]
    pub fn with_blocklist_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blocklist_prefix = prefix.into();
        self
    }
}
