use std::time::Duration;

use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_LAST_GOOD_CREDENTIAL, DEFAULT_MODEL, DEFAULT_PREFERRED_CREDENTIAL,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESERVED_CREDENTIAL, DEFAULT_TEMPERATURE,
};
use crate::core::failover::SkipPolicy;
use crate::ui::theme::ThemeColor;

/// An explicitly configured index is taken as-is and validated later; the
/// built-in default falls back to 0 when the pool is too small for it.
fn effective_index(explicit: Option<usize>, default: usize, pool_size: usize) -> usize {
    explicit.unwrap_or(if default < pool_size { default } else { 0 })
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> Result<f32, ConfigError> {
        let value = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                field: "temperature",
                message: format!("{value} is outside [0, 1]"),
            })
        }
    }

    /// Index tried first for a pool of `pool_size` credentials.
    pub fn preferred_credential(&self, pool_size: usize) -> usize {
        effective_index(self.preferred_credential, DEFAULT_PREFERRED_CREDENTIAL, pool_size)
    }

    pub fn last_good_credential(&self, pool_size: usize) -> usize {
        effective_index(self.last_good_credential, DEFAULT_LAST_GOOD_CREDENTIAL, pool_size)
    }

    pub fn reserved_credential(&self) -> Option<usize> {
        self.reserve_emergency_credential
            .unwrap_or(true)
            .then_some(DEFAULT_RESERVED_CREDENTIAL)
    }

    pub fn theme_color(&self) -> Result<ThemeColor, ConfigError> {
        match self.theme.as_deref() {
            None => Ok(ThemeColor::default()),
            Some(name) => ThemeColor::from_name(name).ok_or_else(|| ConfigError::Invalid {
                field: "theme",
                message: format!("unknown theme '{name}'"),
            }),
        }
    }

    pub fn failover_policy(&self) -> Result<SkipPolicy, ConfigError> {
        match self.failover_skip.as_deref() {
            None => Ok(SkipPolicy::default()),
            Some(name) => SkipPolicy::from_name(name).ok_or_else(|| ConfigError::Invalid {
                field: "failover_skip",
                message: format!("expected 'preferred' or 'last-good', got '{name}'"),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}
