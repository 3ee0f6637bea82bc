//! Environment-driven configuration
//!
//! Settings mirror the `DATEGUARD_*` environment variables used by the
//! deployment; everything has a usable default for local work.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coordinator tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinatorConfig {
    /// Safety cutoff for a runaway session, in seconds. None disables it.
    pub max_capture_secs: Option<u64>,

    /// Timeout for one control round-trip from the requester.
    pub control_timeout_ms: u64,

    /// Capacity of the capture event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_capture_secs: Some(600),
            control_timeout_ms: 10_000,
            event_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Read overrides from the environment.
    ///
    /// `DATEGUARD_MAX_CAPTURE_SECS=0` disables the safety cutoff.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<u64>("DATEGUARD_MAX_CAPTURE_SECS") {
            config.max_capture_secs = (secs > 0).then_some(secs);
        }
        if let Some(ms) = env_parse::<u64>("DATEGUARD_CONTROL_TIMEOUT_MS") {
            config.control_timeout_ms = ms;
        }
        config
    }

    pub fn max_capture(&self) -> Option<Duration> {
        self.max_capture_secs.map(Duration::from_secs)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }
}

/// Connection settings for the analysis backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SinkConfig {
    /// Analysis endpoint receiving completed artifacts.
    pub endpoint: String,

    /// Bearer token for the analysis backend, if it requires one.
    pub api_key: Option<String>,

    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/analyze".to_string(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

impl SinkConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("DATEGUARD_ANALYSIS_URL") {
            if !endpoint.is_empty() {
                config.endpoint = endpoint;
            }
        }
        if let Ok(key) = std::env::var("DATEGUARD_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Some(secs) = env_parse::<u64>("DATEGUARD_SINK_TIMEOUT_SECS") {
            config.request_timeout_secs = secs;
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
