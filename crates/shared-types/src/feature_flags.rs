use serde::{Deserialize, Serialize};

/// Feature flags controlling which optional subsystems are active.
///
/// Loaded from `config.toml` at server startup. A missing file or a
/// missing key falls back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlags {
    #[serde(default)]
    pub telemetry: bool,
    #[serde(default = "enabled")]
    pub rate_limit: bool,
    #[serde(default = "enabled")]
    pub search_index: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            telemetry: false,
            rate_limit: true,
            search_index: true,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Sliding-window limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> u32 {
    300
}

fn default_window_secs() -> u64 {
    60
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}
