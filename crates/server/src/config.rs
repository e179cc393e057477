use shared_types::{AppConfig, FeatureFlags, RateLimitConfig};
use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Read `config.toml` and store it in the global `OnceLock`. Safe to call
/// multiple times; only the first call has effect.
///
/// A missing or unparseable file falls back to the defaults.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => parse_config(&contents),
        Err(e) => {
            tracing::warn!(path = CONFIG_PATH, error = %e, "config file not found, using defaults");
            AppConfig::default()
        }
    })
}

fn parse_config(contents: &str) -> AppConfig {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => {
            tracing::info!(features = ?config.features, "feature flags loaded");
            config
        }
        Err(e) => {
            tracing::warn!(path = CONFIG_PATH, error = %e, "failed to parse config, using defaults");
            AppConfig::default()
        }
    }
}

/// Loaded feature flags, or the defaults if `load_config()` has not run.
pub fn feature_flags() -> &'static FeatureFlags {
    &config().features
}

pub fn rate_limit_config() -> &'static RateLimitConfig {
    &config().rate_limit
}

fn config() -> &'static AppConfig {
    static DEFAULT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(AppConfig::default))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

pub fn port() -> u16 {
    env_parse("PORT").unwrap_or(DEFAULT_PORT)
}

/// Directory that receives uploaded files.
pub fn upload_dir() -> PathBuf {
    std::env::var("UPLOAD_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
}

pub fn max_upload_bytes() -> usize {
    env_parse("MAX_UPLOAD_BYTES").unwrap_or(shared_types::MAX_UPLOAD_BYTES)
}

pub fn log_json() -> bool {
    env_parse("LOG_JSON").unwrap_or(false)
}
