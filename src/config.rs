use crate::summary::{SummaryLength, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "doc-summary";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_COPY_FEEDBACK_MS: u64 = 2000;

pub const ENV_API_URL: &str = "DOC_SUMMARY_API_URL";
pub const ENV_SUMMARY_LENGTH: &str = "DOC_SUMMARY_LENGTH";
pub const ENV_TIMEOUT_SECS: &str = "DOC_SUMMARY_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub default_summary_length: String,
    pub request_timeout_secs: Option<u64>,
    pub copy_feedback_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_summary_length: SummaryLength::default().as_str().to_string(),
            request_timeout_secs: None,
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
        }
    }
}

impl AppConfig {
    pub fn summary_length(&self) -> SummaryLength {
        self.default_summary_length.parse().unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

pub fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn normalize_summary_length(input: &str) -> String {
    input
        .parse::<SummaryLength>()
        .unwrap_or_default()
        .as_str()
        .to_string()
}

pub fn normalize_timeout(secs: Option<u64>) -> Option<u64> {
    secs.filter(|s| *s > 0)
}

/// Config file in the platform config dir, overlaid with environment overrides.
pub fn load() -> Result<AppConfig, String> {
    let path = config_path()?;
    let mut config = load_or_create(&path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn load_or_create(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        let config = AppConfig::default();
        save_raw(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config at {} is invalid ({}), resetting", path.display(), e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = AppConfig::default();
            save_raw(path, &config)?;
            Ok(config)
        }
    }
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var(ENV_API_URL) {
        if !url.trim().is_empty() {
            config.api_base_url = normalize_base_url(&url);
        }
    }

    if let Ok(length) = std::env::var(ENV_SUMMARY_LENGTH) {
        match length.parse::<SummaryLength>() {
            Ok(length) => config.default_summary_length = length.as_str().to_string(),
            Err(e) => tracing::warn!("Ignoring {}: {}", ENV_SUMMARY_LENGTH, e),
        }
    }

    if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(secs) => config.request_timeout_secs = normalize_timeout(Some(secs)),
            Err(_) => tracing::warn!("Ignoring {}: not a number of seconds", ENV_TIMEOUT_SECS),
        }
    }
}

fn config_path() -> Result<PathBuf, String> {
    let dir = dirs::config_dir()
        .ok_or_else(|| "Failed to resolve config dir".to_string())?
        .join(CONFIG_DIR);
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create config dir: {}", e))?;
    Ok(dir.join(CONFIG_FILE))
}

fn save_raw(path: &Path, config: &AppConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to save config: {}", e))
}

fn normalize_config(config: &mut AppConfig) {
    config.api_base_url = normalize_base_url(&config.api_base_url);
    config.default_summary_length = normalize_summary_length(&config.default_summary_length);
    config.request_timeout_secs = normalize_timeout(config.request_timeout_secs);
    if config.copy_feedback_ms == 0 {
        config.copy_feedback_ms = DEFAULT_COPY_FEEDBACK_MS;
    }
}
