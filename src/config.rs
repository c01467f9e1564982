//! Dashboard configuration and persisted preferences
//!
//! Endpoint URLs, refresh cadences, and assistant settings all carry
//! working defaults so `DashboardConfig::default()` is a fully usable
//! configuration. User preferences (theme, master refresh interval) are
//! persisted separately as a small JSON file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::SourceId;

/// Lower bound for the user-configurable master refresh interval
pub const MIN_MASTER_INTERVAL_MS: u64 = 1_000;

/// External API endpoints, one per source concern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    /// Multi-symbol spot price quote (BTC + ETH vs USD)
    pub crypto_prices: String,

    /// 24-point hourly BTC/USD history
    pub crypto_history_btc: String,

    /// 24-point hourly ETH/USD history
    pub crypto_history_eth: String,

    /// Current weather plus 5-day forecast
    pub weather: String,

    /// Latest USD exchange rates
    pub fx: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            crypto_prices:
                "https://min-api.cryptocompare.com/data/pricemulti?fsyms=BTC,ETH&tsyms=USD"
                    .to_string(),
            crypto_history_btc:
                "https://min-api.cryptocompare.com/data/v2/histohour?fsym=BTC&tsym=USD&limit=24"
                    .to_string(),
            crypto_history_eth:
                "https://min-api.cryptocompare.com/data/v2/histohour?fsym=ETH&tsym=USD&limit=24"
                    .to_string(),
            weather: "https://api.open-meteo.com/v1/forecast?latitude=54.28&longitude=-0.40&current_weather=true&hourly=relativehumidity_2m&daily=temperature_2m_max,temperature_2m_min&forecast_days=5&timezone=auto"
                .to_string(),
            fx: "https://api.frankfurter.app/latest?from=USD&to=EUR,GBP".to_string(),
        }
    }
}

/// Refresh cadences for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Master hydrate interval in milliseconds, user-configurable
    ///
    /// Clamped to [`MIN_MASTER_INTERVAL_MS`] wherever it is applied.
    pub master_interval_ms: u64,

    /// Fixed per-source poll cadence in milliseconds
    ///
    /// Sources absent from the map are refreshed only by the master
    /// cycle. Default: a 60s crypto price/table poll.
    pub source_poll_ms: BTreeMap<SourceId, u64>,
}

impl RefreshConfig {
    /// Master interval as a `Duration`, clamped to the minimum
    pub fn master_interval(&self) -> Duration {
        Duration::from_millis(clamp_master_interval(self.master_interval_ms))
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        let mut source_poll_ms = BTreeMap::new();
        source_poll_ms.insert(SourceId::Crypto, 60_000);
        Self {
            master_interval_ms: 20_000,
            source_poll_ms,
        }
    }
}

/// Clamp a master interval to the allowed minimum
pub fn clamp_master_interval(ms: u64) -> u64 {
    ms.max(MIN_MASTER_INTERVAL_MS)
}

/// Local inference assistant settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of the OpenAI-compatible inference server
    pub endpoint: String,

    /// Model name sent with each chat completion request
    pub model: String,

    /// Upper bound on the liveness probe, milliseconds
    pub probe_timeout_ms: u64,

    /// Upper bound on one chat completion request, milliseconds
    pub request_timeout_ms: u64,
}

impl AssistantConfig {
    /// Models-listing URL used for the liveness probe
    pub fn models_url(&self) -> String {
        format!("{}/v1/models", self.endpoint.trim_end_matches('/'))
    }

    /// Chat completions URL
    pub fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Probe timeout as a `Duration`
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234".to_string(),
            model: "local-model".to_string(),
            probe_timeout_ms: 3_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Complete dashboard core configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// External API endpoints
    pub sources: SourceEndpoints,

    /// Refresh cadences
    pub refresh: RefreshConfig,

    /// Assistant settings
    pub assistant: AssistantConfig,
}

/// Dashboard color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark theme (default)
    #[default]
    Dark,
    /// Light theme
    Light,
}

/// User preferences, read at startup and written on settings-save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Selected color theme
    pub theme: Theme,

    /// Master refresh interval in milliseconds
    pub master_interval_ms: u64,
}

impl Preferences {
    /// Copy with the master interval clamped to the allowed minimum
    pub fn normalized(mut self) -> Self {
        self.master_interval_ms = clamp_master_interval(self.master_interval_ms);
        self
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            master_interval_ms: 20_000,
        }
    }
}

/// JSON file-backed preference store
///
/// Persists [`Preferences`] as a pretty-printed JSON file.
/// Atomic writes via temp file + rename to prevent corruption.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, clamped; a missing file yields defaults
    pub fn load(&self) -> Result<Preferences, ConfigError> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }

        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::Io(format!(
                "Failed to read preference file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let prefs: Preferences = serde_json::from_str(&json)?;

        tracing::debug!(path = %self.path.display(), "Preferences loaded");
        Ok(prefs.normalized())
    }

    /// Save preferences, clamped before writing
    pub fn save(&self, prefs: &Preferences) -> Result<(), ConfigError> {
        let prefs = prefs.clone().normalized();
        let json = serde_json::to_string_pretty(&prefs)?;

        // Atomic write: write to temp file, then rename
        let tmp_path = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!(
                    "Failed to create preference directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        std::fs::write(&tmp_path, json).map_err(|e| {
            ConfigError::Io(format!(
                "Failed to write preference file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            ConfigError::Io(format!(
                "Failed to move preference file into place at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }
}
