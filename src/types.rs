//! Core data types for the pulsedeck dashboard
//!
//! All types use camelCase JSON serialization for wire compatibility
//! with the dashboard renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Identifier for one external data source
///
/// The set is closed: the dashboard knows exactly these three panels
/// and the orchestrator never discovers sources at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    /// Cryptocurrency prices and 24h history (CryptoCompare)
    Crypto,
    /// Current conditions and 5-day forecast (Open-Meteo)
    Weather,
    /// USD foreign-exchange rates (Frankfurter)
    Fx,
}

impl SourceId {
    /// Every source, in display order
    pub const ALL: [SourceId; 3] = [SourceId::Crypto, SourceId::Weather, SourceId::Fx];

    /// Stable lowercase name used in logs and notices
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Crypto => "crypto",
            SourceId::Weather => "weather",
            SourceId::Fx => "fx",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a snapshot came from the live API or the synthetic generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Fetched from the external API on this cycle
    Live,
    /// Substituted by the deterministic fallback generator
    Fallback,
}

/// One point of an hourly price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Sample time
    pub at: DateTime<Utc>,

    /// Price in USD
    pub price: f64,
}

/// Normalized quote for a single tracked asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuote {
    /// Stable asset identifier (e.g., "btc")
    pub id: String,

    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Spot price in USD
    pub price_usd: f64,

    /// Percent change over the fetched series, first point to last
    ///
    /// Defined as exactly 0.0 when the series has fewer than two points.
    pub change_pct_24h: f64,

    /// Market capitalization in USD
    pub market_cap_usd: f64,

    /// 24-point hourly price history, oldest first
    pub series: Vec<SeriesPoint>,
}

/// Crypto panel payload: all tracked assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoStats {
    /// Tracked assets in display order
    pub assets: Vec<AssetQuote>,
}

impl CryptoStats {
    /// Look up an asset by its stable id
    pub fn asset(&self, id: &str) -> Option<&AssetQuote> {
        self.assets.iter().find(|a| a.id == id)
    }
}

/// One day of the forecast strip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Short weekday label (e.g., "Mon"); synthetic labels in fallback data
    pub label: String,

    /// Daily maximum temperature, °C
    pub high_c: f64,

    /// Daily minimum temperature, °C
    pub low_c: f64,
}

/// Weather panel payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Current temperature, °C
    pub temperature_c: f64,

    /// Current wind speed, km/h
    pub wind_speed_kmh: f64,

    /// Current relative humidity, percent
    pub humidity_pct: f64,

    /// WMO weather interpretation code (0 = clear sky)
    pub condition_code: u32,

    /// Five-day high/low forecast
    pub forecast: Vec<ForecastDay>,
}

/// Foreign-exchange panel payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxRates {
    /// Base currency code (always "USD" for the dashboard)
    pub base: String,

    /// Quote-currency code to rate, sorted by code
    pub rates: BTreeMap<String, f64>,
}

impl FxRates {
    /// Rate for a quote currency, if tracked
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

/// Payload of a snapshot, tagged by source
///
/// The source set is closed, so a tagged payload replaces generics at
/// the report boundary and keeps `HydrateReport` a plain value type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SourcePayload {
    /// Crypto panel data
    Crypto(CryptoStats),
    /// Weather panel data
    Weather(WeatherReport),
    /// FX panel data
    Fx(FxRates),
}

impl SourcePayload {
    /// Crypto payload, if this is one
    pub fn as_crypto(&self) -> Option<&CryptoStats> {
        match self {
            SourcePayload::Crypto(stats) => Some(stats),
            _ => None,
        }
    }

    /// Weather payload, if this is one
    pub fn as_weather(&self) -> Option<&WeatherReport> {
        match self {
            SourcePayload::Weather(report) => Some(report),
            _ => None,
        }
    }

    /// FX payload, if this is one
    pub fn as_fx(&self) -> Option<&FxRates> {
        match self {
            SourcePayload::Fx(rates) => Some(rates),
            _ => None,
        }
    }
}

/// One normalized, timestamped reading from a data source
///
/// Immutable once produced: the next cycle supersedes it with a fresh
/// snapshot rather than mutating this one. The payload is always fully
/// populated, fallback included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Which source produced this reading
    pub source: SourceId,

    /// When the reading was produced
    pub fetched_at: DateTime<Utc>,

    /// Live fetch or synthetic substitute
    pub origin: Origin,

    /// Panel data, tagged by source
    pub payload: SourcePayload,
}

impl Snapshot {
    /// Create a live snapshot stamped with the current time
    pub fn live(source: SourceId, payload: SourcePayload) -> Self {
        Self {
            source,
            fetched_at: Utc::now(),
            origin: Origin::Live,
            payload,
        }
    }

    /// Create a fallback snapshot stamped with the current time
    pub fn fallback(source: SourceId, payload: SourcePayload) -> Self {
        Self {
            source,
            fetched_at: Utc::now(),
            origin: Origin::Fallback,
            payload,
        }
    }

    /// True when the payload came from the synthetic generator
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Outcome of one hydrate cycle across all sources
///
/// Built fresh each cycle and handed to renderers as a value; never
/// mutated after assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrateReport {
    /// When the cycle's fan-out began
    pub cycle_start: DateTime<Utc>,

    /// Snapshot per source
    pub results: HashMap<SourceId, Snapshot>,

    /// Sources that fell back on this cycle
    pub failures: BTreeSet<SourceId>,
}

impl HydrateReport {
    /// Assemble a report from one cycle's snapshots
    ///
    /// Every fallback-origin snapshot is recorded in `failures`.
    pub fn from_snapshots(cycle_start: DateTime<Utc>, snapshots: Vec<Snapshot>) -> Self {
        let mut results = HashMap::new();
        let mut failures = BTreeSet::new();
        for snapshot in snapshots {
            if snapshot.is_fallback() {
                failures.insert(snapshot.source);
            }
            results.insert(snapshot.source, snapshot);
        }
        Self {
            cycle_start,
            results,
            failures,
        }
    }

    /// Snapshot for one source, if present
    pub fn get(&self, source: SourceId) -> Option<&Snapshot> {
        self.results.get(&source)
    }

    /// True when at least one source fell back
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}
