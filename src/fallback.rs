//! Deterministic synthetic fallback data
//!
//! When a live fetch fails, the adapters substitute payloads built here.
//! Every generator is pure and total: same inputs, same output, no I/O,
//! nothing to fail. The dashboard therefore always has a complete,
//! schema-valid payload to render, even with the network gone.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::types::{AssetQuote, CryptoStats, ForecastDay, FxRates, SeriesPoint, WeatherReport};

/// Length of a price history series, live or synthetic
pub const SERIES_LEN: usize = 24;

/// Static reference data for one tracked asset
///
/// Market caps are reference values in live snapshots too: the spot
/// price API carries no capitalization field.
pub struct AssetSpec {
    /// Stable asset identifier
    pub id: &'static str,
    /// Ticker symbol
    pub symbol: &'static str,
    /// Display name
    pub name: &'static str,
    /// Base price used by the synthetic generator, USD
    pub base_price: f64,
    /// Synthetic 24h change, percent
    pub base_change_pct: f64,
    /// Reference market capitalization, USD
    pub market_cap_usd: f64,
}

/// The assets the dashboard tracks, in display order
pub const TRACKED_ASSETS: [AssetSpec; 2] = [
    AssetSpec {
        id: "btc",
        symbol: "BTC",
        name: "Bitcoin",
        base_price: 68_000.0,
        base_change_pct: 1.2,
        market_cap_usd: 1_340_000_000_000.0,
    },
    AssetSpec {
        id: "eth",
        symbol: "ETH",
        name: "Ethereum",
        base_price: 3_600.0,
        base_change_pct: 0.8,
        market_cap_usd: 440_000_000_000.0,
    },
];

/// Synthetic hourly price series, oldest point first
///
/// Values follow `base` with a sine sweep plus seeded jitter, floored
/// at 1.0. The RNG seed derives from the inputs, so equal inputs always
/// produce the identical series.
pub fn price_series(base: f64, len: usize, end: DateTime<Utc>) -> Vec<SeriesPoint> {
    let seed = base.to_bits().wrapping_mul(31).wrapping_add(len as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    let amplitude = (base * 0.002).max(1.0);

    (0..len)
        .map(|pos| {
            let phase = (len - 1 - pos) as f64;
            let jitter = (phase / 3.0).sin() + rng.gen::<f64>() * 0.5;
            SeriesPoint {
                at: end - Duration::hours((len - 1 - pos) as i64),
                price: (base + jitter * amplitude).max(1.0),
            }
        })
        .collect()
}

/// Complete synthetic crypto payload for all tracked assets
pub fn crypto_stats(end: DateTime<Utc>) -> CryptoStats {
    CryptoStats {
        assets: TRACKED_ASSETS
            .iter()
            .map(|spec| AssetQuote {
                id: spec.id.to_string(),
                symbol: spec.symbol.to_string(),
                name: spec.name.to_string(),
                price_usd: spec.base_price,
                change_pct_24h: spec.base_change_pct,
                market_cap_usd: spec.market_cap_usd,
                series: price_series(spec.base_price, SERIES_LEN, end),
            })
            .collect(),
    }
}

/// Complete synthetic weather payload: a calm, clear day
pub fn weather_report() -> WeatherReport {
    let highs = [13.0, 14.0, 15.0, 14.0, 13.0];
    let lows = [8.0, 9.0, 9.0, 8.0, 7.0];
    WeatherReport {
        temperature_c: 12.0,
        wind_speed_kmh: 4.0,
        humidity_pct: 68.0,
        condition_code: 0,
        forecast: highs
            .iter()
            .zip(lows.iter())
            .enumerate()
            .map(|(i, (high, low))| ForecastDay {
                label: format!("D{}", i + 1),
                high_c: *high,
                low_c: *low,
            })
            .collect(),
    }
}

/// Complete synthetic FX payload
pub fn fx_rates() -> FxRates {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_string(), 0.92);
    rates.insert("GBP".to_string(), 0.79);
    FxRates {
        base: "USD".to_string(),
        rates,
    }
}
