//! Crypto source adapter (CryptoCompare)
//!
//! Combines one multi-symbol spot quote with a 24-point hourly history
//! per tracked asset. The spot API carries no market capitalization, so
//! caps come from the static asset table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SourceEndpoints;
use crate::error::{FetchError, FetchResult};
use crate::fallback::{self, TRACKED_ASSETS};
use crate::fetch::FetchGateway;
use crate::sources::SourceAdapter;
use crate::types::{AssetQuote, CryptoStats, SeriesPoint, Snapshot, SourceId, SourcePayload};

/// Percent change from the first to the last value of a series
///
/// Defined as exactly 0.0 when the series has fewer than two points
/// (or a zero first value, which would make the ratio meaningless).
pub fn percent_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 && *first != 0.0 => {
            (last - first) / first * 100.0
        }
        _ => 0.0,
    }
}

/// Adapter for the crypto panel
pub struct CryptoAdapter {
    gateway: Arc<dyn FetchGateway>,
    prices_url: String,
    /// One history URL per entry of [`TRACKED_ASSETS`], same order
    history_urls: Vec<String>,
}

impl CryptoAdapter {
    /// Create an adapter over the configured endpoints
    pub fn new(gateway: Arc<dyn FetchGateway>, endpoints: &SourceEndpoints) -> Self {
        Self {
            gateway,
            prices_url: endpoints.crypto_prices.clone(),
            history_urls: vec![
                endpoints.crypto_history_btc.clone(),
                endpoints.crypto_history_eth.clone(),
            ],
        }
    }

    async fn try_fetch(&self) -> FetchResult<CryptoStats> {
        let prices = self.gateway.get_json(&self.prices_url);
        let histories = futures::future::try_join_all(
            self.history_urls.iter().map(|url| self.gateway.get_json(url)),
        );
        let (prices, histories) = futures::try_join!(prices, histories)?;

        let prices: PriceWire =
            serde_json::from_value(prices).map_err(|e| FetchError::Decode(e.to_string()))?;

        let mut assets = Vec::with_capacity(TRACKED_ASSETS.len());
        for (spec, raw_history) in TRACKED_ASSETS.iter().zip(histories) {
            let price_usd = prices
                .get(spec.symbol)
                .and_then(|quotes| quotes.get("USD"))
                .copied()
                .ok_or_else(|| {
                    FetchError::Decode(format!("Missing USD quote for {}", spec.symbol))
                })?;

            let series = parse_history(raw_history)?;
            if series.is_empty() {
                // A 200 with no points renders as a blank chart; treat as failure
                return Err(FetchError::Decode(format!(
                    "Empty price history for {}",
                    spec.symbol
                )));
            }

            let closes: Vec<f64> = series.iter().map(|p| p.price).collect();
            assets.push(AssetQuote {
                id: spec.id.to_string(),
                symbol: spec.symbol.to_string(),
                name: spec.name.to_string(),
                price_usd,
                change_pct_24h: percent_change(&closes),
                market_cap_usd: spec.market_cap_usd,
                series,
            });
        }

        Ok(CryptoStats { assets })
    }
}

#[async_trait]
impl SourceAdapter for CryptoAdapter {
    fn source(&self) -> SourceId {
        SourceId::Crypto
    }

    async fn fetch_snapshot(&self) -> Snapshot {
        match self.try_fetch().await {
            Ok(stats) => Snapshot::live(SourceId::Crypto, SourcePayload::Crypto(stats)),
            Err(e) => {
                tracing::warn!(source = %SourceId::Crypto, error = %e, "Live fetch failed, substituting fallback data");
                Snapshot::fallback(
                    SourceId::Crypto,
                    SourcePayload::Crypto(fallback::crypto_stats(Utc::now())),
                )
            }
        }
    }
}

/// pricemulti response: symbol -> quote currency -> price
type PriceWire = HashMap<String, HashMap<String, f64>>;

#[derive(Deserialize)]
struct HistoryWire {
    #[serde(rename = "Data")]
    data: HistoryDataWire,
}

#[derive(Deserialize)]
struct HistoryDataWire {
    #[serde(rename = "Data")]
    points: Vec<HistoryPointWire>,
}

#[derive(Deserialize)]
struct HistoryPointWire {
    time: i64,
    close: f64,
}

fn parse_history(raw: Value) -> FetchResult<Vec<SeriesPoint>> {
    let wire: HistoryWire =
        serde_json::from_value(raw).map_err(|e| FetchError::Decode(e.to_string()))?;
    wire.data
        .points
        .into_iter()
        .map(|p| {
            let at = DateTime::from_timestamp(p.time, 0)
                .ok_or_else(|| FetchError::Decode(format!("Invalid history timestamp {}", p.time)))?;
            Ok(SeriesPoint { at, price: p.close })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::SERIES_LEN;
    use crate::fetch::FakeGateway;
    use serde_json::json;

    fn history_json(closes: &[f64]) -> Value {
        let points: Vec<Value> = closes
            .iter()
            .enumerate()
            .map(|(i, close)| json!({"time": 1_710_000_000 + i as i64 * 3_600, "close": close}))
            .collect();
        json!({"Data": {"Data": points}})
    }

    fn adapter_with(gateway: FakeGateway) -> CryptoAdapter {
        CryptoAdapter::new(Arc::new(gateway), &SourceEndpoints::default())
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(&[100.0, 100.0, 130.0]), 30.0);
        assert_eq!(percent_change(&[200.0, 100.0]), -50.0);
        assert_eq!(percent_change(&[100.0]), 0.0);
        assert_eq!(percent_change(&[]), 0.0);
        assert_eq!(percent_change(&[0.0, 10.0]), 0.0);
    }

    #[tokio::test]
    async fn test_live_snapshot() {
        let gateway = FakeGateway::new()
            .route(
                "pricemulti",
                Ok(json!({"BTC": {"USD": 68_210.0}, "ETH": {"USD": 3_605.0}})),
            )
            .route("fsym=BTC", Ok(history_json(&[100.0, 100.0, 130.0])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0, 3_620.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(!snapshot.is_fallback());

        let stats = snapshot.payload.as_crypto().unwrap();
        assert_eq!(stats.assets.len(), 2);

        let btc = stats.asset("btc").unwrap();
        assert_eq!(btc.price_usd, 68_210.0);
        assert_eq!(btc.change_pct_24h, 30.0);
        assert_eq!(btc.series.len(), 3);
        assert_eq!(btc.market_cap_usd, 1_340_000_000_000.0);

        let eth = stats.asset("eth").unwrap();
        assert_eq!(eth.price_usd, 3_605.0);
    }

    #[tokio::test]
    async fn test_single_point_series_change_is_zero() {
        let gateway = FakeGateway::new()
            .route(
                "pricemulti",
                Ok(json!({"BTC": {"USD": 68_000.0}, "ETH": {"USD": 3_600.0}})),
            )
            .route("fsym=BTC", Ok(history_json(&[100.0])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        let stats = snapshot.payload.as_crypto().unwrap();
        assert_eq!(stats.asset("btc").unwrap().change_pct_24h, 0.0);
    }

    #[tokio::test]
    async fn test_http_error_falls_back() {
        let gateway = FakeGateway::new()
            .route("pricemulti", Err(FetchError::Http { status: 500 }))
            .route("fsym=BTC", Ok(history_json(&[100.0, 130.0])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0, 3_620.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());

        // Fallback payload is complete
        let stats = snapshot.payload.as_crypto().unwrap();
        assert_eq!(stats.assets.len(), 2);
        assert!(stats.assets.iter().all(|a| a.series.len() == SERIES_LEN));
    }

    #[tokio::test]
    async fn test_empty_history_falls_back() {
        let gateway = FakeGateway::new()
            .route(
                "pricemulti",
                Ok(json!({"BTC": {"USD": 68_000.0}, "ETH": {"USD": 3_600.0}})),
            )
            .route("fsym=BTC", Ok(history_json(&[])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0, 3_620.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let gateway = FakeGateway::new()
            .route("pricemulti", Ok(json!("not an object")))
            .route("fsym=BTC", Ok(history_json(&[100.0, 130.0])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0, 3_620.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());
    }

    #[tokio::test]
    async fn test_missing_symbol_falls_back() {
        let gateway = FakeGateway::new()
            .route("pricemulti", Ok(json!({"BTC": {"USD": 68_000.0}})))
            .route("fsym=BTC", Ok(history_json(&[100.0, 130.0])))
            .route("fsym=ETH", Ok(history_json(&[3_600.0, 3_620.0])));

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());
    }
}
