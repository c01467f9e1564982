//! Foreign-exchange source adapter (Frankfurter)

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{FetchError, FetchResult};
use crate::fallback;
use crate::fetch::FetchGateway;
use crate::sources::SourceAdapter;
use crate::types::{FxRates, Snapshot, SourceId, SourcePayload};

/// Quote currencies the dashboard tracks against USD
const TRACKED_QUOTES: [&str; 2] = ["EUR", "GBP"];

/// Adapter for the FX panel
pub struct FxAdapter {
    gateway: Arc<dyn FetchGateway>,
    url: String,
}

impl FxAdapter {
    /// Create an adapter over the configured rates endpoint
    pub fn new(gateway: Arc<dyn FetchGateway>, url: impl Into<String>) -> Self {
        Self {
            gateway,
            url: url.into(),
        }
    }

    async fn try_fetch(&self) -> FetchResult<FxRates> {
        let raw = self.gateway.get_json(&self.url).await?;
        let wire: FxWire =
            serde_json::from_value(raw).map_err(|e| FetchError::Decode(e.to_string()))?;

        let mut rates = BTreeMap::new();
        for code in TRACKED_QUOTES {
            let rate = wire
                .rates
                .get(code)
                .copied()
                .ok_or_else(|| FetchError::Decode(format!("Missing {} rate", code)))?;
            rates.insert(code.to_string(), rate);
        }

        Ok(FxRates {
            base: wire.base,
            rates,
        })
    }
}

#[async_trait]
impl SourceAdapter for FxAdapter {
    fn source(&self) -> SourceId {
        SourceId::Fx
    }

    async fn fetch_snapshot(&self) -> Snapshot {
        match self.try_fetch().await {
            Ok(rates) => Snapshot::live(SourceId::Fx, SourcePayload::Fx(rates)),
            Err(e) => {
                tracing::warn!(source = %SourceId::Fx, error = %e, "Live fetch failed, substituting fallback data");
                Snapshot::fallback(SourceId::Fx, SourcePayload::Fx(fallback::fx_rates()))
            }
        }
    }
}

#[derive(Deserialize)]
struct FxWire {
    base: String,
    rates: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FakeGateway;
    use serde_json::json;

    fn adapter_with(gateway: FakeGateway) -> FxAdapter {
        FxAdapter::new(Arc::new(gateway), "https://api.frankfurter.app/latest")
    }

    #[tokio::test]
    async fn test_live_snapshot() {
        let gateway = FakeGateway::new().route(
            "frankfurter",
            Ok(json!({
                "amount": 1.0,
                "base": "USD",
                "date": "2024-03-11",
                "rates": {"EUR": 0.915, "GBP": 0.785}
            })),
        );

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(!snapshot.is_fallback());

        let rates = snapshot.payload.as_fx().unwrap();
        assert_eq!(rates.base, "USD");
        assert_eq!(rates.rate("EUR"), Some(0.915));
        assert_eq!(rates.rate("GBP"), Some(0.785));
    }

    #[tokio::test]
    async fn test_untracked_rates_are_dropped() {
        let gateway = FakeGateway::new().route(
            "frankfurter",
            Ok(json!({
                "base": "USD",
                "rates": {"EUR": 0.915, "GBP": 0.785, "JPY": 147.2}
            })),
        );

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        let rates = snapshot.payload.as_fx().unwrap();
        assert_eq!(rates.rates.len(), 2);
        assert_eq!(rates.rate("JPY"), None);
    }

    #[tokio::test]
    async fn test_missing_tracked_rate_falls_back() {
        let gateway = FakeGateway::new().route(
            "frankfurter",
            Ok(json!({"base": "USD", "rates": {"EUR": 0.915}})),
        );

        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());

        let rates = snapshot.payload.as_fx().unwrap();
        assert_eq!(rates.rate("EUR"), Some(0.92));
        assert_eq!(rates.rate("GBP"), Some(0.79));
    }

    #[tokio::test]
    async fn test_http_error_falls_back() {
        let gateway =
            FakeGateway::new().route("frankfurter", Err(FetchError::Http { status: 503 }));
        let snapshot = adapter_with(gateway).fetch_snapshot().await;
        assert!(snapshot.is_fallback());
    }
}
