//! Source adapters, one per dashboard panel
//!
//! Each adapter fetches one external API through the [`FetchGateway`],
//! normalizes the raw payload, and substitutes deterministic synthetic
//! data when anything goes wrong. From the orchestrator's point of view
//! an adapter cannot fail: `fetch_snapshot` always returns a complete
//! snapshot, tagged live or fallback.

use crate::config::SourceEndpoints;
use crate::fetch::FetchGateway;
use crate::types::{Snapshot, SourceId};
use async_trait::async_trait;
use std::sync::Arc;

mod crypto;
mod fx;
mod weather;

pub use crypto::{percent_change, CryptoAdapter};
pub use fx::FxAdapter;
pub use weather::WeatherAdapter;

/// One dashboard data source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which source this adapter serves
    fn source(&self) -> SourceId;

    /// Produce this cycle's snapshot
    ///
    /// Total: every transport, HTTP, or decode failure is absorbed into
    /// a fallback-origin snapshot with a fully populated payload. The
    /// absorbed failure is logged and reflected in `Snapshot::origin`.
    async fn fetch_snapshot(&self) -> Snapshot;
}

/// Build the standard adapter set in display order
pub fn default_adapters(
    gateway: Arc<dyn FetchGateway>,
    endpoints: &SourceEndpoints,
) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(CryptoAdapter::new(gateway.clone(), endpoints)),
        Arc::new(WeatherAdapter::new(gateway.clone(), &endpoints.weather)),
        Arc::new(FxAdapter::new(gateway, &endpoints.fx)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FakeGateway;

    #[test]
    fn test_default_adapters_cover_all_sources() {
        let gateway = Arc::new(FakeGateway::new());
        let adapters = default_adapters(gateway, &SourceEndpoints::default());

        let sources: Vec<SourceId> = adapters.iter().map(|a| a.source()).collect();
        assert_eq!(sources, SourceId::ALL.to_vec());
    }
}
