//! # pulsedeck
//!
//! Resilient data-refresh orchestration and assistant backend selection
//! for dashboard frontends.
//!
//! ## Overview
//!
//! `pulsedeck` is the headless core of a live dashboard. It fetches
//! several unreliable external data sources (crypto prices, weather,
//! FX rates) concurrently, substitutes deterministic synthetic data
//! when a source fails, and drives the periodic refresh timers without
//! overlap or drift. A separate assistant layer probes a local
//! OpenAI-compatible inference server once, falls back to a built-in
//! demo responder, and manages the conversation transcript either way.
//! Renderers stay dumb: they receive complete snapshots and replies,
//! never errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use pulsedeck::{DashboardConfig, FakeGateway, RefreshOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! // Scripted gateway with no routes: every fetch fails, so every
//! // snapshot comes back tagged fallback and the dashboard still renders.
//! let gateway = Arc::new(FakeGateway::new());
//! let orchestrator = RefreshOrchestrator::from_config(gateway, &DashboardConfig::default());
//!
//! if let Some(report) = orchestrator.hydrate().await {
//!     println!("sources degraded: {}", report.failures.len());
//! }
//! # }
//! ```
//!
//! ## Data sources
//!
//! - **crypto**: BTC/ETH spot prices plus 24 h hourly history
//! - **weather**: current conditions and a five-day forecast
//! - **fx**: USD reference rates for EUR and GBP
//!
//! ## Architecture
//!
//! - **FetchGateway** trait: the single seam to the network; `HttpGateway`
//!   for production, `FakeGateway` for tests
//! - **SourceAdapter** trait: one per source; absorbs every failure into
//!   fallback data, so adapters cannot fail
//! - **RefreshOrchestrator**: concurrent hydrate fan-out, snapshot cache,
//!   and the master/per-source refresh timers
//! - **BackendSelector** / **ConversationSession**: probe-once assistant
//!   backend selection and the append-only chat transcript

pub mod ai;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod fetch;
pub mod orchestrator;
pub mod sources;
pub mod types;

// Re-export core types
pub use ai::{
    BackendSelection, BackendSelector, ChatBackend, ChatMessage, ConversationSession, EchoBackend,
    RemoteBackend, Role, GREETING_DEMO, GREETING_LIVE, REPLY_ERROR,
};
pub use config::{
    AssistantConfig, DashboardConfig, PreferenceStore, Preferences, RefreshConfig,
    SourceEndpoints, Theme, MIN_MASTER_INTERVAL_MS,
};
pub use error::{AiError, AiResult, ConfigError, FetchError, FetchResult};
pub use events::{Notice, NoticeKind};
pub use fetch::{FakeGateway, FetchGateway, HttpGateway};
pub use orchestrator::RefreshOrchestrator;
pub use sources::{default_adapters, CryptoAdapter, FxAdapter, SourceAdapter, WeatherAdapter};
pub use types::{
    AssetQuote, CryptoStats, ForecastDay, FxRates, HydrateReport, Origin, SeriesPoint, Snapshot,
    SourceId, SourcePayload, WeatherReport,
};
