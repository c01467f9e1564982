//! Observability notices for toast and feed display
//!
//! The orchestrator and the AI selector each own a broadcast channel of
//! [`Notice`] values. Renderers subscribe; the core never blocks on (or
//! cares about) delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SourceId;

/// Kind of a notice, as rendered by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    /// A hydrate cycle completed (possibly degraded)
    Synced,
    /// One source fell back to synthetic data
    SourceFailed,
    /// The AI backend failed to produce a reply
    AiError,
}

/// A transient, auto-dismissing notification for the dashboard feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Unique notice identifier (ntc-<uuid>)
    pub id: String,

    /// What happened
    pub kind: NoticeKind,

    /// Human-readable detail line
    pub detail: String,

    /// When the notice was raised
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    /// Create a notice with auto-generated id and timestamp
    pub fn new(kind: NoticeKind, detail: impl Into<String>) -> Self {
        Self {
            id: format!("ntc-{}", uuid::Uuid::new_v4()),
            kind,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }

    /// Notice for a completed hydrate cycle
    pub fn synced(failure_count: usize) -> Self {
        let detail = if failure_count == 0 {
            "Data synced".to_string()
        } else {
            format!("Data synced ({} source(s) degraded)", failure_count)
        };
        Self::new(NoticeKind::Synced, detail)
    }

    /// Notice for a source that fell back to synthetic data
    pub fn source_failed(source: SourceId, reason: &str) -> Self {
        Self::new(
            NoticeKind::SourceFailed,
            format!("{} source unavailable: {}", source, reason),
        )
    }

    /// Notice for an AI backend failure
    pub fn ai_error(reason: &str) -> Self {
        Self::new(NoticeKind::AiError, format!("Assistant error: {}", reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_id_scheme() {
        let notice = Notice::synced(0);
        assert!(notice.id.starts_with("ntc-"));
        assert_eq!(notice.kind, NoticeKind::Synced);
        assert_eq!(notice.detail, "Data synced");
    }

    #[test]
    fn test_notice_degraded_detail() {
        let notice = Notice::synced(2);
        assert!(notice.detail.contains("2 source(s) degraded"));
    }

    #[test]
    fn test_source_failed_detail() {
        let notice = Notice::source_failed(SourceId::Weather, "HTTP error: status 500");
        assert_eq!(notice.kind, NoticeKind::SourceFailed);
        assert!(notice.detail.contains("weather"));
        assert!(notice.detail.contains("500"));
    }

    #[test]
    fn test_kind_serialization_kebab_case() {
        assert_eq!(
            serde_json::to_string(&NoticeKind::SourceFailed).unwrap(),
            "\"source-failed\""
        );
        assert_eq!(
            serde_json::to_string(&NoticeKind::AiError).unwrap(),
            "\"ai-error\""
        );
        assert_eq!(
            serde_json::to_string(&NoticeKind::Synced).unwrap(),
            "\"synced\""
        );
    }
}
