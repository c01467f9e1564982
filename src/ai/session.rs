//! Conversation session state
//!
//! Pure state container for the assistant surface: the ordered transcript,
//! the busy flag behind the typing indicator, and the selected backend
//! slot. No network or timer logic lives here; beyond reads, the session
//! is mutated only through [`BackendSelector`] operations.
//!
//! [`BackendSelector`]: crate::ai::BackendSelector

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ai::backend::ChatBackend;

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry
///
/// Wire-compatible with OpenAI-style chat completion requests, so the
/// transcript can be posted to the inference endpoint as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation state shared between the selector and a chat renderer
///
/// The transcript is append-only; clearing it is the only removal
/// operation and keeps the backend selection. Once a backend is bound
/// it stays bound for the life of the session.
pub struct ConversationSession {
    /// Ordered request/reply transcript
    transcript: RwLock<Vec<ChatMessage>>,
    /// True while a reply is being produced
    busy: AtomicBool,
    /// Selected backend, `None` until the first probe completes
    backend: RwLock<Option<Arc<dyn ChatBackend>>>,
}

impl ConversationSession {
    /// Create an empty session with no backend selected
    pub fn new() -> Self {
        Self {
            transcript: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
            backend: RwLock::new(None),
        }
    }

    /// Snapshot of the transcript, oldest first
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    /// Number of transcript messages
    pub async fn len(&self) -> usize {
        self.transcript.read().await.len()
    }

    /// True when the transcript holds no messages
    pub async fn is_empty(&self) -> bool {
        self.transcript.read().await.is_empty()
    }

    /// Most recent transcript message, if any
    pub async fn last(&self) -> Option<ChatMessage> {
        self.transcript.read().await.last().cloned()
    }

    /// True while a reply is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The selected backend, if the probe has run
    pub async fn backend(&self) -> Option<Arc<dyn ChatBackend>> {
        self.backend.read().await.clone()
    }

    /// True once a backend has been selected
    pub async fn is_backend_selected(&self) -> bool {
        self.backend.read().await.is_some()
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    pub(crate) async fn set_backend(&self, backend: Arc<dyn ChatBackend>) {
        *self.backend.write().await = Some(backend);
    }

    pub(crate) async fn push(&self, message: ChatMessage) {
        self.transcript.write().await.push(message);
    }

    pub(crate) async fn clear_transcript(&self) {
        self.transcript.write().await.clear();
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend::EchoBackend;

    #[tokio::test]
    async fn test_new_session_is_empty_and_idle() {
        let session = ConversationSession::new();

        assert!(session.is_empty().await);
        assert_eq!(session.len().await, 0);
        assert!(!session.is_busy());
        assert!(!session.is_backend_selected().await);
        assert!(session.last().await.is_none());
    }

    #[tokio::test]
    async fn test_push_preserves_order() {
        let session = ConversationSession::new();

        session.push(ChatMessage::user("first")).await;
        session.push(ChatMessage::assistant("second")).await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "first");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "second");

        let last = session.last().await.unwrap();
        assert_eq!(last.content, "second");
    }

    #[tokio::test]
    async fn test_clear_keeps_backend_selection() {
        let session = ConversationSession::new();
        session.set_backend(Arc::new(EchoBackend::new())).await;
        session.push(ChatMessage::user("hello")).await;

        session.clear_transcript().await;

        assert!(session.is_empty().await);
        assert!(session.is_backend_selected().await);
    }

    #[tokio::test]
    async fn test_busy_flag_toggles() {
        let session = ConversationSession::new();

        session.set_busy(true);
        assert!(session.is_busy());

        session.set_busy(false);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_message_serializes_with_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");

        let json = serde_json::to_value(ChatMessage::assistant("hey")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_message_deserializes_from_wire_form() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "ok");
    }
}
