//! Backend selection and the assistant command surface
//!
//! [`BackendSelector`] probes the local inference endpoint exactly once
//! per session, binds either [`RemoteBackend`] or [`EchoBackend`] to it,
//! and drives the respond/clear operations a chat renderer invokes. The
//! selection is final for the process lifetime: a remote backend that
//! goes away mid-conversation produces inline error messages, not a
//! silent switch to the demo engine.

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::ai::backend::{ChatBackend, EchoBackend, RemoteBackend};
use crate::ai::session::{ChatMessage, ConversationSession};
use crate::config::AssistantConfig;
use crate::events::Notice;
use crate::fetch::FetchGateway;

/// Announcement shown when the live backend is selected
pub const GREETING_LIVE: &str = "Assistant online (local model). Ask me anything!";

/// Announcement shown when the demo backend is selected
pub const GREETING_DEMO: &str = "Demo engine active. The full AI backend is not running.";

/// Inline transcript message shown when a reply fails
pub const REPLY_ERROR: &str = "Assistant error. Try again.";

/// Outcome of [`BackendSelector::ensure_backend`]
///
/// `greeting` is present only on the call that actually performed the
/// probe, so a renderer can show the mode announcement exactly once.
/// The greeting never enters the transcript.
pub struct BackendSelection {
    /// The backend now bound to the session
    pub backend: Arc<dyn ChatBackend>,

    /// Mode announcement, present only when this call probed
    pub greeting: Option<&'static str>,
}

/// Probes for a live inference server and runs the conversation
pub struct BackendSelector {
    gateway: Arc<dyn FetchGateway>,
    config: AssistantConfig,
    event_tx: broadcast::Sender<Notice>,
    /// Serializes the probe so racing ensure calls select at most once
    probe_lock: Mutex<()>,
}

impl BackendSelector {
    pub fn new(gateway: Arc<dyn FetchGateway>, config: AssistantConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            gateway,
            config,
            event_tx,
            probe_lock: Mutex::new(()),
        }
    }

    /// Subscribe to assistant notices (reply failures)
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.event_tx.subscribe()
    }

    /// Return the session's backend, probing the endpoint on first use
    ///
    /// Idempotent: once a backend is bound the probe never runs again,
    /// and concurrent callers waiting on the probe lock re-check the
    /// slot before probing themselves.
    pub async fn ensure_backend(&self, session: &ConversationSession) -> BackendSelection {
        if let Some(backend) = session.backend().await {
            return BackendSelection {
                backend,
                greeting: None,
            };
        }

        let _guard = self.probe_lock.lock().await;
        if let Some(backend) = session.backend().await {
            return BackendSelection {
                backend,
                greeting: None,
            };
        }

        let models_url = self.config.models_url();
        let probe = tokio::time::timeout(
            self.config.probe_timeout(),
            self.gateway.get_json(&models_url),
        )
        .await;

        let (backend, greeting): (Arc<dyn ChatBackend>, &'static str) = match probe {
            Ok(Ok(_)) => {
                tracing::info!(endpoint = %self.config.endpoint, "Live inference backend selected");
                (
                    Arc::new(RemoteBackend::new(self.gateway.clone(), &self.config)),
                    GREETING_LIVE,
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Inference probe failed, using demo backend");
                (Arc::new(EchoBackend::new()), GREETING_DEMO)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.probe_timeout_ms,
                    "Inference probe timed out, using demo backend"
                );
                (Arc::new(EchoBackend::new()), GREETING_DEMO)
            }
        };

        session.set_backend(backend.clone()).await;

        BackendSelection {
            backend,
            greeting: Some(greeting),
        }
    }

    /// Answer a prompt, appending both sides of the exchange to the transcript
    ///
    /// Returns the reply, or `None` when the prompt was blank or the
    /// backend failed. A failed reply appends [`REPLY_ERROR`] to the
    /// transcript and emits an `ai-error` notice; the backend selection
    /// is left unchanged. The busy flag is cleared on every path.
    pub async fn respond(&self, session: &ConversationSession, prompt: &str) -> Option<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        session.push(ChatMessage::user(prompt)).await;
        let backend = self.ensure_backend(session).await.backend;

        session.set_busy(true);
        let transcript = session.transcript().await;
        let outcome = backend.respond(&transcript, prompt).await;

        let reply = match outcome {
            Ok(reply) => {
                session.push(ChatMessage::assistant(reply.clone())).await;
                Some(reply)
            }
            Err(e) => {
                tracing::error!(backend = backend.name(), error = %e, "Assistant reply failed");
                let _ = self.event_tx.send(Notice::ai_error(&e.to_string()));
                session.push(ChatMessage::assistant(REPLY_ERROR)).await;
                None
            }
        };

        session.set_busy(false);
        reply
    }

    /// Empty the transcript, keeping the backend selection
    pub async fn clear(&self, session: &ConversationSession) {
        session.clear_transcript().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::session::Role;
    use crate::error::FetchError;
    use crate::events::NoticeKind;
    use crate::fetch::FakeGateway;
    use serde_json::json;

    fn models_ok() -> serde_json::Value {
        json!({"data": [{"id": "local-model"}]})
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    /// Selector backed by a scripted gateway, plus the gateway handle
    /// for call-count assertions.
    fn selector_with(gateway: FakeGateway) -> (BackendSelector, Arc<FakeGateway>) {
        let gateway = Arc::new(gateway);
        let selector = BackendSelector::new(gateway.clone(), AssistantConfig::default());
        (selector, gateway)
    }

    // ---- ensure_backend ----

    #[tokio::test]
    async fn test_probe_success_selects_remote() {
        let (selector, _) = selector_with(FakeGateway::new().route("/v1/models", Ok(models_ok())));
        let session = ConversationSession::new();

        let selection = selector.ensure_backend(&session).await;

        assert_eq!(selection.backend.name(), "remote");
        assert_eq!(selection.greeting, Some(GREETING_LIVE));
        assert!(session.is_backend_selected().await);
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn test_probe_failure_selects_echo() {
        let (selector, _) = selector_with(
            FakeGateway::new().route("/v1/models", Err(FetchError::Transport("refused".into()))),
        );
        let session = ConversationSession::new();

        let selection = selector.ensure_backend(&session).await;

        assert_eq!(selection.backend.name(), "echo");
        assert_eq!(selection.greeting, Some(GREETING_DEMO));
    }

    #[tokio::test]
    async fn test_probe_http_error_selects_echo() {
        let (selector, _) = selector_with(
            FakeGateway::new().route("/v1/models", Err(FetchError::Http { status: 500 })),
        );
        let session = ConversationSession::new();

        let selection = selector.ensure_backend(&session).await;
        assert_eq!(selection.backend.name(), "echo");
    }

    #[tokio::test]
    async fn test_ensure_backend_probes_at_most_once() {
        let (selector, gateway) =
            selector_with(FakeGateway::new().route("/v1/models", Ok(models_ok())));
        let session = ConversationSession::new();

        let first = selector.ensure_backend(&session).await;
        let second = selector.ensure_backend(&session).await;

        assert_eq!(gateway.calls_matching("/v1/models"), 1);
        assert!(first.greeting.is_some());
        assert!(second.greeting.is_none());
    }

    #[tokio::test]
    async fn test_racing_ensures_probe_once() {
        let (selector, gateway) =
            selector_with(FakeGateway::new().route("/v1/models", Ok(models_ok())));
        let selector = Arc::new(selector);
        let session = Arc::new(ConversationSession::new());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let selector = selector.clone();
                let session = session.clone();
                tokio::spawn(async move { selector.ensure_backend(&session).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(gateway.calls_matching("/v1/models"), 1);
    }

    // ---- respond ----

    #[tokio::test]
    async fn test_blank_prompts_leave_transcript_unchanged() {
        let (selector, gateway) =
            selector_with(FakeGateway::new().route("/v1/models", Ok(models_ok())));
        let session = ConversationSession::new();

        assert!(selector.respond(&session, "").await.is_none());
        assert!(selector.respond(&session, "   ").await.is_none());

        assert!(session.is_empty().await);
        assert!(!session.is_backend_selected().await);
        assert!(gateway.calls().is_empty());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_respond_success_appends_both_sides() {
        let (selector, _) = selector_with(
            FakeGateway::new()
                .route("/v1/models", Ok(models_ok()))
                .route("/v1/chat/completions", Ok(completion("hi there"))),
        );
        let session = ConversationSession::new();

        let reply = selector.respond(&session, "hello").await;

        assert_eq!(reply.as_deref(), Some("hi there"));
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "hello");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "hi there");
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_respond_trims_the_prompt() {
        let (selector, _) = selector_with(
            FakeGateway::new()
                .route("/v1/models", Ok(models_ok()))
                .route("/v1/chat/completions", Ok(completion("ok"))),
        );
        let session = ConversationSession::new();

        selector.respond(&session, "  hello  ").await;

        assert_eq!(session.transcript().await[0].content, "hello");
    }

    #[tokio::test]
    async fn test_fallback_reply_echoes_literal_prompt() {
        let (selector, _) = selector_with(
            FakeGateway::new().route("/v1/models", Err(FetchError::Transport("refused".into()))),
        );
        let session = ConversationSession::new();

        let selection = selector.ensure_backend(&session).await;
        assert_eq!(selection.backend.name(), "echo");

        let reply = selector.respond(&session, "hello").await.unwrap();

        assert!(reply.contains("hello"));
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert!(transcript[1].content.contains("\"hello\""));
    }

    #[tokio::test]
    async fn test_failed_reply_appends_error_and_clears_busy() {
        let (selector, _) = selector_with(
            FakeGateway::new()
                .route("/v1/models", Ok(models_ok()))
                .route("/v1/chat/completions", Err(FetchError::Http { status: 503 })),
        );
        let session = ConversationSession::new();
        let mut notices = selector.subscribe();

        let reply = selector.respond(&session, "hello").await;

        assert!(reply.is_none());
        assert!(!session.is_busy());

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, REPLY_ERROR);

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::AiError);
    }

    #[tokio::test]
    async fn test_reply_failure_keeps_remote_selected() {
        let gateway = FakeGateway::new()
            .route("/v1/models", Ok(models_ok()))
            .route("/v1/chat/completions", Err(FetchError::Http { status: 503 }));
        let (selector, gateway) = selector_with(gateway);
        let session = ConversationSession::new();

        selector.respond(&session, "first").await;

        // Selection is final: the next prompt still goes to the remote
        // backend, with no re-probe.
        gateway.set_route("/v1/chat/completions", Ok(completion("recovered")));
        let reply = selector.respond(&session, "second").await;

        assert_eq!(reply.as_deref(), Some("recovered"));
        assert_eq!(gateway.calls_matching("/v1/models"), 1);
    }

    // ---- clear ----

    #[tokio::test]
    async fn test_clear_empties_transcript_without_reprobe() {
        let (selector, gateway) = selector_with(
            FakeGateway::new()
                .route("/v1/models", Ok(models_ok()))
                .route("/v1/chat/completions", Ok(completion("ok"))),
        );
        let session = ConversationSession::new();

        selector.respond(&session, "hello").await;
        selector.clear(&session).await;

        assert!(session.is_empty().await);
        assert!(session.is_backend_selected().await);

        selector.respond(&session, "again").await;
        assert_eq!(session.len().await, 2);
        assert_eq!(gateway.calls_matching("/v1/models"), 1);
    }
}
