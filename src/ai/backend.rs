//! Chat backends
//!
//! Two reply strategies sit behind the [`ChatBackend`] trait.
//! [`RemoteBackend`] posts the transcript to an OpenAI-compatible local
//! inference server; [`EchoBackend`] is the built-in demo responder used
//! when no server is reachable. The selector probes once and binds one
//! of them to the session for the life of the process.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::session::ChatMessage;
use crate::config::AssistantConfig;
use crate::error::{AiError, AiResult};
use crate::fetch::FetchGateway;

/// Reply strategy bound to a session after the liveness probe
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Produce a reply to `prompt`
    ///
    /// `transcript` already ends with the user message carrying `prompt`.
    /// Backends that model history send the whole transcript; backends
    /// that do not can answer from `prompt` alone.
    async fn respond(&self, transcript: &[ChatMessage], prompt: &str) -> AiResult<String>;
}

/// Backend for an OpenAI-compatible chat completions endpoint
pub struct RemoteBackend {
    gateway: Arc<dyn FetchGateway>,
    chat_url: String,
    model: String,
    request_timeout: Duration,
}

impl RemoteBackend {
    pub fn new(gateway: Arc<dyn FetchGateway>, config: &AssistantConfig) -> Self {
        Self {
            gateway,
            chat_url: config.chat_url(),
            model: config.model.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionWire {
    #[serde(default)]
    choices: Vec<ChoiceWire>,
}

#[derive(Debug, Deserialize)]
struct ChoiceWire {
    message: ChoiceMessageWire,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessageWire {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn respond(&self, transcript: &[ChatMessage], _prompt: &str) -> AiResult<String> {
        // The transcript already carries the user message once.
        let body = json!({
            "model": self.model,
            "messages": transcript,
        });

        let raw = tokio::time::timeout(
            self.request_timeout,
            self.gateway.post_json(&self.chat_url, &body),
        )
        .await
        .map_err(|_| AiError::Unavailable("Chat completion request timed out".to_string()))?
        .map_err(|e| AiError::Unavailable(e.to_string()))?;

        let completion: CompletionWire = serde_json::from_value(raw)
            .map_err(|e| AiError::Unavailable(format!("Malformed completion response: {}", e)))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(AiError::Unavailable(
                "Model returned an empty reply".to_string(),
            ));
        }
        Ok(reply)
    }
}

/// Pure local demo backend, never fails
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoBackend;

impl EchoBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatBackend for EchoBackend {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn respond(&self, _transcript: &[ChatMessage], prompt: &str) -> AiResult<String> {
        Ok(format!(
            "Demo engine active.\n\nYou said: \"{}\".\n\nStart the local inference server to enable full answers.",
            prompt
        ))
    }
}
