//! The completion boundary: one chat call in, generated text out.
//!
//! [`CompletionClient`] is the seam the generator talks to. Production code
//! uses [`LlmCompletionClient`], which adapts any `edgequake_llm` provider;
//! tests substitute a scripted implementation. The generator owns the retry
//! policy, so implementations must make exactly one upstream attempt per call
//! and surface failures as [`CompletionError`].

use crate::error::CompletionError;
use crate::prompts::PromptPair;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// `[system, user]` request built from a prompt pair.
    pub fn from_prompts(model: impl Into<String>, temperature: f32, prompts: &PromptPair) -> Self {
        Self {
            model: model.into(),
            temperature,
            messages: vec![
                Message::system(prompts.system.as_str()),
                Message::user(prompts.user.as_str()),
            ],
        }
    }
}

/// Generates text for a chat request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
///
/// The provider is bound to its model when constructed (see
/// [`crate::generate::resolve_provider`]); a different `request.model` is
/// logged, not switched to.
#[derive(Clone)]
pub struct LlmCompletionClient {
    provider: Arc<dyn LLMProvider>,
    max_tokens: Option<usize>,
    timeout_secs: u64,
}

impl LlmCompletionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout_secs: u64) -> Self {
        Self {
            provider,
            max_tokens: None,
            timeout_secs,
        }
    }

    /// Cap generated tokens per call.
    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl fmt::Debug for LlmCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmCompletionClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl CompletionClient for LlmCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let start = Instant::now();
        if self.provider.model() != request.model {
            warn!(
                "Provider {} is bound to model '{}', not '{}'",
                self.provider.name(),
                self.provider.model(),
                request.model
            );
        }
        let messages = to_chat_messages(&request.messages);
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: self.max_tokens,
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        let response = timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| CompletionError::Timeout {
                secs: self.timeout_secs,
            })?
            .map_err(|e| CompletionError::Api(format!("{}", e)))?;

        debug!(
            "Completion ({}, t={}): {} input tokens, {} output tokens, {:?}",
            request.model,
            request.temperature,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        // Empty content is not an upstream failure; it fails the JSON parse
        // and goes through the repair retry like any other unusable answer.
        Ok(response.content.trim().to_string())
    }
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => ChatMessage::system(m.content.as_str()),
            Role::User => ChatMessage::user(m.content.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::prompts::build_prompts;

    #[test]
    fn request_from_prompts_is_system_then_user() {
        let prompts = build_prompts(ArtifactKind::Flashcards, "content");
        let req = CompletionRequest::from_prompts("llama3-8b-8192", 0.2, &prompts);
        assert_eq!(req.model, "llama3-8b-8192");
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, prompts.system);
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[1].content, prompts.user);
    }

    #[test]
    fn converts_to_provider_messages() {
        let msgs = to_chat_messages(&[Message::system("s"), Message::user("u")]);
        assert_eq!(msgs.len(), 2);
    }
}
