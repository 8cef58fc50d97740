use std::sync::Arc;
use std::time::Duration;

use deskpet_llm::provider::{ChatMessage, CompletionRequest, LlmError, LlmProvider};
use deskpet_llm::{http, local};

use super::request::AiContext;
use crate::config::{AiBackendKind, AiConfig};

const SYSTEM_PROMPT: &str = "You are a helpful, quirky, and friendly desktop assistant. \
Keep your responses very short, like a real desktop pet would talk. \
Limit your answer to one short sentence or phrase (max 15 words).";

const MAX_REPLY_TOKENS: u32 = 30;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("ai backend did not answer within {0:?}")]
    Timeout(Duration),
    #[error("ai backend unreachable: {0}")]
    Connection(String),
    #[error("ai backend error: {0}")]
    Backend(String),
    #[error("ai backend returned an empty reply")]
    EmptyReply,
}

impl AiError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Timeout(_) => "timeout",
            AiError::Connection(_) => "connection",
            AiError::Backend(_) => "backend",
            AiError::EmptyReply => "empty",
        }
    }
}

impl From<LlmError> for AiError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Connection(msg) => AiError::Connection(msg),
            other => AiError::Backend(other.to_string()),
        }
    }
}

/// A configured AI backend with a bounded wait per question.
#[derive(Clone)]
pub struct AiBackend {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl AiBackend {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Build the backend the config selects. `None` when AI is disabled or
    /// the remote backend has no API key.
    pub fn from_config(cfg: &AiConfig) -> Option<Self> {
        if !cfg.enabled {
            tracing::info!("ai backend disabled, pet speaks scripted lines only");
            return None;
        }
        let provider: Arc<dyn LlmProvider> = match cfg.backend {
            AiBackendKind::Local => Arc::new(local::OllamaProvider::new(cfg.model.clone(), cfg.base_url.clone())),
            AiBackendKind::OpenAi => match http::from_env(cfg.model.clone(), cfg.base_url.clone()) {
                Some(p) => Arc::new(p),
                None => {
                    tracing::warn!("openai backend selected but no api key in environment, ai disabled");
                    return None;
                }
            },
        };
        tracing::info!(backend = provider.name(), timeout_ms = cfg.timeout_ms, "ai backend ready");
        Some(Self::new(provider, cfg.timeout()))
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Ask one question. The reply is trimmed and stripped of wrapping quotes.
    pub async fn ask(&self, prompt: &str, context: &AiContext) -> Result<String, AiError> {
        let request = CompletionRequest {
            messages: build_messages(prompt, context),
            max_tokens: MAX_REPLY_TOKENS,
            temperature: TEMPERATURE,
        };
        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| AiError::Timeout(self.timeout))??;
        tracing::debug!(
            backend = self.name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "ai reply received"
        );
        let reply = clean_reply(&response.content);
        if reply.is_empty() {
            return Err(AiError::EmptyReply);
        }
        Ok(reply)
    }
}

/// System prompt, then context lines and the task as one user message.
pub fn build_messages(prompt: &str, context: &AiContext) -> Vec<ChatMessage> {
    let mut user = context.lines().join("\n");
    if !user.is_empty() {
        user.push_str("\n\n");
    }
    user.push_str("Task: ");
    user.push_str(prompt.trim());
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Prompt asking the backend to say a scripted line in character.
pub fn rephrase_prompt(line: &str) -> String {
    format!("Say this in your own words, in character: \"{}\"", line.trim())
}

fn clean_reply(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_owned()
}
