use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// LLM completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Flatten the conversation into a single prompt for completion-style
    /// endpoints that take no message list.
    pub fn flattened_prompt(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// LLM completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Error type for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The endpoint could not be reached at all (refused, DNS, TLS).
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("rate limited")]
    RateLimited,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Classify a transport error from reqwest.
    pub fn from_transport(e: reqwest::Error) -> Self {
        let connect = e.is_connect();
        tracing::warn!(url = ?e.url().map(|u| u.as_str()), connect, timeout = e.is_timeout(), error = %e, "LLM request failed");
        if connect {
            LlmError::Connection(e.to_string())
        } else {
            LlmError::RequestFailed(e.to_string())
        }
    }
}

/// Trait for LLM backends (local inference server, OpenAI-compatible APIs).
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>>;
}

/// What a [`MockProvider`] does when called.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Reply(String),
    Unavailable(String),
    Connection(String),
    /// Never resolves; used to exercise caller-side timeouts.
    Hang,
}

/// Mock provider for testing. Records every request it receives.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Reply(response.into()))
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of `complete` calls so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|g| g.clone())
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_request.lock() {
            *slot = Some(request);
        }
        let behavior = self.behavior.clone();
        Box::pin(async move {
            match behavior {
                MockBehavior::Reply(content) => Ok(CompletionResponse {
                    content,
                    input_tokens: 10,
                    output_tokens: 20,
                }),
                MockBehavior::Unavailable(msg) => Err(LlmError::Unavailable(msg)),
                MockBehavior::Connection(msg) => Err(LlmError::Connection(msg)),
                MockBehavior::Hang => std::future::pending().await,
            }
        })
    }
}
