//! Remote chat-completion backend.
//!
//! Speaks the OpenAI `/chat/completions` wire format, which also covers
//! compatible hosted services behind a custom base URL.

use crate::provider::{CompletionRequest, CompletionResponse, LlmError, LlmProvider};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Serialize)]
struct OaiRequest<'a> {
    model: &'a str,
    messages: Vec<OaiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OaiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OaiResponse {
    choices: Vec<OaiChoice>,
    usage: Option<OaiUsage>,
}

#[derive(Deserialize)]
struct OaiChoice {
    message: OaiChoiceMessage,
}

#[derive(Deserialize)]
struct OaiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OaiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI-compatible chat completion provider.
pub struct HttpProvider {
    model: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpProvider {
    /// Build from model name + API key + optional base URL override.
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            model,
            client,
            base_url: base.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn complete_chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = OaiRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| OaiMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(check_error(status, text));
        }

        let api: OaiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let content = api
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".into()))?;
        let (input_tokens, output_tokens) = api
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(CompletionResponse { content, input_tokens, output_tokens })
    }
}

/// Map a non-success status to an error, returning RateLimited for 429.
pub(crate) fn check_error(status: reqwest::StatusCode, body: String) -> LlmError {
    tracing::warn!(status = status.as_u16(), body = %body, "LLM provider returned an error");
    match status.as_u16() {
        429 => LlmError::RateLimited,
        401 | 403 => LlmError::Unavailable(format!("{status}: {body}")),
        _ => LlmError::RequestFailed(format!("{status}: {body}")),
    }
}

impl LlmProvider for HttpProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        Box::pin(self.complete_chat(request))
    }
}

/// Read the API key from `DESKPET_LLM_API_KEY`, falling back to `OPENAI_API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("DESKPET_LLM_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Build a remote provider; `None` when no API key is available.
pub fn from_env(model: Option<String>, base_url: Option<String>) -> Option<HttpProvider> {
    let api_key = api_key_from_env()?;
    let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_owned());
    Some(HttpProvider::new(model, api_key, base_url))
}
