//! Local inference backend (Ollama `/api/generate`).

use crate::http::check_error;
use crate::provider::{CompletionRequest, CompletionResponse, LlmError, LlmProvider};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

const CONNECT_TIMEOUT_SECS: u64 = 2;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Provider for a localhost inference server. The whole conversation is
/// flattened into one prompt; streaming is always off.
pub struct OllamaProvider {
    model: String,
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            client,
            base_url: base.trim_end_matches('/').to_owned(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: request.flattened_prompt(),
            stream: false,
            options: GenerateOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(check_error(status, text));
        }

        let api: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(CompletionResponse {
            content: api.response,
            input_tokens: api.prompt_eval_count.unwrap_or(0),
            output_tokens: api.eval_count.unwrap_or(0),
        })
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        Box::pin(self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatMessage;

    #[test]
    fn defaults() {
        let p = OllamaProvider::new(None, None);
        assert_eq!(p.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(p.model(), "llama3");
        assert_eq!(p.name(), "local");
    }

    #[test]
    fn request_body_shape() {
        let req = CompletionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            max_tokens: 30,
            temperature: 0.7,
        };
        let body = GenerateRequest {
            model: "llama3",
            prompt: req.flattened_prompt(),
            stream: false,
            options: GenerateOptions { num_predict: 30, temperature: 0.7 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["prompt"], "sys\n\nhi");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn parses_minimal_response() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"response":"beep"}"#).unwrap();
        assert_eq!(parsed.response, "beep");
        assert!(parsed.eval_count.is_none());
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        // Port 1 is reserved; nothing listens there.
        let p = OllamaProvider::new(None, Some("http://127.0.0.1:1".into()));
        let req = CompletionRequest {
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 10,
            temperature: 0.5,
        };
        let err = p.complete(req).await.unwrap_err();
        assert!(matches!(err, LlmError::Connection(_)), "got {err:?}");
    }
}
