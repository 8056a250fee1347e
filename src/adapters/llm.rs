use crate::domain::ports::{ConfigProvider, TextGenerator};
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<String>,
}

/// OpenAI 相容的 chat completions 客戶端（預設指向 Groq）
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl GroqClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            temperature: 0.0,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut client = Self::new(config.api_base_url(), config.api_key())
            .with_temperature(config.temperature());
        if let Some(secs) = config.request_timeout_secs() {
            client = client.with_timeout(Duration::from_secs(secs))?;
        }
        Ok(client)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let generation_error = |status: Option<u16>, message: String| {
            OutreachError::GenerationError {
                model: model.to_string(),
                status,
                message,
            }
        };

        let request = ChatRequest {
            model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("POST {} (model: {})", self.endpoint(), model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| generation_error(None, e.to_string()))?;

        let status = response.status();
        tracing::debug!("Chat completion status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ApiErrorEnvelope>(&body).ok();
            let rate_limit_code = parsed
                .as_ref()
                .and_then(|e| e.error.code.as_deref())
                .map(|code| code == "rate_limit_exceeded")
                .unwrap_or(false);
            let message = parsed.map(|e| e.error.message).unwrap_or(body);

            if status == StatusCode::TOO_MANY_REQUESTS || rate_limit_code {
                return Err(OutreachError::RateLimitedError {
                    model: model.to_string(),
                    message,
                });
            }
            return Err(generation_error(Some(status.as_u16()), message));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| generation_error(Some(status.as_u16()), e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                generation_error(
                    Some(status.as_u16()),
                    "response contained no message content".to_string(),
                )
            })
    }
}
