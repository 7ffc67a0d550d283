use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, TranslateError};

/// The translation backend: one system instruction, one user payload, one
/// generated text back. Implementations must not retry; failure handling
/// belongs to the caller.
pub trait TranslationBackend: Send + Sync {
    fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

impl<T: TranslationBackend> TranslationBackend for &T {
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        (**self).complete(model, system, user).await
    }
}

impl<T: TranslationBackend> TranslationBackend for std::sync::Arc<T> {
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        (**self).complete(model, system, user).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat-completions client for OpenRouter.
pub struct LlmClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    referrer: String,
    app_name: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        LlmClient {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            referrer: config.referrer.clone(),
            app_name: config.app_name.clone(),
        }
    }
}

impl TranslationBackend for LlmClient {
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referrer)
            .header("X-Title", &self.app_name)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TranslateError::MalformedResponse("empty choices array".to_string()))
    }
}
