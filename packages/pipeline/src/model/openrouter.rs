//! OpenRouter implementation of the model trait.
//!
//! Sends JSON-mode chat completions to the OpenRouter API with a bounded
//! request timeout. One request per call; retries are left to future
//! pipeline runs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::traits::model::ModelClient;

/// Bound on one completion request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const APP_TITLE: &str = "Job Parser";

/// OpenRouter-backed model client.
#[derive(Clone)]
pub struct OpenRouter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouter {
    /// Create a new client for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for OpenRouter {
    async fn complete_json(&self, prompt: &str) -> ModelResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", APP_TITLE)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string().into()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Http(e.to_string().into()))?;

        if let Some(error) = chat_response.error {
            return Err(ModelError::Api(error.message));
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse)
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}
