use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use std::env;
use thiserror::Error;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, DEFAULT_BASE_URL};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("Empty completion: {0}")]
    EmptyResponse(String),
}

impl ApiConnectionError {
    /// Rate limiting is reported either as HTTP 429 or as an error body that
    /// mentions it (some upstream providers answer 200/5xx with a message).
    pub fn is_rate_limited(&self) -> bool {
        if let ApiConnectionError::ApiError { status, .. } = self {
            if *status == StatusCode::TOO_MANY_REQUESTS {
                return true;
            }
        }
        self.to_string().to_lowercase().contains("rate limit")
    }
}

/// Seam between the extraction layer and whatever answers chat completions.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError>;
}

#[derive(Clone, Debug)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, read on every call.
        api_key: String,
        base_url: String,
        site_url: String,
        app_name: String,
        http: Client,
    },
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "FitPlan".to_string()),
            http: Client::new(),
        }
    }

    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        match self {
            Provider::OpenRouter {
                api_key,
                site_url,
                app_name,
                http,
                ..
            } => Provider::OpenRouter {
                api_key,
                base_url: url.into(),
                site_url,
                app_name,
                http,
            },
        }
    }

    fn completions_url(&self) -> String {
        match self {
            Provider::OpenRouter { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }
}

#[async_trait]
impl CompletionClient for Provider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                site_url,
                app_name,
                http,
                ..
            } => {
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let url = self.completions_url();
                tracing::debug!(url = %url, model = %request.model, "sending chat completion");

                let response = http
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    Ok(response.json::<ChatCompletionResponse>().await?)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

/// Returns the first choice's content with any markdown code fence removed.
pub fn extract_json_content(response: &ChatCompletionResponse) -> Result<String, ApiConnectionError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| ApiConnectionError::EmptyResponse("no choices in response".to_string()))?;

    let mut content = choice.message.content.trim();
    if content.starts_with("```") && content.ends_with("```") && content.len() >= 6 {
        content = content
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
    }

    if content.is_empty() {
        return Err(ApiConnectionError::EmptyResponse(
            "content is empty after stripping markdown".to_string(),
        ));
    }
    Ok(content.to_string())
}
