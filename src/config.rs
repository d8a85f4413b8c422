use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::{DEFAULT_BASE_URL, DEFAULT_MODEL, OPENROUTER_MODELS};
use crate::api_connection::Provider;
use crate::extraction::ExtractionConfig;

pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_STORE_DIR: &str = "plans";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the variable holding the API key; the key itself is read
    /// per request.
    pub api_key_env_var: String,
    pub api_base_url: String,
    pub store_dir: PathBuf,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_base_url =
            env::var("FITPLAN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!("FITPLAN_API_BASE_URL must be an http(s) URL, got '{}'", api_base_url);
        }

        let model = env::var("FITPLAN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        if !is_known_model(&model) {
            tracing::warn!(model = %model, "model is not in the tested OpenRouter list");
        }
        let store_dir = env::var("FITPLAN_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_DIR));

        let max_tokens = match env::var("FITPLAN_MAX_TOKENS") {
            Ok(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("FITPLAN_MAX_TOKENS must be a positive integer, got '{}'", raw))?,
            Err(_) => ExtractionConfig::default().max_tokens,
        };

        Ok(Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            api_base_url,
            store_dir,
            extraction: ExtractionConfig {
                model,
                max_tokens,
                ..ExtractionConfig::default()
            },
        })
    }

    pub fn provider(&self) -> Provider {
        Provider::openrouter(&self.api_key_env_var).with_base_url(self.api_base_url.clone())
    }
}

/// Whether `model` is one of the OpenRouter models this crate is tested with.
pub fn is_known_model(model: &str) -> bool {
    OPENROUTER_MODELS.iter().any(|m| m.model_name == model)
}
