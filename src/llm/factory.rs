

use std::sync::Arc;

use super::providers::base::LlmProvider;
use super::providers::ollama::{OllamaProvider, DEFAULT_OLLAMA_URL};
use super::providers::openai::{OpenAiProvider, DEFAULT_OPENAI_URL};
use crate::core::config::AppConfig;
use crate::core::error::{PipelineError, Result};

pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "ollama"];


pub struct LlmProviderFactory;

impl LlmProviderFactory {

    pub fn create(
        provider: &str,
        model: &str,
        api_key: Option<&str>,
        base_url: Option<&str>,
        temperature: f64,
        timeout_secs: u64,
    ) -> Result<Arc<dyn LlmProvider>> {
        let llm: Arc<dyn LlmProvider> = match provider {
            "openai" => Arc::new(
                OpenAiProvider::new(
                    api_key.map(String::from),
                    base_url.unwrap_or(DEFAULT_OPENAI_URL),
                    model,
                    temperature,
                    timeout_secs,
                )
                .map_err(|e| PipelineError::Config(e.to_string()))?,
            ),
            "ollama" => Arc::new(
                OllamaProvider::new(
                    base_url.unwrap_or(DEFAULT_OLLAMA_URL),
                    model,
                    temperature,
                    timeout_secs,
                )
                .map_err(|e| PipelineError::Config(e.to_string()))?,
            ),
            _ => {
                return Err(PipelineError::Config(format!(
                    "Unknown provider: {provider}. Supported: {}",
                    SUPPORTED_PROVIDERS.join(", ")
                )));
            }
        };
        Ok(llm)
    }

    pub fn from_config(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
        Self::create(
            &config.llm_provider,
            &config.llm_model,
            config.llm_api_key.as_deref(),
            config.llm_base_url.as_deref(),
            config.llm_temperature,
            config.llm_timeout,
        )
    }
}
