

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use url::Url;

use super::error::{PipelineError, Result};

pub const ENV_PREFIX: &str = "SPARQL_BRIDGE";
pub const ENV_CONFIG_PATH: &str = "SPARQL_BRIDGE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "sparql-bridge.toml";


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OntologyMode {
    #[default]
    Cached,
    PerRequest,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,

    pub store_sparql_url: String,
    pub store_statement_url: Option<String>,
    pub store_user: Option<String>,
    pub store_password: Option<String>,
    pub store_timeout: u64,

    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,
    pub llm_timeout: u64,

    pub pipeline_config_path: String,
    pub ontology_mode: OntologyMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),

            store_sparql_url: "http://localhost:7200/sparql".to_string(),
            store_statement_url: None,
            store_user: None,
            store_password: None,
            store_timeout: 60,

            llm_provider: "openai".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.0,
            llm_timeout: 120,

            pipeline_config_path: "pipeline-config.json".to_string(),
            ontology_mode: OntologyMode::Cached,
        }
    }
}

impl AppConfig {

    pub fn load(path: Option<&str>) -> Result<Self> {
        let env_path = std::env::var(ENV_CONFIG_PATH).ok();
        let (file, required) = match path.or(env_path.as_deref()) {
            Some(p) => (p.to_string(), true),
            None => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot read settings: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(format!("invalid settings: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.store_sparql_url).map_err(|e| {
            PipelineError::Config(format!("store_sparql_url '{}': {e}", self.store_sparql_url))
        })?;
        if let Some(url) = &self.store_statement_url {
            Url::parse(url)
                .map_err(|e| PipelineError::Config(format!("store_statement_url '{url}': {e}")))?;
        }
        if let Some(url) = &self.llm_base_url {
            Url::parse(url)
                .map_err(|e| PipelineError::Config(format!("llm_base_url '{url}': {e}")))?;
        }
        if !crate::llm::factory::SUPPORTED_PROVIDERS.contains(&self.llm_provider.as_str()) {
            return Err(PipelineError::Config(format!(
                "unknown llm_provider '{}'. Supported: {}",
                self.llm_provider,
                crate::llm::factory::SUPPORTED_PROVIDERS.join(", ")
            )));
        }
        if self.store_user.is_some() != self.store_password.is_some() {
            return Err(PipelineError::Config(
                "store_user and store_password must be set together".to_string(),
            ));
        }
        Ok(())
    }
}
