

use thiserror::Error;

use crate::db::{ConfigStoreError, StoreError};
use crate::llm::providers::LlmProviderError;
use crate::pipeline::template::TemplateKind;


#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream query failed: {0}")]
    UpstreamQuery(String),

    #[error("Malformed completion: {reason} (completion: {preview})")]
    MalformedCompletion { reason: String, preview: String },

    #[error("Template mismatch in {kind}: {detail}")]
    TemplateMismatch { kind: TemplateKind, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn malformed(reason: impl Into<String>, completion: &str) -> Self {
        Self::MalformedCompletion {
            reason: reason.into(),
            preview: crate::utils::preview(completion.trim(), 200),
        }
    }

    pub fn template(kind: TemplateKind, detail: impl Into<String>) -> Self {
        Self::TemplateMismatch {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UpstreamQuery(_) => "upstream_query",
            Self::MalformedCompletion { .. } => "malformed_completion",
            Self::TemplateMismatch { .. } => "template_mismatch",
            Self::Config(_) => "config",
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        Self::UpstreamQuery(err.to_string())
    }
}

impl From<LlmProviderError> for PipelineError {
    fn from(err: LlmProviderError) -> Self {
        Self::UpstreamQuery(format!("LLM call failed: {err}"))
    }
}

impl From<ConfigStoreError> for PipelineError {
    fn from(err: ConfigStoreError) -> Self {
        Self::Config(err.to_string())
    }
}


#[derive(Debug)]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub final_statement: Option<String>,
}

impl PipelineFailure {
    pub fn with_statement(error: PipelineError, statement: impl Into<String>) -> Self {
        Self {
            error,
            final_statement: Some(statement.into()),
        }
    }
}

impl From<PipelineError> for PipelineFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            final_statement: None,
        }
    }
}

impl std::fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}


pub type Result<T> = std::result::Result<T, PipelineError>;
