

pub mod core;
pub mod db;
pub mod http;
pub mod llm;
pub mod pipeline;
pub mod utils;

pub use crate::core::config::{AppConfig, OntologyMode};
pub use crate::core::error::{PipelineError, PipelineFailure, Result};
pub use db::{ConfigStore, FileConfigStore, HttpQueryStore, MemoryConfigStore, QueryStore, ResultFormat};
pub use http::build_router;
pub use llm::{LlmProvider, LlmProviderFactory};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutcome, PipelineRequest, QueryResult, Topic};
