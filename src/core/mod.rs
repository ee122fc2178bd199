

pub mod config;
pub mod error;
pub mod snapshot;

pub use config::{AppConfig, OntologyMode};
pub use error::{PipelineError, PipelineFailure, Result};
pub use snapshot::{PipelineSnapshot, SnapshotCell};
