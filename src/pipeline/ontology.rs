
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::models::{OntologyContext, PipelineConfig};
use crate::core::error::{PipelineError, Result};
use crate::db::{QueryStore, ResultFormat};

#[derive(Debug, Clone, Copy)]
enum Part {
    OntologyGraph,
    Properties,
    Classes,
}

impl Part {
    fn label(self) -> &'static str {
        match self {
            Self::OntologyGraph => "ontology graph",
            Self::Properties => "property list",
            Self::Classes => "class list",
        }
    }

    fn format(self) -> ResultFormat {
        match self {
            Self::OntologyGraph => ResultFormat::Csv,
            Self::Properties | Self::Classes => ResultFormat::Json,
        }
    }
}

pub struct OntologyContextLoader {
    store: Arc<dyn QueryStore>,
}

impl OntologyContextLoader {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, config: &PipelineConfig) -> Result<OntologyContext> {
        info!("Loading ontology context from {}", self.store.endpoint());

        let ontology_graph = self.fetch(Part::OntologyGraph, &config.ontology_query).await?;
        let properties = self.fetch(Part::Properties, &config.property_query).await?;
        let classes = self.fetch(Part::Classes, &config.classes_query).await?;

        info!(
            "Ontology context loaded (graph={} chars, properties={} chars, classes={} chars)",
            ontology_graph.len(),
            properties.len(),
            classes.len()
        );

        Ok(OntologyContext {
            ontology_graph,
            properties,
            classes,
        })
    }

    async fn fetch(&self, part: Part, query: &str) -> Result<String> {
        debug!("Fetching {}", part.label());

        let body = self.store.sparql(query, part.format()).await.map_err(|e| {
            warn!("Fetching {} failed: {}", part.label(), e);
            PipelineError::UpstreamQuery(format!("{} query failed: {e}", part.label()))
        })?;

        if body.trim().is_empty() {
            return Err(PipelineError::UpstreamQuery(format!(
                "{} query returned an empty result",
                part.label()
            )));
        }

        if part.format() == ResultFormat::Json {
            serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
                PipelineError::UpstreamQuery(format!("{} result is not JSON: {e}", part.label()))
            })?;
        }

        Ok(body)
    }
}
