

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::models::{OntologyContext, PipelineConfig};
use super::prompts::SPARQL_SYSTEM_PROMPT;
use super::template::{Bindings, Placeholder, Template, TemplateKind};
use crate::core::error::{PipelineError, Result};
use crate::llm::completion::extract_query_text;
use crate::llm::providers::base::LlmProvider;
use crate::utils::{preview, single_line};


pub struct SparqlGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl SparqlGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }


    pub fn render_prompt(
        template: &Template,
        question: &str,
        ontology: &OntologyContext,
        config: &PipelineConfig,
    ) -> Result<String> {
        if template.kind() != TemplateKind::SparqlPrompt {
            return Err(PipelineError::template(
                template.kind(),
                "SPARQL generation needs the SPARQL prompt template",
            ));
        }

        let bindings = Bindings::new()
            .with(Placeholder::NlQuery, question)
            .with(Placeholder::Ontology, &ontology.ontology_graph)
            .with(Placeholder::Properties, &ontology.properties)
            .with(Placeholder::Classes, &ontology.classes)
            .with(Placeholder::Prefixes, &config.prefixes)
            .with(Placeholder::GraphUri, &config.graph_uri)
            .with(Placeholder::InferredGraphUri, &config.inferred_graph_uri)
            .with(Placeholder::QueryExample, &config.query_example)
            .with(Placeholder::Instructions, &config.instructions);

        template.render(&bindings)
    }

    pub async fn generate(
        &self,
        template: &Template,
        question: &str,
        ontology: &OntologyContext,
        config: &PipelineConfig,
    ) -> Result<String> {
        let prompt = Self::render_prompt(template, question, ontology, config)?;
        debug!("SPARQL prompt rendered ({} chars)", prompt.len());

        let (completion, metadata) = self.llm.generate(SPARQL_SYSTEM_PROMPT, &prompt, None).await?;
        debug!(
            "SPARQL completion from {}/{} (tokens={:?})",
            metadata.provider, metadata.model, metadata.tokens_total
        );

        let query = extract_query_text(&completion).inspect_err(|e| {
            warn!("SPARQL completion rejected: {}", e);
        })?;

        info!("Generated SPARQL: {}", preview(&single_line(&query), 120));
        Ok(query)
    }
}
