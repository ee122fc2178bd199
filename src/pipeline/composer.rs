

use tracing::{debug, info};

use super::formatter::format_statement;
use super::models::{FinalStatement, PipelineConfig, Topic};
use super::template::{Bindings, Placeholder, Template, TemplateSet};
use crate::core::error::Result;


pub struct QueryComposer<'a> {
    templates: &'a TemplateSet,
    config: &'a PipelineConfig,
}

impl<'a> QueryComposer<'a> {
    pub fn new(templates: &'a TemplateSet, config: &'a PipelineConfig) -> Self {
        Self { templates, config }
    }

    pub fn select(&self, topic: &Topic) -> &'a Template {
        match topic {
            Topic::Named(_) => &self.templates.outer_query,
            Topic::None => &self.templates.outer_query_no_topic,
        }
    }

    /// Splices the generated query (and the topic when there is one) into the
    /// outer template and lays the result out for reading.
    pub fn compose(&self, generated_query: &str, topic: &Topic) -> Result<FinalStatement> {
        let template = self.select(topic);

        let mut bindings = Bindings::new()
            .with(Placeholder::GeneratedQuery, generated_query)
            .with(Placeholder::GraphUri, &self.config.graph_uri)
            .with(Placeholder::InferredGraphUri, &self.config.inferred_graph_uri)
            .with(Placeholder::Prefixes, &self.config.prefixes);
        if let Some(name) = topic.name() {
            bindings = bindings.with(Placeholder::Topic, name);
        }

        let rendered = template.render(&bindings)?;
        let text = format_statement(&rendered);

        info!("Composed statement with {} (topic={})", template.kind(), topic);
        debug!("Final statement:\n{}", text);

        Ok(FinalStatement {
            text,
            template: template.kind(),
        })
    }
}
