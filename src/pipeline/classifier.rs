

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::models::TopicClassification;
use super::prompts::TOPIC_SYSTEM_PROMPT;
use super::template::{Bindings, Placeholder, Template, TemplateKind};
use crate::core::error::{PipelineError, Result};
use crate::llm::completion::extract_topic;
use crate::llm::providers::base::LlmProvider;
use crate::utils::preview;


pub struct TopicClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl TopicClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, template: &Template, question: &str) -> Result<TopicClassification> {
        if template.kind() != TemplateKind::TopicPrompt {
            return Err(PipelineError::template(
                template.kind(),
                "topic classification needs the topic prompt template",
            ));
        }

        let prompt = template.render(&Bindings::new().with(Placeholder::NlQuery, question))?;
        debug!("Topic prompt rendered ({} chars)", prompt.len());

        let (completion, metadata) = self
            .llm
            .generate(TOPIC_SYSTEM_PROMPT, &prompt, Some("json_object"))
            .await?;
        debug!(
            "Topic completion from {}/{} (tokens={:?})",
            metadata.provider, metadata.model, metadata.tokens_total
        );

        let classification = extract_topic(&completion).inspect_err(|e| {
            warn!("Topic completion rejected: {}", e);
        })?;

        info!(
            "Classified '{}' as topic={} (rewritten='{}')",
            preview(question, 50),
            classification.topic,
            preview(&classification.rewritten_query, 50)
        );
        Ok(classification)
    }
}
