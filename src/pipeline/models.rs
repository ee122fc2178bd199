

use serde::{Deserialize, Serialize};

use super::template::TemplateKind;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub ontology_query: String,
    pub property_query: String,
    pub classes_query: String,
    pub instructions: String,
    pub prefixes: String,
    #[serde(rename = "graphURI")]
    pub graph_uri: String,
    #[serde(rename = "inferredGraphURI")]
    pub inferred_graph_uri: String,
    pub query_example: String,
    pub sparql_prompt_template: String,
    pub topic_prompt_template: String,
    pub outer_query_template: String,
    pub outer_query_template_no_topic: String,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyContext {
    pub ontology_graph: String,
    pub properties: String,
    pub classes: String,
}


#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Topic {
    #[default]
    None,
    Named(String),
}

impl Topic {
    pub const NONE_SENTINEL: &'static str = "None";

    /// `"None"` in any case, blank text and a missing value all mean no topic.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None => Self::None,
            Some(l) if l.is_empty() || l.eq_ignore_ascii_case(Self::NONE_SENTINEL) => Self::None,
            Some(l) => Self::Named(l.to_string()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Named(name) => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name().unwrap_or(Self::NONE_SENTINEL))
    }
}

impl Serialize for Topic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicClassification {
    pub topic: Topic,
    pub rewritten_query: String,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalStatement {
    pub text: String,
    pub template: TemplateKind,
}
