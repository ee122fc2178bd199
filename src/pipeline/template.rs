

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use strum::{Display, EnumString, IntoStaticStr};

use super::models::PipelineConfig;
use crate::core::error::{PipelineError, Result};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Placeholder {
    NlQuery,
    Classes,
    Properties,
    Ontology,
    Prefixes,
    GraphUri,
    InferredGraphUri,
    QueryExample,
    Instructions,
    GeneratedQuery,
    Topic,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum TemplateKind {
    #[strum(serialize = "topicPromptTemplate")]
    TopicPrompt,
    #[strum(serialize = "sparqlPromptTemplate")]
    SparqlPrompt,
    #[strum(serialize = "outerQueryTemplate")]
    OuterQuery,
    #[strum(serialize = "outerQueryTemplateNoTopic")]
    OuterQueryNoTopic,
}

impl TemplateKind {
    pub fn required(self) -> &'static [Placeholder] {
        use Placeholder::*;
        match self {
            Self::TopicPrompt | Self::SparqlPrompt => &[NlQuery],
            Self::OuterQuery => &[GeneratedQuery, Topic],
            Self::OuterQueryNoTopic => &[GeneratedQuery],
        }
    }

    pub fn allowed(self) -> &'static [Placeholder] {
        use Placeholder::*;
        match self {
            Self::TopicPrompt => &[NlQuery],
            Self::SparqlPrompt => &[
                NlQuery,
                Classes,
                Properties,
                Ontology,
                Prefixes,
                GraphUri,
                InferredGraphUri,
                QueryExample,
                Instructions,
            ],
            Self::OuterQuery => &[GeneratedQuery, Topic, GraphUri, InferredGraphUri, Prefixes],
            Self::OuterQueryNoTopic => &[GeneratedQuery, GraphUri, InferredGraphUri, Prefixes],
        }
    }

    fn is_statement(self) -> bool {
        matches!(self, Self::OuterQuery | Self::OuterQueryNoTopic)
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot {
        placeholder: Placeholder,
        sql_literal: bool,
    },
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    kind: TemplateKind,
    segments: Vec<Segment>,
}

impl Template {

    pub fn compile(kind: TemplateKind, source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut quote: Option<char> = None;
        let mut rest = source;

        while let Some(c) = rest.chars().next() {
            if rest.starts_with("{{") || rest.starts_with("}}") {
                literal.push(c);
                rest = &rest[2..];
                continue;
            }

            if c == '{' {
                if let Some(m) = PLACEHOLDER.captures(rest).and_then(|caps| caps.get(1)) {
                    let name = m.as_str();
                    let consumed = name.len() + 2;
                    let placeholder: Placeholder = name.parse().map_err(|_| {
                        PipelineError::template(kind, format!("undeclared placeholder {{{name}}}"))
                    })?;
                    if !kind.allowed().contains(&placeholder) {
                        return Err(PipelineError::template(
                            kind,
                            format!("placeholder {{{name}}} is not available in this template"),
                        ));
                    }

                    let after = &rest[consumed..];
                    let sql_literal = kind.is_statement() && quote == Some('\'');

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot {
                        placeholder,
                        sql_literal,
                    });
                    rest = after;
                    continue;
                }
            }

            // A doubled quote toggles twice and leaves the literal open.
            if kind.is_statement() && (c == '\'' || c == '"') {
                quote = match quote {
                    None => Some(c),
                    Some(open) if open == c => None,
                    other => other,
                };
            }
            literal.push(c);
            rest = &rest[c.len_utf8()..];
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let template = Self { kind, segments };
        if let Some(missing) = kind.required().iter().find(|p| !template.uses(**p)) {
            return Err(PipelineError::template(
                kind,
                format!("missing required placeholder {{{missing}}}"),
            ));
        }

        Ok(template)
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot { placeholder: p, .. } if *p == placeholder))
    }

    pub fn render(&self, bindings: &Bindings<'_>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot {
                    placeholder,
                    sql_literal,
                } => {
                    let value = bindings.get(*placeholder).ok_or_else(|| {
                        PipelineError::template(self.kind, format!("no value bound for {{{placeholder}}}"))
                    })?;
                    if *sql_literal {
                        out.push_str(&value.replace('\'', "''"));
                    } else {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }
}


#[derive(Debug, Default, Clone)]
pub struct Bindings<'a> {
    values: HashMap<Placeholder, &'a str>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: Placeholder, value: &'a str) -> Self {
        self.values.insert(placeholder, value);
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&'a str> {
        self.values.get(&placeholder).copied()
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub topic_prompt: Template,
    pub sparql_prompt: Template,
    pub outer_query: Template,
    pub outer_query_no_topic: Template,
}

impl TemplateSet {
    pub fn compile(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            topic_prompt: Template::compile(TemplateKind::TopicPrompt, &config.topic_prompt_template)?,
            sparql_prompt: Template::compile(TemplateKind::SparqlPrompt, &config.sparql_prompt_template)?,
            outer_query: Template::compile(TemplateKind::OuterQuery, &config.outer_query_template)?,
            outer_query_no_topic: Template::compile(
                TemplateKind::OuterQueryNoTopic,
                &config.outer_query_template_no_topic,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::tests::sample_config;

    fn mismatch_detail(result: Result<Template>) -> String {
        match result {
            Err(PipelineError::TemplateMismatch { detail, .. }) => detail,
            other => panic!("expected template mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_renders_prompt() {
        let template = Template::compile(
            TemplateKind::SparqlPrompt,
            "Classes: {classes}\nQuestion: {nl_query}",
        )
        .unwrap();
        let bindings = Bindings::new()
            .with(Placeholder::Classes, "ex:Partner")
            .with(Placeholder::NlQuery, "list all partners in Germany");
        assert_eq!(
            template.render(&bindings).unwrap(),
            "Classes: ex:Partner\nQuestion: list all partners in Germany"
        );
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let source = "Example: SELECT ?s WHERE { ?s ?p ?o } and {\"topic\": \"x\"} for {nl_query}";
        let template = Template::compile(TemplateKind::SparqlPrompt, source).unwrap();
        let rendered = template
            .render(&Bindings::new().with(Placeholder::NlQuery, "q"))
            .unwrap();
        assert_eq!(
            rendered,
            "Example: SELECT ?s WHERE { ?s ?p ?o } and {\"topic\": \"x\"} for q"
        );
    }

    #[test]
    fn test_doubled_braces_escape() {
        let template = Template::compile(TemplateKind::TopicPrompt, "{{nl_query}} means {nl_query}").unwrap();
        let rendered = template
            .render(&Bindings::new().with(Placeholder::NlQuery, "the question"))
            .unwrap();
        assert_eq!(rendered, "{nl_query} means the question");
    }

    #[test]
    fn test_rejects_undeclared_placeholder() {
        let detail = mismatch_detail(Template::compile(
            TemplateKind::SparqlPrompt,
            "{nl_query} {schema}",
        ));
        assert!(detail.contains("{schema}"));
    }

    #[test]
    fn test_rejects_placeholder_outside_kind() {
        let detail = mismatch_detail(Template::compile(
            TemplateKind::OuterQueryNoTopic,
            "SELECT * FROM SPARQL_TABLE('{generated_query}') WHERE T = '{topic}'",
        ));
        assert!(detail.contains("{topic}"));
    }

    #[test]
    fn test_rejects_missing_generated_query() {
        let detail = mismatch_detail(Template::compile(
            TemplateKind::OuterQuery,
            "SELECT * FROM PARTNERS WHERE TOPIC = '{topic}'",
        ));
        assert!(detail.contains("{generated_query}"));
    }

    #[test]
    fn test_quoted_statement_slot_escapes_quotes() {
        let template = Template::compile(
            TemplateKind::OuterQueryNoTopic,
            "SELECT * FROM SPARQL_TABLE('{generated_query}')",
        )
        .unwrap();
        let sparql = "SELECT ?n WHERE { ?p ex:name ?n FILTER(?n = 'O''Brien') }";
        let rendered = template
            .render(&Bindings::new().with(Placeholder::GeneratedQuery, sparql))
            .unwrap();
        assert_eq!(
            rendered,
            "SELECT * FROM SPARQL_TABLE('SELECT ?n WHERE { ?p ex:name ?n FILTER(?n = ''O''''Brien'') }')"
        );
    }

    #[test]
    fn test_slots_inside_longer_literal_are_escaped() {
        let template = Template::compile(
            TemplateKind::OuterQueryNoTopic,
            "SELECT \"it's\", 'it''s {prefixes}' FROM T WHERE Q = {graph_uri} AND R = 'run {generated_query} now'",
        )
        .unwrap();
        let rendered = template
            .render(
                &Bindings::new()
                    .with(Placeholder::Prefixes, "a'b")
                    .with(Placeholder::GraphUri, "g'h")
                    .with(Placeholder::GeneratedQuery, "ASK { ?s ?p 'x' }"),
            )
            .unwrap();
        assert_eq!(
            rendered,
            "SELECT \"it's\", 'it''s a''b' FROM T WHERE Q = g'h AND R = 'run ASK { ?s ?p ''x'' } now'"
        );
    }

    #[test]
    fn test_prompt_slots_are_not_escaped() {
        let template = Template::compile(TemplateKind::TopicPrompt, "'{nl_query}'").unwrap();
        let rendered = template
            .render(&Bindings::new().with(Placeholder::NlQuery, "who's there"))
            .unwrap();
        assert_eq!(rendered, "'who's there'");
    }

    #[test]
    fn test_render_requires_binding() {
        let template = Template::compile(TemplateKind::TopicPrompt, "{nl_query}").unwrap();
        assert!(matches!(
            template.render(&Bindings::new()),
            Err(PipelineError::TemplateMismatch { .. })
        ));
    }

    #[test]
    fn test_template_set_compiles_sample() {
        let set = TemplateSet::compile(&sample_config()).unwrap();
        assert!(set.outer_query.uses(Placeholder::Topic));
        assert!(!set.outer_query_no_topic.uses(Placeholder::Topic));
        assert!(set.sparql_prompt.uses(Placeholder::Ontology));
    }

    #[test]
    fn test_template_set_names_failing_field() {
        let mut config = sample_config();
        config.outer_query_template_no_topic = "SELECT 1 FROM DUMMY".to_string();
        let err = TemplateSet::compile(&config).unwrap_err();
        assert!(err.to_string().contains("outerQueryTemplateNoTopic"));
    }
}
