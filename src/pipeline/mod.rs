

pub mod classifier;
pub mod composer;
pub mod executor;
pub mod formatter;
pub mod generator;
pub mod models;
pub mod ontology;
pub mod prompts;
pub mod template;

pub use classifier::TopicClassifier;
pub use composer::QueryComposer;
pub use executor::{QueryExecutor, QueryResult};
pub use formatter::format_statement;
pub use generator::SparqlGenerator;
pub use models::{FinalStatement, OntologyContext, PipelineConfig, Topic, TopicClassification};
pub use ontology::OntologyContextLoader;
pub use template::{Placeholder, Template, TemplateKind, TemplateSet};

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::core::config::OntologyMode;
use crate::core::error::{PipelineError, PipelineFailure, Result};
use crate::core::snapshot::{PipelineSnapshot, SnapshotCell};
use crate::db::{ConfigStore, QueryStore, ResultFormat};
use crate::llm::providers::base::LlmProvider;
use crate::utils::{is_blank, preview};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub question: String,
    pub classify: bool,
    pub compose: bool,
    /// `None` stops after generation (or composition) without touching the store.
    pub execute: Option<ResultFormat>,
}

impl PipelineRequest {
    pub fn sparql_only(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            classify: false,
            compose: false,
            execute: None,
        }
    }

    pub fn full(question: impl Into<String>, format: ResultFormat) -> Self {
        Self {
            question: question.into(),
            classify: true,
            compose: true,
            execute: Some(format),
        }
    }
}


#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub topic: Topic,
    pub rewritten_query: String,
    pub sparql_query: String,
    pub final_statement: Option<FinalStatement>,
    pub result: Option<QueryResult>,
}


pub struct Pipeline {
    store: Arc<dyn QueryStore>,
    llm: Arc<dyn LlmProvider>,
    config_store: Arc<dyn ConfigStore>,
    cell: SnapshotCell,
    mode: OntologyMode,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn QueryStore>,
        llm: Arc<dyn LlmProvider>,
        config_store: Arc<dyn ConfigStore>,
        mode: OntologyMode,
    ) -> Self {
        info!(
            "Pipeline created (store={}, llm={}/{}, ontology_mode={})",
            store.endpoint(),
            llm.provider_name(),
            llm.model_name(),
            mode
        );
        Self {
            store,
            llm,
            config_store,
            cell: SnapshotCell::new(),
            mode,
        }
    }

    pub fn mode(&self) -> OntologyMode {
        self.mode
    }

    pub fn cached_snapshot(&self) -> Option<Arc<PipelineSnapshot>> {
        self.cell.current()
    }

    async fn build_snapshot(&self) -> Result<PipelineSnapshot> {
        let config = self.config_store.load().await?;
        let templates = TemplateSet::compile(&config)?;
        let ontology = OntologyContextLoader::new(Arc::clone(&self.store))
            .load(&config)
            .await?;
        PipelineSnapshot::new(config, templates, ontology)
    }

    pub async fn snapshot(&self) -> Result<Arc<PipelineSnapshot>> {
        match self.mode {
            OntologyMode::Cached => self.cell.get_or_load(|| self.build_snapshot()).await,
            OntologyMode::PerRequest => Ok(Arc::new(self.build_snapshot().await?)),
        }
    }

    /// Rebuilds config and ontology context and swaps them in as one snapshot.
    pub async fn reload(&self) -> Result<Arc<PipelineSnapshot>> {
        info!("Reloading pipeline snapshot");
        let snapshot = self
            .cell
            .reload(|| self.build_snapshot())
            .await
            .inspect_err(|e| warn!("Reload failed, keeping previous snapshot: {}", e))?;
        info!(
            "Snapshot installed (fingerprint={}, loaded_at={})",
            preview(&snapshot.fingerprint, 12),
            snapshot.loaded_at
        );
        Ok(snapshot)
    }

    pub async fn read_config(&self) -> Result<PipelineConfig> {
        Ok(self.config_store.load().await?)
    }

    /// Persists a whole record after its templates compile. The running
    /// snapshot is untouched until the next reload.
    pub async fn write_config(&self, config: &PipelineConfig) -> Result<()> {
        TemplateSet::compile(config)?;
        self.config_store.save(config).await?;
        info!("Pipeline configuration replaced");
        Ok(())
    }

    pub async fn execute_raw(&self, query: &str, format: ResultFormat) -> Result<QueryResult> {
        if is_blank(query) {
            return Err(PipelineError::Validation("query must not be empty".to_string()));
        }
        QueryExecutor::new(Arc::clone(&self.store))
            .execute_raw(query, format)
            .await
    }

    pub async fn run(&self, request: &PipelineRequest) -> std::result::Result<PipelineOutcome, PipelineFailure> {
        let span = info_span!("pipeline", request_id = %Uuid::new_v4());
        self.run_stages(request).instrument(span).await
    }

    async fn run_stages(&self, request: &PipelineRequest) -> std::result::Result<PipelineOutcome, PipelineFailure> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(PipelineError::Validation("nl_query must not be empty".to_string()).into());
        }
        info!("Pipeline run for '{}'", preview(question, 80));

        let snapshot = self.snapshot().await?;

        let TopicClassification {
            topic,
            rewritten_query,
        } = if request.classify {
            TopicClassifier::new(Arc::clone(&self.llm))
                .classify(&snapshot.templates.topic_prompt, question)
                .await?
        } else {
            TopicClassification {
                topic: Topic::None,
                rewritten_query: question.to_string(),
            }
        };

        let sparql_query = SparqlGenerator::new(Arc::clone(&self.llm))
            .generate(
                &snapshot.templates.sparql_prompt,
                &rewritten_query,
                &snapshot.ontology,
                &snapshot.config,
            )
            .await?;

        let final_statement = if request.compose {
            Some(QueryComposer::new(&snapshot.templates, &snapshot.config).compose(&sparql_query, &topic)?)
        } else {
            None
        };

        let result = match request.execute {
            None => None,
            Some(format) => {
                let executor = QueryExecutor::new(Arc::clone(&self.store));
                let executed = match &final_statement {
                    Some(statement) => executor
                        .execute_statement(statement, format)
                        .await
                        .map_err(|e| PipelineFailure::with_statement(e, statement.text.as_str())),
                    None => executor
                        .execute_raw(&sparql_query, format)
                        .await
                        .map_err(|e| PipelineFailure::with_statement(e, sparql_query.as_str())),
                };
                Some(executed?)
            }
        };

        debug!(
            "Pipeline run finished (topic={}, composed={}, executed={})",
            topic,
            final_statement.is_some(),
            result.is_some()
        );

        Ok(PipelineOutcome {
            topic,
            rewritten_query,
            sparql_query,
            final_statement,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryConfigStore, StoreError};
    use crate::llm::providers::base::{LlmMetadata, LlmProviderError};
    use crate::pipeline::models::tests::sample_config;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BINDINGS: &str = r#"{"head":{"vars":["x"]},"results":{"bindings":[]}}"#;

    #[derive(Default)]
    struct CountingStore {
        sparql_calls: AtomicUsize,
        statements: Mutex<Vec<String>>,
        reject_statements: bool,
    }

    #[async_trait]
    impl QueryStore for CountingStore {
        async fn sparql(&self, _: &str, format: ResultFormat) -> std::result::Result<String, StoreError> {
            self.sparql_calls.fetch_add(1, Ordering::SeqCst);
            Ok(match format {
                ResultFormat::Csv => "s,p,o\nex:a,ex:b,ex:c\n".to_string(),
                ResultFormat::Json => BINDINGS.to_string(),
            })
        }

        async fn statement(&self, statement: &str, _: ResultFormat) -> std::result::Result<String, StoreError> {
            self.statements.lock().push(statement.to_string());
            if self.reject_statements {
                return Err(StoreError::Rejected {
                    status: 500,
                    body: "invalid table name".to_string(),
                });
            }
            Ok(r#"{"columns":["NAME"],"rows":[["Acme"]]}"#.to_string())
        }

        fn endpoint(&self) -> &str {
            "counting://store"
        }
    }

    struct RoutingLlm;

    #[async_trait]
    impl LlmProvider for RoutingLlm {
        async fn generate(
            &self,
            _: &str,
            _: &str,
            response_format: Option<&str>,
        ) -> std::result::Result<(String, LlmMetadata), LlmProviderError> {
            let completion = match response_format {
                Some(_) => r#"{"topic": "Partners", "query": "partners in DE"}"#,
                None => "SELECT ?p WHERE { ?p a ex:Partner }",
            };
            Ok((completion.to_string(), LlmMetadata::default()))
        }

        fn provider_name(&self) -> &str {
            "routing"
        }

        fn model_name(&self) -> &str {
            "routing"
        }
    }

    fn pipeline(store: Arc<CountingStore>, mode: OntologyMode) -> Pipeline {
        Pipeline::new(
            store,
            Arc::new(RoutingLlm),
            Arc::new(MemoryConfigStore::new(sample_config())),
            mode,
        )
    }

    #[tokio::test]
    async fn test_cached_mode_loads_ontology_once() {
        let store = Arc::new(CountingStore::default());
        let pipeline = pipeline(store.clone(), OntologyMode::Cached);

        for _ in 0..3 {
            pipeline.run(&PipelineRequest::sparql_only("q")).await.unwrap();
        }
        assert_eq!(store.sparql_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_per_request_mode_reloads_every_time() {
        let store = Arc::new(CountingStore::default());
        let pipeline = pipeline(store.clone(), OntologyMode::PerRequest);

        pipeline.run(&PipelineRequest::sparql_only("q")).await.unwrap();
        pipeline.run(&PipelineRequest::sparql_only("q")).await.unwrap();
        assert_eq!(store.sparql_calls.load(Ordering::SeqCst), 6);
        assert!(pipeline.cached_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_full_run_composes_and_executes() {
        let store = Arc::new(CountingStore::default());
        let pipeline = pipeline(store.clone(), OntologyMode::Cached);

        let outcome = pipeline
            .run(&PipelineRequest::full("list all partners in Germany", ResultFormat::Json))
            .await
            .unwrap();

        assert_eq!(outcome.topic, Topic::Named("Partners".to_string()));
        assert_eq!(outcome.rewritten_query, "partners in DE");
        let statement = outcome.final_statement.unwrap();
        assert_eq!(statement.template, TemplateKind::OuterQuery);
        assert_eq!(store.statements.lock().as_slice(), [statement.text.clone()]);
        assert_eq!(outcome.result.unwrap().row_count(), 1);
    }

    #[tokio::test]
    async fn test_execution_failure_reports_statement() {
        let store = Arc::new(CountingStore {
            reject_statements: true,
            ..Default::default()
        });
        let pipeline = pipeline(store, OntologyMode::Cached);

        let failure = pipeline
            .run(&PipelineRequest::full("q", ResultFormat::Json))
            .await
            .unwrap_err();
        assert!(failure.to_string().contains("invalid table name"));
        assert!(failure.final_statement.unwrap().contains("SPARQL_TABLE"));
    }

    #[tokio::test]
    async fn test_blank_question_is_validation_error() {
        let pipeline = pipeline(Arc::new(CountingStore::default()), OntologyMode::Cached);
        let failure = pipeline.run(&PipelineRequest::sparql_only("   ")).await.unwrap_err();
        assert!(matches!(failure.error, PipelineError::Validation(_)));
        assert!(failure.final_statement.is_none());
    }

    #[tokio::test]
    async fn test_write_config_rejects_bad_template_without_saving() {
        let pipeline = pipeline(Arc::new(CountingStore::default()), OntologyMode::Cached);
        let mut config = sample_config();
        config.outer_query_template = "SELECT 1 FROM DUMMY".to_string();

        assert!(matches!(
            pipeline.write_config(&config).await,
            Err(PipelineError::TemplateMismatch { .. })
        ));
        assert_eq!(pipeline.read_config().await.unwrap(), sample_config());
    }

    #[tokio::test]
    async fn test_reload_picks_up_written_config() {
        let pipeline = pipeline(Arc::new(CountingStore::default()), OntologyMode::Cached);
        let first = pipeline.reload().await.unwrap();

        let mut config = sample_config();
        config.instructions = "Prefer rdfs:label.".to_string();
        pipeline.write_config(&config).await.unwrap();
        assert!(Arc::ptr_eq(&first, &pipeline.snapshot().await.unwrap()));

        let second = pipeline.reload().await.unwrap();
        assert_ne!(first.fingerprint, second.fingerprint);
        assert_eq!(second.config.instructions, "Prefer rdfs:label.");
    }

    #[tokio::test]
    async fn test_execute_raw_rejects_blank_query() {
        let pipeline = pipeline(Arc::new(CountingStore::default()), OntologyMode::Cached);
        assert!(matches!(
            pipeline.execute_raw(" \n", ResultFormat::Json).await,
            Err(PipelineError::Validation(_))
        ));
    }
}
