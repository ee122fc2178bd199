

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::core::config::{AppConfig, OntologyMode};
use crate::db::{FileConfigStore, HttpQueryStore};
use crate::llm::LlmProviderFactory;
use crate::pipeline::Pipeline;


pub fn build_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/execute_query_raw", post(handlers::execute_query_raw))
        .route(
            "/execute_sparql_query",
            get(handlers::execute_sparql_query).post(handlers::execute_sparql_query),
        )
        .route("/translate_nl_to_sparql", post(handlers::translate_nl_to_sparql))
        .route("/translate_nl_to_new", post(handlers::translate_nl_to_new))
        .route("/config", get(handlers::get_config).post(handlers::post_config))
        .route("/load_config", post(handlers::load_config))
        .layer(Extension(pipeline))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let store = HttpQueryStore::from_config(config)?;
    let llm = LlmProviderFactory::from_config(config)?;
    let config_store = FileConfigStore::new(&config.pipeline_config_path);
    Ok(Pipeline::new(
        Arc::new(store),
        llm,
        Arc::new(config_store),
        config.ontology_mode,
    ))
}

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("🚀 Initializing SPARQL bridge...");

    let pipeline = Arc::new(build_pipeline(&config)?);

    if pipeline.mode() == OntologyMode::Cached {
        match pipeline.reload().await {
            Ok(snapshot) => info!("✅ Ontology context warmed (loaded_at={})", snapshot.loaded_at),
            Err(e) => warn!("⚠️ Ontology warm-up failed, will retry on first request: {}", e),
        }
    }

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("✅ SPARQL bridge ready");
    info!("   📍 Listening: {}", listener.local_addr()?);
    info!("   🗄️ Store: {}", config.store_sparql_url);
    info!("   🤖 LLM: {}/{}", config.llm_provider, config.llm_model);
    info!("   📊 Ontology mode: {}", config.ontology_mode);

    axum::serve(listener, build_router(pipeline)).await?;
    Ok(())
}
