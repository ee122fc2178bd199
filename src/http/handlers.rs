

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Extension, Query};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use crate::db::ResultFormat;
use crate::pipeline::{Pipeline, PipelineConfig, PipelineRequest, QueryResult, Topic};
use crate::utils::is_blank;

type Params = Query<HashMap<String, String>>;

pub const LIVENESS_TEXT: &str = "sparql-bridge is running";


#[derive(Debug, Deserialize)]
struct NlQueryBody {
    nl_query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SparqlResponse {
    pub sparql_query: String,
}

#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub result: QueryResult,
    pub final_query: String,
    pub sparql_query: String,
    pub topic: Topic,
}

fn format_param(params: &HashMap<String, String>) -> Result<ResultFormat, ApiError> {
    match params.get("format").map(|f| f.trim()) {
        None | Some("") => Ok(ResultFormat::default()),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::validation(format!("unsupported format '{raw}', expected json or csv"))),
    }
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("invalid JSON body: {e}")))
}

fn body_text(body: &Bytes) -> Result<String, ApiError> {
    String::from_utf8(body.to_vec()).map_err(|_| ApiError::validation("request body is not valid UTF-8"))
}

fn nl_query(body: &Bytes) -> Result<String, ApiError> {
    let NlQueryBody { nl_query } = parse_json(body)?;
    match nl_query {
        Some(q) if !is_blank(&q) => Ok(q),
        _ => Err(ApiError::validation("nl_query is required")),
    }
}

fn result_response(result: QueryResult) -> Response {
    let content_type = result.content_type();
    match result {
        QueryResult::Csv(body) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        other => Json(other).into_response(),
    }
}


pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

pub async fn execute_query_raw(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Query(params): Params,
    body: Bytes,
) -> Result<Response, ApiError> {
    let format = format_param(&params)?;
    let query = body_text(&body)?;
    if is_blank(&query) {
        return Err(ApiError::validation("request body must contain a query"));
    }
    let result = pipeline.execute_raw(&query, format).await?;
    Ok(result_response(result))
}

/// `query` comes from the query string; a POST without it may carry the query as its body.
pub async fn execute_sparql_query(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Query(params): Params,
    body: Bytes,
) -> Result<Response, ApiError> {
    let format = format_param(&params)?;
    let query = match params.get("query") {
        Some(q) => q.clone(),
        None => body_text(&body)?,
    };
    if is_blank(&query) {
        return Err(ApiError::validation("query parameter is required"));
    }
    let result = pipeline.execute_raw(&query, format).await?;
    Ok(result_response(result))
}

pub async fn translate_nl_to_sparql(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    body: Bytes,
) -> Result<Json<SparqlResponse>, ApiError> {
    let question = nl_query(&body)?;
    let outcome = pipeline.run(&PipelineRequest::sparql_only(question)).await?;
    Ok(Json(SparqlResponse {
        sparql_query: outcome.sparql_query,
    }))
}

pub async fn translate_nl_to_new(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Query(params): Params,
    body: Bytes,
) -> Result<Json<PipelineResponse>, ApiError> {
    let format = format_param(&params)?;
    let question = nl_query(&body)?;
    let outcome = pipeline.run(&PipelineRequest::full(question, format)).await?;

    let final_query = outcome
        .final_statement
        .map(|s| s.text)
        .unwrap_or_else(|| outcome.sparql_query.clone());
    let result = outcome
        .result
        .ok_or_else(|| ApiError::validation("pipeline finished without executing"))?;

    Ok(Json(PipelineResponse {
        result,
        final_query,
        sparql_query: outcome.sparql_query,
        topic: outcome.topic,
    }))
}

pub async fn get_config(Extension(pipeline): Extension<Arc<Pipeline>>) -> Result<Json<PipelineConfig>, ApiError> {
    Ok(Json(pipeline.read_config().await?))
}

pub async fn post_config(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let config: PipelineConfig = parse_json(&body)?;
    pipeline.write_config(&config).await?;
    Ok(Json(json!({"status": "saved"})))
}

pub async fn load_config(Extension(pipeline): Extension<Arc<Pipeline>>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = pipeline.reload().await?;
    Ok(Json(json!({
        "status": "loaded",
        "fingerprint": snapshot.fingerprint,
        "loaded_at": snapshot.loaded_at.to_rfc3339(),
    })))
}
