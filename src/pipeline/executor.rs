

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::{info, warn};

use super::models::FinalStatement;
use crate::core::error::{PipelineError, Result};
use crate::db::{QueryStore, ResultFormat};
use crate::utils::{preview, single_line};

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

const XSD_INTEGERS: &[&str] = &[
    "integer",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "negativeInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

const XSD_DECIMALS: &[&str] = &["decimal", "double", "float"];


#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows {
        columns: Vec<String>,
        rows: Vec<Map<String, Value>>,
    },
    Boolean {
        boolean: bool,
    },
    Csv(String),
}

impl QueryResult {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv(_) => "text/csv; charset=utf-8",
            _ => "application/json",
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows { rows, .. } => rows.len(),
            Self::Boolean { .. } => 1,
            Self::Csv(body) => body.lines().count().saturating_sub(1),
        }
    }
}


pub struct QueryExecutor {
    store: Arc<dyn QueryStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    pub async fn execute_raw(&self, query: &str, format: ResultFormat) -> Result<QueryResult> {
        info!("Executing raw query: {}", preview(&single_line(query), 120));
        let body = self.store.sparql(query, format).await.map_err(|e| {
            warn!("Raw query failed: {}", e);
            PipelineError::from(e)
        })?;
        let result = normalize(&body, format)?;
        info!("Raw query returned {} row(s)", result.row_count());
        Ok(result)
    }

    pub async fn execute_statement(&self, statement: &FinalStatement, format: ResultFormat) -> Result<QueryResult> {
        info!("Executing statement built from {}", statement.template);
        let body = self.store.statement(&statement.text, format).await.map_err(|e| {
            warn!("Statement failed: {}", e);
            PipelineError::from(e)
        })?;
        let result = normalize(&body, format)?;
        info!("Statement returned {} row(s)", result.row_count());
        Ok(result)
    }
}


pub fn normalize(body: &str, format: ResultFormat) -> Result<QueryResult> {
    match format {
        ResultFormat::Csv => Ok(QueryResult::Csv(body.to_string())),
        ResultFormat::Json => {
            let value: Value = serde_json::from_str(body).map_err(|e| {
                PipelineError::UpstreamQuery(format!(
                    "store returned invalid JSON ({e}): {}",
                    preview(body.trim(), 200)
                ))
            })?;
            normalize_json(value)
        }
    }
}

fn normalize_json(value: Value) -> Result<QueryResult> {
    if let Some(boolean) = value.get("boolean").and_then(Value::as_bool) {
        return Ok(QueryResult::Boolean { boolean });
    }
    if value.get("head").is_some() {
        return normalize_sparql(&value);
    }
    if value.get("columns").is_some() && value.get("rows").is_some() {
        return normalize_tabular(&value);
    }
    Err(unexpected_shape("result has neither SPARQL nor tabular shape"))
}

fn normalize_sparql(value: &Value) -> Result<QueryResult> {
    let columns = string_list(value.pointer("/head/vars"), "head.vars")?;
    let bindings = value
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected_shape("results.bindings is missing"))?;

    let rows: Vec<Map<String, Value>> = bindings
        .iter()
        .map(|binding| {
            columns
                .iter()
                .map(|column| {
                    let cell = binding.get(column).map_or(Value::Null, term_value);
                    (column.clone(), cell)
                })
                .collect::<Map<String, Value>>()
        })
        .collect();

    Ok(QueryResult::Rows { columns, rows })
}

fn normalize_tabular(value: &Value) -> Result<QueryResult> {
    let columns = string_list(value.get("columns"), "columns")?;
    let raw_rows = value
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected_shape("rows is not an array"))?;

    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(raw_rows.len());
    for (index, raw) in raw_rows.iter().enumerate() {
        let cells = raw
            .as_array()
            .filter(|cells| cells.len() == columns.len())
            .ok_or_else(|| unexpected_shape(format!("row {index} does not match the column list")))?;
        rows.push(columns.iter().cloned().zip(cells.iter().cloned()).collect());
    }

    Ok(QueryResult::Rows { columns, rows })
}

fn string_list(value: Option<&Value>, what: &str) -> Result<Vec<String>> {
    value
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| unexpected_shape(format!("{what} is not a list of names")))
}

/// Typed xsd literals become JSON numbers and booleans; everything else is its lexical value.
fn term_value(term: &Value) -> Value {
    let Some(lexical) = term.get("value").and_then(Value::as_str) else {
        return Value::Null;
    };
    let datatype = term
        .get("datatype")
        .and_then(Value::as_str)
        .and_then(|dt| dt.strip_prefix(XSD));

    match datatype {
        Some("boolean") => match lexical.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(lexical.to_string()),
        },
        Some(dt) if XSD_INTEGERS.contains(&dt) => lexical
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(lexical.to_string())),
        Some(dt) if XSD_DECIMALS.contains(&dt) => lexical
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(lexical.to_string())),
        _ => Value::String(lexical.to_string()),
    }
}

fn unexpected_shape(detail: impl Into<String>) -> PipelineError {
    PipelineError::UpstreamQuery(format!("unexpected result shape: {}", detail.into()))
}
