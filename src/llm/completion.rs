

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::core::error::{PipelineError, Result};
use crate::pipeline::models::{Topic, TopicClassification};

lazy_static! {
    static ref FENCED: Regex = Regex::new(r"(?s)^```(?:(?i:sparql|sql|json|rq|text)?[ \t]*\r?\n)?(.*?)\r?\n?```$").unwrap();
    static ref TICKED: Regex = Regex::new(r"^`([^`]+)`$").unwrap();
}


pub fn strip_fences(completion: &str) -> &str {
    let trimmed = completion.trim();
    if let Some(inner) = FENCED.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    if let Some(inner) = TICKED.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    trimmed
}


pub fn extract_json(completion: &str) -> Result<Value> {
    let body = strip_fences(completion);
    if body.is_empty() {
        return Err(PipelineError::malformed("empty completion", completion));
    }
    serde_json::from_str(body)
        .map_err(|e| PipelineError::malformed(format!("not valid JSON: {e}"), completion))
}


pub fn extract_topic(completion: &str) -> Result<TopicClassification> {
    let value = extract_json(completion)?;
    let Value::Object(object) = value else {
        return Err(PipelineError::malformed("expected a JSON object", completion));
    };

    if let Some(extra) = object.keys().find(|k| *k != "topic" && *k != "query") {
        return Err(PipelineError::malformed(format!("unexpected key '{extra}'"), completion));
    }

    let topic = match object.get("topic") {
        Some(Value::String(label)) => Topic::from_label(Some(label)),
        Some(Value::Null) => Topic::None,
        Some(_) => return Err(PipelineError::malformed("'topic' must be a string", completion)),
        None => return Err(PipelineError::malformed("missing key 'topic'", completion)),
    };

    let rewritten_query = match object.get("query") {
        Some(Value::String(q)) if !q.trim().is_empty() => q.trim().to_string(),
        Some(Value::String(_)) => {
            return Err(PipelineError::malformed("'query' is empty", completion));
        }
        Some(_) => return Err(PipelineError::malformed("'query' must be a string", completion)),
        None => return Err(PipelineError::malformed("missing key 'query'", completion)),
    };

    Ok(TopicClassification {
        topic,
        rewritten_query,
    })
}


pub fn extract_query_text(completion: &str) -> Result<String> {
    let body = strip_fences(completion);
    if body.is_empty() {
        return Err(PipelineError::malformed("completion contains no query", completion));
    }
    Ok(body.to_string())
}
