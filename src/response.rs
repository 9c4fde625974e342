//! Structured answers from the text-generation service.
//!
//! The service is asked to reply with `{"caption": "...", "steps": [...]}`.
//! Replies are not always strict JSON, so parsing goes through `json5`
//! and field names are matched case-insensitively.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmData {
    pub caption: String,
    pub steps: Vec<String>,
}

/// Anything that can turn a user request into caption + steps.
pub trait AlgorithmSource {
    fn fetch(&self, request: &str) -> Result<AlgorithmData>;
}

/// Reads a previously saved answer from disk, ignoring the request text.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlgorithmSource for JsonFileSource {
    fn fetch(&self, _request: &str) -> Result<AlgorithmData> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_algorithm_response(&text)
    }
}

pub fn parse_algorithm_response(text: &str) -> Result<AlgorithmData> {
    let body = strip_code_fence(text.trim());
    let value: Value = json5::from_str(body).map_err(|err| Error::Response(err.to_string()))?;
    let Value::Object(object) = value else {
        return Err(Error::Response("expected a JSON object".to_string()));
    };

    let caption = match field(&object, "caption") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(caption)) => caption.clone(),
        Some(other) => return Err(Error::Response(format!("caption must be a string, got {other}"))),
    };
    let steps = match field(&object, "steps") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(step) => Ok(step.clone()),
                other => Err(Error::Response(format!("step must be a string, got {other}"))),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => return Err(Error::Response(format!("steps must be a list, got {other}"))),
    };

    Ok(AlgorithmData { caption, steps })
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Models like to wrap JSON in a ```json fence; keep only what is inside.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
