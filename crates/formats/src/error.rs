use thiserror::Error;

use crate::wkt::WktError;

/// Request-level failure: the input as a whole could not be read.
///
/// Individual features that fail are not errors at this level; they are
/// dropped with a diagnostic further down the pipeline.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a FeatureCollection or GeometryCollection, found {found}")]
    NotGeoJson { found: String },
    #[error("expected GeoJSON, a site-record array or a WKT string, found {found}")]
    Unrecognized { found: String },
    #[error("bare WKT request is unreadable: {0}")]
    Wkt(#[from] WktError),
}

pub(crate) fn describe_json(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(obj) => match obj.get("type").and_then(|t| t.as_str()) {
            Some(ty) => format!("an object of type {ty:?}"),
            None => "an object without a type".to_string(),
        },
    }
}
