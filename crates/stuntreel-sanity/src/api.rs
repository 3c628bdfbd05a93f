//! Wire structures for the Sanity HTTP API

use serde::Deserialize;
use serde_json::Value;

/// Envelope returned by the query endpoint.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(rename = "ms", default)]
    pub server_ms: Option<u64>,
}

/// Envelope returned by the mutation endpoint (with `returnIds=true`).
#[derive(Debug, Deserialize)]
pub struct MutateResponse {
    #[serde(rename = "transactionId", default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
pub struct MutateResult {
    pub id: String,
    #[serde(default)]
    pub operation: Option<String>,
}

/// Envelope returned by the image-asset upload endpoint.
#[derive(Debug, Deserialize)]
pub struct AssetUploadResponse {
    pub document: AssetDocument,
}

#[derive(Debug, Deserialize)]
pub struct AssetDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub url: String,
}

/// Best-effort extraction of the human-readable error detail from an API
/// error body. The API answers either `{"error": {"description": ...}}` or
/// `{"error": ..., "message": ...}` depending on the failing layer.
pub fn extract_error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if let Some(error) = value.get("error") {
        if let Some(description) = error.get("description").and_then(Value::as_str) {
            return Some(description.to_string());
        }
        if let Some(text) = error.as_str() {
            return Some(text.to_string());
        }
    }
    value
        .get("message")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}
