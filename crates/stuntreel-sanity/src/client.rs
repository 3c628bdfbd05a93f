//! HTTP client for the Sanity Content Lake API
//!
//! Implements the core's `ContentStore` and `AssetStore` seams over the
//! query, mutation, and asset-upload endpoints. Failure kinds are assigned
//! at the point of detection: 413 becomes `PayloadTooLarge`, an unparseable
//! body becomes `InvalidResponse`, and everything else carries whatever
//! detail the API supplied.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, error};

use stuntreel_core::error::GalleryError;
use stuntreel_core::model::{Gallery, NewGallery};
use stuntreel_core::store::{
    AssetStore, ContentStore, Patch, PatchOp, Result, StoredAsset,
};
use stuntreel_core::upload::MAX_UPLOAD_BYTES;

use crate::api::{extract_error_detail, AssetUploadResponse, MutateResponse, QueryResponse};
use crate::config::SanityConfig;
use crate::queries::{FIRST_GALLERY_QUERY, GALLERY_BY_ID_QUERY};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const BODY_SNIPPET_LEN: usize = 500;

pub struct SanityClient {
    config: SanityConfig,
    default_headers: HeaderMap,
    client: reqwest::Client,
}

impl SanityClient {
    pub fn new(config: SanityConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            headers.insert(
                AUTHORIZATION,
                format!("Bearer {}", token)
                    .parse()
                    .expect("Invalid API token format"),
            );
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            default_headers: headers,
            client,
        }
    }

    /// Readable messages for the common reqwest failure modes.
    fn format_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> String {
        if e.is_timeout() {
            format!(
                "Failed to {} for {}: timeout - request took too long",
                operation, url
            )
        } else if e.is_connect() {
            format!(
                "Failed to {} for {}: connection error - check network connectivity. Error: {}",
                operation, url, e
            )
        } else if e.is_decode() {
            format!(
                "Failed to {} for {}: decode error - unexpected response format. Error: {}",
                operation, url, e
            )
        } else {
            format!("Failed to {} for {}: {}", operation, url, e)
        }
    }

    fn require_token(&self) -> Result<()> {
        if self.config.token.is_none() {
            return Err(GalleryError::Config {
                message: "SANITY_API_TOKEN is not set; mutations require a write token"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Run a GROQ query, returning the `result` value (None when the query
    /// matched nothing). Failures come back as `StoreRead`.
    async fn query_value(
        &self,
        groq: &str,
        param: Option<(&str, String)>,
    ) -> Result<Option<Value>> {
        let url = format!(
            "{}/data/query/{}",
            self.config.query_base(),
            self.config.dataset
        );

        let mut request = self
            .client
            .get(&url)
            .headers(self.default_headers.clone())
            .query(&[("query", groq)]);
        if let Some((name, value)) = param {
            request = request.query(&[(name, value)]);
        }

        let response = request.send().await.map_err(|e| {
            let message = Self::format_reqwest_error(e, &url, "run query");
            error!("[SanityClient] Query failed: {}", message);
            GalleryError::StoreRead { message }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GalleryError::StoreRead {
            message: format!("Failed to read query response body: {}", e),
        })?;

        if !status.is_success() {
            let detail = extract_error_detail(&text).unwrap_or_else(|| snippet(&text));
            let message = format!("HTTP {} from query endpoint: {}", status.as_u16(), detail);
            error!("[SanityClient] {}", message);
            return Err(GalleryError::StoreRead { message });
        }

        let parsed: QueryResponse =
            serde_json::from_str(&text).map_err(|_| GalleryError::InvalidResponse {
                status: status.as_u16(),
                message: format!("Non-JSON query response: {}", snippet(&text)),
            })?;

        debug!(
            "[SanityClient] Query ok: result_present={}, server_ms={:?}",
            parsed.result.is_some(),
            parsed.server_ms
        );
        Ok(parsed.result.filter(|v| !v.is_null()))
    }

    /// Commit a list of mutations as one transaction. Failures come back as
    /// `StoreWrite` carrying the API's detail.
    async fn mutate(&self, mutations: Vec<Value>) -> Result<MutateResponse> {
        self.require_token()?;
        let url = format!(
            "{}/data/mutate/{}",
            self.config.write_base(),
            self.config.dataset
        );

        let body = json!({ "mutations": mutations });
        let response = self
            .client
            .post(&url)
            .headers(self.default_headers.clone())
            .query(&[("returnIds", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let message = Self::format_reqwest_error(e, &url, "commit mutations");
                error!("[SanityClient] Mutation failed: {}", message);
                GalleryError::StoreWrite { message }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GalleryError::StoreWrite {
            message: format!("Failed to read mutation response body: {}", e),
        })?;

        if !status.is_success() {
            let detail = extract_error_detail(&text).unwrap_or_else(|| snippet(&text));
            let message = format!("HTTP {} from mutate endpoint: {}", status.as_u16(), detail);
            error!("[SanityClient] {}", message);
            return Err(GalleryError::StoreWrite { message });
        }

        let parsed: MutateResponse =
            serde_json::from_str(&text).map_err(|_| GalleryError::InvalidResponse {
                status: status.as_u16(),
                message: format!("Non-JSON mutation response: {}", snippet(&text)),
            })?;

        debug!(
            "[SanityClient] Mutation committed: transaction={:?}, results={}",
            parsed.transaction_id,
            parsed.results.len()
        );
        Ok(parsed)
    }

    fn parse_gallery(value: Value) -> Result<Gallery> {
        serde_json::from_value(value).map_err(|e| GalleryError::StoreRead {
            message: format!("Failed to parse gallery document: {}", e),
        })
    }
}

/// Translate a core `Patch` into one Sanity patch mutation. The repository
/// emits at most one op of each kind per patch, so field maps never collide.
fn patch_to_mutation(patch: &Patch) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("id".to_string(), json!(patch.document_id));

    for op in &patch.ops {
        match op {
            PatchOp::SetIfMissing { field, value } => {
                insert_field(&mut body, "setIfMissing", field, value.clone());
            }
            PatchOp::AppendToArray { field, items } => {
                body.insert(
                    "insert".to_string(),
                    json!({
                        "after": format!("{}[-1]", field),
                        "items": items,
                    }),
                );
            }
            PatchOp::Unset { paths } => {
                body.insert("unset".to_string(), json!(paths));
            }
            PatchOp::Set { field, value } => {
                insert_field(&mut body, "set", field, value.clone());
            }
        }
    }

    json!({ "patch": Value::Object(body) })
}

fn insert_field(body: &mut serde_json::Map<String, Value>, op: &str, field: &str, value: Value) {
    let entry = body.entry(op.to_string()).or_insert_with(|| json!({}));
    if let Some(map) = entry.as_object_mut() {
        map.insert(field.to_string(), value);
    }
}

/// Classify a failed asset-upload response. A 413 is `PayloadTooLarge`
/// naming the file and its size whatever the body looks like; otherwise the
/// API's error detail wins, and a body that parses as nothing structured is
/// an `InvalidResponse` with the status code.
fn classify_upload_failure(status: u16, body: &str, filename: &str, size: u64) -> GalleryError {
    if status == 413 {
        return GalleryError::PayloadTooLarge {
            filename: filename.to_string(),
            size,
            limit: MAX_UPLOAD_BYTES,
        };
    }
    match extract_error_detail(body) {
        Some(detail) => GalleryError::StoreWrite {
            message: format!("HTTP {} from upload endpoint: {}", status, detail),
        },
        None => GalleryError::InvalidResponse {
            status,
            message: format!("Unparseable response uploading {}: {}", filename, snippet(body)),
        },
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() > BODY_SNIPPET_LEN {
        let cut: String = text.chars().take(BODY_SNIPPET_LEN).collect();
        format!("{}... (truncated)", cut)
    } else {
        text.to_string()
    }
}

#[async_trait]
impl ContentStore for SanityClient {
    async fn fetch_first_gallery(&self) -> Result<Option<Gallery>> {
        match self.query_value(FIRST_GALLERY_QUERY, None).await? {
            Some(value) => Ok(Some(Self::parse_gallery(value)?)),
            None => Ok(None),
        }
    }

    async fn fetch_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>> {
        let param = serde_json::to_string(gallery_id).map_err(|e| GalleryError::StoreRead {
            message: format!("Failed to encode gallery id: {}", e),
        })?;
        match self
            .query_value(GALLERY_BY_ID_QUERY, Some(("$galleryId", param)))
            .await?
        {
            Some(value) => Ok(Some(Self::parse_gallery(value)?)),
            None => Ok(None),
        }
    }

    async fn create_gallery(&self, gallery: &NewGallery) -> Result<String> {
        let doc = serde_json::to_value(gallery).map_err(|e| GalleryError::StoreWrite {
            message: format!("Failed to serialize gallery document: {}", e),
        })?;
        let response = self.mutate(vec![json!({ "create": doc })]).await?;
        response
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| GalleryError::StoreWrite {
                message: "Mutation response contained no created document id".to_string(),
            })
    }

    async fn apply_patch(&self, patch: Patch) -> Result<()> {
        self.mutate(vec![patch_to_mutation(&patch)]).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetStore for SanityClient {
    async fn upload_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredAsset> {
        self.require_token()?;
        let url = format!(
            "{}/assets/images/{}",
            self.config.write_base(),
            self.config.dataset
        );
        let size = bytes.len() as u64;

        debug!(
            "[SanityClient] Uploading {} ({} bytes, {})",
            filename, size, content_type
        );

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers.clone())
            .header(CONTENT_TYPE, content_type)
            .query(&[("filename", filename)])
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                let message = Self::format_reqwest_error(e, &url, "upload asset");
                error!("[SanityClient] Upload failed: {}", message);
                GalleryError::StoreWrite { message }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| GalleryError::StoreWrite {
            message: format!("Failed to read upload response body: {}", e),
        })?;

        if !(200..300).contains(&status) {
            let err = classify_upload_failure(status, &text, filename, size);
            error!("[SanityClient] Upload of {} rejected: {}", filename, err);
            return Err(err);
        }

        let parsed: AssetUploadResponse =
            serde_json::from_str(&text).map_err(|_| GalleryError::InvalidResponse {
                status,
                message: format!("Unparseable response uploading {}: {}", filename, snippet(&text)),
            })?;

        debug!(
            "[SanityClient] Uploaded {} as asset {}",
            filename, parsed.document.id
        );
        Ok(StoredAsset {
            asset_id: parsed.document.id,
            url: parsed.document.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stuntreel_core::model::Photo;

    #[test]
    fn test_append_patch_mutation_shape() {
        let photo = Photo::new("k1".to_string(), "image-abc", "alt text");
        let patch = Patch::new("g1")
            .set_if_missing("photos", json!([]))
            .append("photos", vec![serde_json::to_value(&photo).unwrap()]);

        let mutation = patch_to_mutation(&patch);
        assert_eq!(mutation["patch"]["id"], "g1");
        assert_eq!(mutation["patch"]["setIfMissing"]["photos"], json!([]));
        assert_eq!(mutation["patch"]["insert"]["after"], "photos[-1]");
        assert_eq!(
            mutation["patch"]["insert"]["items"][0]["asset"]["_ref"],
            "image-abc"
        );
    }

    #[test]
    fn test_unset_patch_mutation_shape() {
        let patch = Patch::new("g1").unset(vec!["photos[_key==\"k1\"]".to_string()]);
        let mutation = patch_to_mutation(&patch);
        assert_eq!(
            mutation["patch"]["unset"],
            json!(["photos[_key==\"k1\"]"])
        );
    }

    #[test]
    fn test_set_patch_mutation_shape() {
        let patch = Patch::new("g1").set("photos", json!([{"_key": "k2"}]));
        let mutation = patch_to_mutation(&patch);
        assert_eq!(mutation["patch"]["set"]["photos"][0]["_key"], "k2");
    }

    #[test]
    fn test_413_is_payload_too_large_regardless_of_body() {
        let err = classify_upload_failure(413, "<html>Request Entity Too Large</html>", "big.jpg", 9_000_000);
        match err {
            GalleryError::PayloadTooLarge { filename, size, limit } => {
                assert_eq!(filename, "big.jpg");
                assert_eq!(size, 9_000_000);
                assert_eq!(limit, MAX_UPLOAD_BYTES);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_detail_becomes_store_write() {
        let body = r#"{"error":{"description":"Insufficient permissions; permission \"create\" required"}}"#;
        let err = classify_upload_failure(403, body, "a.jpg", 100);
        assert!(matches!(err, GalleryError::StoreWrite { .. }));
        assert!(err.to_string().contains("Insufficient permissions"));
    }

    #[test]
    fn test_unparseable_error_body_is_invalid_response() {
        let err = classify_upload_failure(502, "Bad Gateway", "a.jpg", 100);
        match err {
            GalleryError::InvalidResponse { status, .. } => assert_eq!(status, 502),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(BODY_SNIPPET_LEN + 10);
        let out = snippet(&long);
        assert!(out.ends_with("... (truncated)"));
        assert!(snippet("short") == "short");
    }

    #[tokio::test]
    async fn test_mutation_without_token_is_a_config_error() {
        let client = SanityClient::new(SanityConfig::new("proj", "production"));
        let err = client
            .apply_patch(Patch::new("g1").set("photos", json!([])))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Config { .. }));
    }
}
