//! Admin HTTP surface
//!
//! Upload, gallery read, delete, reorder, and the revalidation webhook.
//! Handlers delegate to the core repository and orchestrator; the only
//! server-side additions are multipart decoding, the read cache, and the
//! error-to-status mapping.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use secstr::SecStr;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stuntreel_core::error::GalleryError;
use stuntreel_core::model::Gallery;
use stuntreel_core::repository::GalleryRepository;
use stuntreel_core::upload::{FilePayload, UploadOrchestrator, MAX_UPLOAD_BYTES};

use crate::cache::GalleryCache;

/// Request-body ceiling for the upload route: the per-file cap plus room for
/// multipart framing and the alt field. Axum's default (2 MB) is below the
/// cap and would reject valid files during extraction. Files between the cap
/// and this ceiling still reach validation, which names the file in its
/// rejection.
const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES as usize + 1024 * 1024;

pub struct AppState {
    pub repository: GalleryRepository,
    pub uploader: UploadOrchestrator,
    pub cache: GalleryCache,
    pub revalidate_secret: Option<SecStr>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
        .route("/gallery", get(get_gallery))
        .route("/gallery/delete", delete(delete_photo))
        .route("/gallery/reorder", post(reorder))
        .route("/revalidate", post(revalidate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Newtype so domain errors can carry an HTTP status. `?` lifts
/// `GalleryError` into it in every handler.
#[derive(Debug)]
pub struct ApiError(pub GalleryError);

impl From<GalleryError> for ApiError {
    fn from(err: GalleryError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &GalleryError) -> StatusCode {
    match err {
        GalleryError::Validation { .. } => StatusCode::BAD_REQUEST,
        GalleryError::GalleryNotFound { .. } | GalleryError::PhotoNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        GalleryError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({
            "error": self.0.summary(),
            "details": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Decode the `file` and `alt` parts of the upload form. No `file` part is
/// a validation failure, matching the rejection for a non-image one.
async fn read_upload_form(mut multipart: Multipart) -> Result<FilePayload, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut alt: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| file_error(&filename, e))?
                    .to_vec();
                file = Some((filename, content_type, bytes));
            }
            Some("alt") => {
                alt = Some(field.text().await.map_err(form_error)?);
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) = file.ok_or_else(|| {
        ApiError(GalleryError::Validation {
            message: "No file provided".to_string(),
        })
    })?;

    Ok(FilePayload {
        filename,
        content_type,
        alt,
        bytes,
    })
}

fn form_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return oversize_error("upload");
    }
    ApiError(GalleryError::Validation {
        message: format!("Malformed upload form: {}", err),
    })
}

/// A body-limit trip while reading the file part is an oversize rejection,
/// not a malformed form. The exact size is unknown once the stream is cut
/// off; the transport ceiling stands in as the lower bound.
fn file_error(filename: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return oversize_error(filename);
    }
    form_error(err)
}

fn oversize_error(filename: &str) -> ApiError {
    ApiError(GalleryError::PayloadTooLarge {
        filename: filename.to_string(),
        size: BODY_LIMIT_BYTES as u64,
        limit: MAX_UPLOAD_BYTES,
    })
}

async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let payload = read_upload_form(multipart).await?;
    process_upload(&state, payload).await
}

async fn process_upload(state: &AppState, file: FilePayload) -> Result<Json<Value>, ApiError> {
    let filename = file.filename.clone();
    let uploaded = state.uploader.upload_one(file).await?;
    state.cache.invalidate();
    info!(
        "[Routes] Uploaded {} as asset {}",
        filename, uploaded.asset.asset_id
    );
    Ok(Json(json!({
        "success": true,
        "url": uploaded.asset.url,
        "assetId": uploaded.asset.asset_id,
    })))
}

/// Always 200: the repository degrades to an empty projection when the
/// store has no gallery or is unreachable.
async fn get_gallery(State(state): State<Arc<AppState>>) -> Json<Gallery> {
    if let Some(gallery) = state.cache.get() {
        return Json(gallery);
    }
    let gallery = state.repository.fetch_gallery().await;
    state.cache.put(gallery.clone());
    Json(gallery)
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    key: Option<String>,
    #[serde(rename = "galleryId")]
    gallery_id: Option<String>,
}

async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ApiError> {
    let key = params
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| GalleryError::Validation {
            message: "Missing key parameter".to_string(),
        })?;
    let gallery_id = params
        .gallery_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GalleryError::Validation {
            message: "Missing galleryId parameter".to_string(),
        })?;

    state.repository.remove_photo(&gallery_id, &key).await?;
    state.cache.invalidate();
    info!("[Routes] Deleted photo {} from gallery {}", key, gallery_id);
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    #[serde(rename = "galleryId")]
    gallery_id: Option<String>,
    #[serde(rename = "photoKeys")]
    photo_keys: Option<Vec<String>>,
}

async fn reorder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    let gallery_id = request
        .gallery_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GalleryError::Validation {
            message: "Missing galleryId".to_string(),
        })?;
    let photo_keys = request
        .photo_keys
        .filter(|keys| !keys.is_empty())
        .ok_or_else(|| GalleryError::Validation {
            message: "photoKeys must be a non-empty array".to_string(),
        })?;

    state
        .repository
        .reorder_photos(&gallery_id, &photo_keys)
        .await?;
    state.cache.invalidate();
    info!(
        "[Routes] Reordered gallery {} ({} keys)",
        gallery_id,
        photo_keys.len()
    );
    Ok(Json(json!({ "success": true })))
}

/// Constant-time check of the `Authorization: Bearer <secret>` header.
fn authorized(secret: &SecStr, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| *secret == SecStr::from(token))
        .unwrap_or(false)
}

async fn revalidate(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(secret) = &state.revalidate_secret else {
        return ApiError(GalleryError::Config {
            message: "REVALIDATE_SECRET is not set".to_string(),
        })
        .into_response();
    };

    if !authorized(secret, &headers) {
        warn!("[Routes] Revalidation request with a missing or invalid secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid secret" })),
        )
            .into_response();
    }

    state.cache.invalidate();
    info!("[Routes] Revalidated gallery cache");
    (
        StatusCode::OK,
        Json(json!({
            "revalidated": true,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use stuntreel_core::fake::{FakeAssetStore, FakeContentStore};

    fn test_state(content: FakeContentStore, assets: FakeAssetStore) -> Arc<AppState> {
        let content = Arc::new(content);
        let assets = Arc::new(assets);
        let repository = GalleryRepository::new(content);
        let uploader = UploadOrchestrator::new(assets, repository.clone());
        Arc::new(AppState {
            repository,
            uploader,
            cache: GalleryCache::new(Duration::from_secs(10)),
            revalidate_secret: Some(SecStr::from("hunter2")),
        })
    }

    fn jpeg(filename: &str) -> FilePayload {
        FilePayload {
            filename: filename.to_string(),
            content_type: "image/jpeg".to_string(),
            alt: None,
            bytes: vec![0u8; 64],
        }
    }

    fn multipart_upload_request(filename: &str, bytes: usize) -> axum::http::Request<axum::body::Body> {
        let boundary = "grid-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                boundary, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(&vec![0u8; bytes]);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(axum::body::Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_route_accepts_a_file_between_2_mb_and_the_cap() {
        use tower::ServiceExt;

        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let app = router(state);
        let response = app
            .oneshot(multipart_upload_request("long-burn.jpg", 3 * 1024 * 1024))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_route_rejects_a_body_over_the_ceiling_with_413() {
        use tower::ServiceExt;

        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let app = router(state);
        let response = app
            .oneshot(multipart_upload_request("marathon.jpg", 6 * 1024 * 1024))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_upload_route_rejects_over_cap_under_ceiling_with_413() {
        use tower::ServiceExt;

        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let app = router(state);
        let size = MAX_UPLOAD_BYTES as usize + 100;
        let response = app
            .oneshot(multipart_upload_request("high-fall.jpg", size))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_upload_returns_asset_id_and_url() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let Json(body) = process_upload(&state, jpeg("wall-run.jpg")).await.unwrap();
        assert_eq!(body["success"], true);
        assert!(body["assetId"].as_str().unwrap().starts_with("image-"));
        assert!(body["url"].as_str().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn test_upload_invalidates_the_read_cache() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        state.cache.put(Gallery::empty());
        process_upload(&state, jpeg("fire-gag.jpg")).await.unwrap();
        assert!(state.cache.get().is_none());
    }

    #[tokio::test]
    async fn test_non_image_upload_is_a_400() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let mut payload = jpeg("notes.pdf");
        payload.content_type = "application/pdf".to_string();
        let err = process_upload(&state, payload).await.unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_a_413_naming_the_file() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let mut payload = jpeg("high-fall.jpg");
        payload.bytes = vec![0u8; (stuntreel_core::upload::MAX_UPLOAD_BYTES + 1) as usize];
        let err = process_upload(&state, payload).await.unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.0.to_string().contains("high-fall.jpg"));
    }

    #[tokio::test]
    async fn test_gallery_read_populates_and_serves_the_cache() {
        let content = FakeContentStore::new();
        let state = test_state(content, FakeAssetStore::new());
        process_upload(&state, jpeg("ratchet-pull.jpg")).await.unwrap();

        let Json(first) = get_gallery(State(state.clone())).await;
        assert_eq!(first.photos.len(), 1);
        // Second read must come from the cache slot.
        assert!(state.cache.get().is_some());
        let Json(second) = get_gallery(State(state.clone())).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_gallery_read_degrades_to_empty_on_store_failure() {
        let content = FakeContentStore::new();
        content.fail_reads("store offline");
        let state = test_state(content, FakeAssetStore::new());
        let Json(gallery) = get_gallery(State(state.clone())).await;
        assert!(gallery.photos.is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_both_params() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let err = delete_photo(
            State(state.clone()),
            Query(DeleteParams {
                key: Some("k1".to_string()),
                gallery_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_missing_gallery_is_a_404() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let err = delete_photo(
            State(state.clone()),
            Query(DeleteParams {
                key: Some("k1".to_string()),
                gallery_id: Some("nope".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_rejects_empty_key_list() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let err = reorder(
            State(state.clone()),
            Json(ReorderRequest {
                gallery_id: Some("g1".to_string()),
                photo_keys: Some(Vec::new()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_revalidate_with_the_right_secret() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        state.cache.put(Gallery::empty());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer hunter2".parse().unwrap());
        let response = revalidate(State(state.clone()), headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.cache.get().is_none());
    }

    #[tokio::test]
    async fn test_revalidate_rejects_a_wrong_or_missing_secret() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        let response = revalidate(State(state.clone()), headers).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = revalidate(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_revalidate_without_configured_secret_is_a_500() {
        let state = test_state(FakeContentStore::new(), FakeAssetStore::new());
        let state = Arc::new(AppState {
            repository: state.repository.clone(),
            uploader: state.uploader.clone(),
            cache: GalleryCache::new(Duration::from_secs(10)),
            revalidate_secret: None,
        });
        let response = revalidate(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
