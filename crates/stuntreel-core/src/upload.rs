//! Upload orchestrator
//!
//! Converts a batch of client-selected files into a sequence of individual
//! upload + append operations, aggregates per-file outcomes, and refetches
//! the gallery read model on completion.
//!
//! This is a best-effort batch pipeline, not an atomic transaction: the
//! store offers no multi-document transaction primitive to this client, so
//! a mid-batch failure leaves earlier files persisted and aborts the rest.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::GalleryError;
use crate::model::{Gallery, Photo};
use crate::repository::GalleryRepository;
use crate::store::{AssetStore, StoredAsset};

/// Hard cap per file, set below the hosting platform's request-body ceiling
/// so oversized files are rejected before the transport can 413 them.
pub const MAX_UPLOAD_BYTES: u64 = 4 * 1024 * 1024;

/// One client-selected file: name, MIME type, bytes, and an optional
/// caller-supplied alt text.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub filename: String,
    pub content_type: String,
    pub alt: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Supplied alt text, or the filename with its extension stripped.
    pub fn alt_text(&self) -> String {
        if let Some(alt) = &self.alt {
            if !alt.trim().is_empty() {
                return alt.clone();
            }
        }
        derive_alt(&self.filename)
    }

    fn validate(&self) -> Result<(), GalleryError> {
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(GalleryError::PayloadTooLarge {
                filename: self.filename.clone(),
                size: self.size(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        if !self.content_type.starts_with("image/") {
            return Err(GalleryError::Validation {
                message: format!(
                    "{} is not an image (content type {})",
                    self.filename, self.content_type
                ),
            });
        }
        Ok(())
    }
}

/// Strip the final extension from a filename; a leading-dot-only name keeps
/// its full form.
fn derive_alt(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// A file excluded from the batch during pre-upload validation.
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub filename: String,
    pub error: GalleryError,
}

/// One fully persisted upload: the stored asset plus the appended entry.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub asset: StoredAsset,
    pub photo: Photo,
}

/// Outcome of a batch that ran to completion: everything uploaded in
/// submission order, the validation rejects, and the refetched read model.
#[derive(Debug)]
pub struct BatchOutcome {
    pub uploaded: Vec<UploadedPhoto>,
    pub rejected: Vec<RejectedFile>,
    pub gallery: Gallery,
}

/// A batch aborted mid-flight. Files uploaded before the failing one remain
/// persisted (no compensating rollback); files after it were never attempted.
#[derive(Debug, thiserror::Error)]
#[error("Upload of {filename} failed: {error}")]
pub struct BatchFailure {
    /// The file whose upload or append raised.
    pub filename: String,
    pub error: GalleryError,
    /// Persisted before the abort, in submission order.
    pub uploaded: Vec<UploadedPhoto>,
    pub rejected: Vec<RejectedFile>,
}

/// Partition a batch into uploadable files and validation rejects.
///
/// Invalid files never reach the upload step; valid files proceed
/// regardless of invalid siblings in the same batch.
pub fn validate_batch(files: Vec<FilePayload>) -> (Vec<FilePayload>, Vec<RejectedFile>) {
    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for file in files {
        match file.validate() {
            Ok(()) => valid.push(file),
            Err(error) => {
                debug!(
                    "[UploadOrchestrator] Rejected {} before upload: {}",
                    file.filename, error
                );
                rejected.push(RejectedFile {
                    filename: file.filename,
                    error,
                });
            }
        }
    }
    (valid, rejected)
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    assets: Arc<dyn AssetStore>,
    repository: GalleryRepository,
}

impl UploadOrchestrator {
    pub fn new(assets: Arc<dyn AssetStore>, repository: GalleryRepository) -> Self {
        Self { assets, repository }
    }

    /// Validate, upload, and append a single file.
    pub async fn upload_one(&self, file: FilePayload) -> Result<UploadedPhoto, GalleryError> {
        file.validate()?;
        let alt = file.alt_text();
        let asset = self
            .assets
            .upload_image(&file.filename, &file.content_type, file.bytes)
            .await?;
        let photo = self.repository.append_photo(&asset.asset_id, &alt).await?;
        debug!(
            "[UploadOrchestrator] Uploaded {} as asset {}",
            file.filename, asset.asset_id
        );
        Ok(UploadedPhoto { asset, photo })
    }

    /// Run a batch strictly sequentially: file N+1 never starts before file
    /// N's append completes. This keeps photos in submission order and
    /// avoids concurrent appends racing against the same gallery document.
    ///
    /// The first store error aborts the remaining batch rather than
    /// continuing, so a systemic failure (an expired credential, say) shows
    /// up once instead of hiding behind many per-file failures.
    pub async fn upload_batch(
        &self,
        files: Vec<FilePayload>,
    ) -> Result<BatchOutcome, BatchFailure> {
        let (valid, rejected) = validate_batch(files);
        let mut uploaded = Vec::with_capacity(valid.len());

        for file in valid {
            let filename = file.filename.clone();
            match self.upload_one(file).await {
                Ok(result) => uploaded.push(result),
                Err(error) => {
                    error!(
                        "[UploadOrchestrator] Batch aborted at {}: {}",
                        filename, error
                    );
                    return Err(BatchFailure {
                        filename,
                        error,
                        uploaded,
                        rejected,
                    });
                }
            }
        }

        info!(
            "[UploadOrchestrator] Batch complete: {} uploaded, {} rejected",
            uploaded.len(),
            rejected.len()
        );
        let gallery = self.repository.fetch_gallery().await;
        Ok(BatchOutcome {
            uploaded,
            rejected,
            gallery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeAssetStore, FakeContentStore};
    use crate::store::ContentStore;

    fn image(filename: &str, bytes: usize) -> FilePayload {
        FilePayload {
            filename: filename.to_string(),
            content_type: "image/jpeg".to_string(),
            alt: None,
            bytes: vec![0u8; bytes],
        }
    }

    fn orchestrator() -> (Arc<FakeContentStore>, Arc<FakeAssetStore>, UploadOrchestrator) {
        let content = Arc::new(FakeContentStore::new());
        let assets = Arc::new(FakeAssetStore::new());
        let repo = GalleryRepository::new(Arc::clone(&content) as Arc<dyn ContentStore>);
        let orchestrator =
            UploadOrchestrator::new(Arc::clone(&assets) as Arc<dyn AssetStore>, repo);
        (content, assets, orchestrator)
    }

    #[test]
    fn test_alt_derived_from_filename() {
        assert_eq!(derive_alt("rooftop-fall.jpg"), "rooftop-fall");
        assert_eq!(derive_alt("archive.tar.gz"), "archive.tar");
        assert_eq!(derive_alt("no-extension"), "no-extension");
        assert_eq!(derive_alt(".hidden"), ".hidden");
    }

    #[test]
    fn test_supplied_alt_wins_over_derived() {
        let mut file = image("fall.jpg", 10);
        file.alt = Some("High fall, episode 3".to_string());
        assert_eq!(file.alt_text(), "High fall, episode 3");

        file.alt = Some("   ".to_string());
        assert_eq!(file.alt_text(), "fall");
    }

    #[test]
    fn test_validation_partitions_mixed_batch() {
        let oversized = image("huge.jpg", (MAX_UPLOAD_BYTES + 1) as usize);
        let wrong_type = FilePayload {
            filename: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            alt: None,
            bytes: vec![0u8; 10],
        };
        let ok = image("good.jpg", 10);

        let (valid, rejected) = validate_batch(vec![oversized, wrong_type, ok]);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].filename, "good.jpg");
        assert_eq!(rejected.len(), 2);
        assert!(matches!(
            rejected[0].error,
            GalleryError::PayloadTooLarge { .. }
        ));
        assert!(matches!(rejected[1].error, GalleryError::Validation { .. }));
    }

    #[test]
    fn test_exactly_at_limit_is_valid() {
        let at_limit = image("edge.jpg", MAX_UPLOAD_BYTES as usize);
        let (valid, rejected) = validate_batch(vec![at_limit]);
        assert_eq!(valid.len(), 1);
        assert!(rejected.is_empty());
    }

    #[tokio::test]
    async fn test_batch_appends_in_submission_order() {
        let (content, _assets, orchestrator) = orchestrator();
        let before = content.photo_count();

        let outcome = orchestrator
            .upload_batch(vec![image("a.jpg", 1), image("b.jpg", 1), image("c.jpg", 1)])
            .await
            .unwrap();

        assert_eq!(outcome.uploaded.len(), 3);
        assert_eq!(content.photo_count(), before + 3);
        let alts: Vec<_> = outcome
            .gallery
            .photos
            .iter()
            .map(|p| p.alt.clone().unwrap())
            .collect();
        assert_eq!(alts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_invalid_siblings_do_not_block_valid_files() {
        let (content, assets, orchestrator) = orchestrator();

        let outcome = orchestrator
            .upload_batch(vec![
                image("huge.jpg", (MAX_UPLOAD_BYTES + 1) as usize),
                image("ok.jpg", 1),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.uploaded.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].filename, "huge.jpg");
        assert_eq!(assets.uploaded_filenames(), vec!["ok.jpg"]);
        assert_eq!(content.photo_count(), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_never_reaches_the_asset_store() {
        let (_content, assets, orchestrator) = orchestrator();
        let err = orchestrator
            .upload_one(image("huge.jpg", (MAX_UPLOAD_BYTES + 1) as usize))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::PayloadTooLarge { .. }));
        assert!(assets.uploaded_filenames().is_empty());
    }

    #[tokio::test]
    async fn test_failure_mid_batch_aborts_the_rest() {
        let (content, assets, orchestrator) = orchestrator();
        assets.fail_upload_of(
            "b.jpg",
            GalleryError::StoreWrite {
                message: "HTTP 500 error from upload endpoint".to_string(),
            },
        );

        let failure = orchestrator
            .upload_batch(vec![image("a.jpg", 1), image("b.jpg", 1), image("c.jpg", 1)])
            .await
            .unwrap_err();

        assert_eq!(failure.filename, "b.jpg");
        assert!(failure.to_string().contains("b.jpg"));
        assert_eq!(failure.uploaded.len(), 1);
        assert_eq!(failure.uploaded[0].photo.alt.as_deref(), Some("a"));
        // c.jpg was never attempted
        assert_eq!(assets.uploaded_filenames(), vec!["a.jpg"]);
        assert_eq!(content.photo_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_413_surfaces_as_payload_too_large() {
        let (_content, assets, orchestrator) = orchestrator();
        assets.fail_upload_of(
            "sneaky.jpg",
            GalleryError::PayloadTooLarge {
                filename: "sneaky.jpg".to_string(),
                size: 3_000_000,
                limit: MAX_UPLOAD_BYTES,
            },
        );

        let failure = orchestrator
            .upload_batch(vec![image("sneaky.jpg", 100)])
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            GalleryError::PayloadTooLarge { .. }
        ));
        assert!(failure.error.to_string().contains("sneaky.jpg"));
    }
}
