//! Gallery repository
//!
//! Sole mediator of reads and writes to the gallery aggregate. Encapsulates
//! the fallback-identity rule for photos and keeps the "unique identity,
//! order preserved" invariant intact across mutations.
//!
//! Failure semantics: store unavailability on the read path degrades to an
//! empty projection (logged, never raised); on the write path it is fatal
//! and surfaced verbatim to the caller. No retries anywhere; retries, if
//! desired, are the caller's responsibility.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::GalleryError;
use crate::model::{Gallery, NewGallery, Photo};
use crate::store::{ContentStore, Patch, Result};

#[derive(Clone)]
pub struct GalleryRepository {
    store: Arc<dyn ContentStore>,
}

impl GalleryRepository {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Fetch the singleton gallery read model.
    ///
    /// Always returns a renderable value: a missing gallery or an
    /// unreachable store both yield the empty projection.
    pub async fn fetch_gallery(&self) -> Gallery {
        match self.store.fetch_first_gallery().await {
            Ok(Some(gallery)) => gallery,
            Ok(None) => {
                debug!("[GalleryRepository] No gallery document exists yet");
                Gallery::empty()
            }
            Err(e) => {
                warn!(
                    "[GalleryRepository] Gallery fetch failed, serving empty projection: {}",
                    e
                );
                Gallery::empty()
            }
        }
    }

    /// Append one photo referencing `asset_id`, creating the gallery
    /// document if none exists yet. Returns the appended entry with its
    /// newly assigned key.
    ///
    /// The append patch initializes `photos` if absent and appends a single
    /// entry; it never overwrites fields set concurrently by other writers.
    pub async fn append_photo(&self, asset_id: &str, alt: &str) -> Result<Photo> {
        let photo = Photo::new(Uuid::new_v4().to_string(), asset_id, alt);
        let photo_value = serde_json::to_value(&photo).map_err(|e| GalleryError::StoreWrite {
            message: format!("Failed to serialize photo entry: {}", e),
        })?;

        match self.store.fetch_first_gallery().await? {
            Some(gallery) => {
                let gallery_id = gallery.id.ok_or_else(|| GalleryError::StoreRead {
                    message: "Gallery document is missing its id".to_string(),
                })?;
                let patch = Patch::new(&gallery_id)
                    .set_if_missing("photos", json!([]))
                    .append("photos", vec![photo_value]);
                self.store.apply_patch(patch).await?;
                debug!(
                    "[GalleryRepository] Appended photo key={} to gallery {}",
                    photo.identity(),
                    gallery_id
                );
            }
            None => {
                let gallery_id = self
                    .store
                    .create_gallery(&NewGallery::with_photo(photo.clone()))
                    .await?;
                debug!(
                    "[GalleryRepository] Created gallery {} with first photo key={}",
                    gallery_id,
                    photo.identity()
                );
            }
        }

        Ok(photo)
    }

    /// Remove exactly one photo, resolved by the fallback-identity rule:
    /// match by `_key` first, by asset reference for keyless legacy entries.
    ///
    /// Keyed entries are removed with a targeted unset; keyless entries by
    /// filtering the array and overwriting it. Both preserve the relative
    /// order of every other entry.
    pub async fn remove_photo(&self, gallery_id: &str, photo_key: &str) -> Result<()> {
        let gallery = self
            .store
            .fetch_gallery(gallery_id)
            .await?
            .ok_or_else(|| GalleryError::GalleryNotFound {
                gallery_id: gallery_id.to_string(),
            })?;

        let target = gallery
            .photos
            .iter()
            .find(|p| p.matches(photo_key))
            .ok_or_else(|| GalleryError::PhotoNotFound {
                photo_key: photo_key.to_string(),
            })?;

        let patch = match &target.key {
            Some(key) => {
                Patch::new(gallery_id).unset(vec![format!("photos[_key==\"{}\"]", key)])
            }
            None => {
                let remaining: Vec<_> = gallery
                    .photos
                    .iter()
                    .filter(|p| p.asset.reference != photo_key)
                    .collect();
                let value =
                    serde_json::to_value(&remaining).map_err(|e| GalleryError::StoreWrite {
                        message: format!("Failed to serialize photos array: {}", e),
                    })?;
                Patch::new(gallery_id).set("photos", value)
            }
        };

        self.store.apply_patch(patch).await?;
        debug!(
            "[GalleryRepository] Removed photo {} from gallery {}",
            photo_key, gallery_id
        );
        Ok(())
    }

    /// Overwrite the photo order with the entries resolved from
    /// `ordered_keys`, in that order (full-replace reorder).
    ///
    /// Keys that no longer resolve (the entry was deleted in the interim)
    /// are dropped silently. Entries whose key is omitted from
    /// `ordered_keys` are implicitly removed; callers must pass the complete
    /// key set when reordering, not a partial list.
    pub async fn reorder_photos(&self, gallery_id: &str, ordered_keys: &[String]) -> Result<()> {
        let gallery = self
            .store
            .fetch_gallery(gallery_id)
            .await?
            .ok_or_else(|| GalleryError::GalleryNotFound {
                gallery_id: gallery_id.to_string(),
            })?;

        let reordered: Vec<&Photo> = ordered_keys
            .iter()
            .filter_map(|key| gallery.photos.iter().find(|p| p.matches(key)))
            .collect();

        if reordered.len() < ordered_keys.len() {
            debug!(
                "[GalleryRepository] Dropping {} stale key(s) from reorder of gallery {}",
                ordered_keys.len() - reordered.len(),
                gallery_id
            );
        }

        let value = serde_json::to_value(&reordered).map_err(|e| GalleryError::StoreWrite {
            message: format!("Failed to serialize photos array: {}", e),
        })?;
        self.store
            .apply_patch(Patch::new(gallery_id).set("photos", value))
            .await?;
        debug!(
            "[GalleryRepository] Reordered gallery {}: {} photo(s)",
            gallery_id,
            reordered.len()
        );
        Ok(())
    }
}
