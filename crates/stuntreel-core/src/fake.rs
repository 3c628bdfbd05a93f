//! In-memory fakes for the store seams
//!
//! `FakeContentStore` and `FakeAssetStore` simulate the external collaborators
//! for tests and offline use. Both support failure injection so callers can
//! exercise the degraded read path, write rejection, and mid-batch aborts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GalleryError;
use crate::model::{AssetRef, Gallery, NewGallery, Photo};
use crate::store::{AssetStore, ContentStore, Patch, PatchOp, Result, StoredAsset};

/// In-memory content store holding at most one gallery document.
pub struct FakeContentStore {
    gallery: Mutex<Option<Gallery>>,
    fail_reads: Mutex<Option<String>>,
    fail_writes: Mutex<Option<String>>,
    id_counter: AtomicU64,
}

impl FakeContentStore {
    pub fn new() -> Self {
        Self {
            gallery: Mutex::new(None),
            fail_reads: Mutex::new(None),
            fail_writes: Mutex::new(None),
            id_counter: AtomicU64::new(0),
        }
    }

    /// Every subsequent read fails with `StoreRead` carrying `message`.
    pub fn fail_reads(&self, message: &str) {
        *self.fail_reads.lock().unwrap() = Some(message.to_string());
    }

    /// Every subsequent write fails with `StoreWrite` carrying `message`.
    pub fn fail_writes(&self, message: &str) {
        *self.fail_writes.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_reads.lock().unwrap() = None;
        *self.fail_writes.lock().unwrap() = None;
    }

    /// Append a keyless entry directly to the stored gallery, simulating a
    /// legacy photo created before key assignment existed.
    pub fn insert_legacy_photo(&self, asset_id: &str) {
        let mut guard = self.gallery.lock().unwrap();
        let gallery = guard.get_or_insert_with(|| {
            let mut g = Gallery::empty();
            g.id = Some("gallery-fake-0".to_string());
            g
        });
        gallery.photos.push(Photo {
            type_name: "image".to_string(),
            key: None,
            alt: None,
            caption: None,
            asset: AssetRef::to_image(asset_id),
        });
    }

    /// Current photo count, bypassing failure injection.
    pub fn photo_count(&self) -> usize {
        self.gallery
            .lock()
            .unwrap()
            .as_ref()
            .map(|g| g.photos.len())
            .unwrap_or(0)
    }

    fn check_read(&self) -> Result<()> {
        if let Some(message) = self.fail_reads.lock().unwrap().clone() {
            return Err(GalleryError::StoreRead { message });
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if let Some(message) = self.fail_writes.lock().unwrap().clone() {
            return Err(GalleryError::StoreWrite { message });
        }
        Ok(())
    }

    fn apply_op(gallery: &mut Gallery, op: PatchOp) -> Result<()> {
        match op {
            PatchOp::SetIfMissing { field, .. } => {
                // `photos` is always materialized on the in-memory model, so
                // initializing it is a no-op; any other field is unexpected.
                expect_photos_field(&field)
            }
            PatchOp::AppendToArray { field, items } => {
                expect_photos_field(&field)?;
                for item in items {
                    gallery.photos.push(parse_photo(item)?);
                }
                Ok(())
            }
            PatchOp::Unset { paths } => {
                for path in paths {
                    let key = parse_keyed_path(&path)?;
                    gallery.photos.retain(|p| p.key.as_deref() != Some(&key));
                }
                Ok(())
            }
            PatchOp::Set { field, value } => {
                expect_photos_field(&field)?;
                let photos: Vec<Photo> =
                    serde_json::from_value(value).map_err(|e| GalleryError::StoreWrite {
                        message: format!("Malformed photos array in patch: {}", e),
                    })?;
                gallery.photos = photos;
                Ok(())
            }
        }
    }
}

impl Default for FakeContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_photos_field(field: &str) -> Result<()> {
    if field == "photos" {
        Ok(())
    } else {
        Err(GalleryError::StoreWrite {
            message: format!("Fake store only models the photos field, got {}", field),
        })
    }
}

fn parse_photo(value: Value) -> Result<Photo> {
    serde_json::from_value(value).map_err(|e| GalleryError::StoreWrite {
        message: format!("Malformed photo entry in patch: {}", e),
    })
}

/// Extract `key` from an item path of the form `photos[_key=="key"]`.
fn parse_keyed_path(path: &str) -> Result<String> {
    path.strip_prefix("photos[_key==\"")
        .and_then(|rest| rest.strip_suffix("\"]"))
        .map(|key| key.to_string())
        .ok_or_else(|| GalleryError::StoreWrite {
            message: format!("Unsupported unset path: {}", path),
        })
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn fetch_first_gallery(&self) -> Result<Option<Gallery>> {
        self.check_read()?;
        Ok(self.gallery.lock().unwrap().clone())
    }

    async fn fetch_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>> {
        self.check_read()?;
        let guard = self.gallery.lock().unwrap();
        Ok(guard
            .as_ref()
            .filter(|g| g.id.as_deref() == Some(gallery_id))
            .cloned())
    }

    async fn create_gallery(&self, gallery: &NewGallery) -> Result<String> {
        self.check_write()?;
        let id = format!("gallery-fake-{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
        let mut guard = self.gallery.lock().unwrap();
        *guard = Some(Gallery {
            id: Some(id.clone()),
            title: Some(gallery.title.clone()),
            photos: gallery.photos.clone(),
        });
        Ok(id)
    }

    async fn apply_patch(&self, patch: Patch) -> Result<()> {
        self.check_write()?;
        let mut guard = self.gallery.lock().unwrap();
        let gallery = guard
            .as_mut()
            .filter(|g| g.id.as_deref() == Some(patch.document_id.as_str()))
            .ok_or_else(|| GalleryError::GalleryNotFound {
                gallery_id: patch.document_id.clone(),
            })?;
        for op in patch.ops {
            Self::apply_op(gallery, op)?;
        }
        Ok(())
    }
}

/// In-memory asset store handing out sequential asset ids.
pub struct FakeAssetStore {
    counter: AtomicU64,
    uploaded: Mutex<Vec<String>>,
    fail_on: Mutex<Option<(String, GalleryError)>>,
}

impl FakeAssetStore {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            uploaded: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Fail the upload of the file named `filename` with `error`; uploads of
    /// other files keep succeeding.
    pub fn fail_upload_of(&self, filename: &str, error: GalleryError) {
        *self.fail_on.lock().unwrap() = Some((filename.to_string(), error));
    }

    /// Filenames uploaded so far, in order.
    pub fn uploaded_filenames(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl Default for FakeAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload_image(
        &self,
        filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredAsset> {
        if let Some((target, error)) = self.fail_on.lock().unwrap().as_ref() {
            if target == filename {
                return Err(error.clone());
            }
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.uploaded.lock().unwrap().push(filename.to_string());
        Ok(StoredAsset {
            asset_id: format!("image-fake-{}", n),
            url: format!("https://cdn.fake.test/images/image-fake-{}.jpg", n),
        })
    }
}
