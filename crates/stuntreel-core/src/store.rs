//! Store trait seams
//!
//! The content store and the asset store are external collaborators; the
//! core consumes them through these object-safe traits. The concrete Sanity
//! client lives in `stuntreel-sanity`, the in-memory fakes in [`crate::fake`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GalleryError;
use crate::model::{Gallery, NewGallery};

pub type Result<T> = std::result::Result<T, GalleryError>;

/// Read/write access to the document database holding the gallery singleton.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// First document of the gallery type, in store order. The repository
    /// unconditionally uses this one (implicit-singleton rule).
    async fn fetch_first_gallery(&self) -> Result<Option<Gallery>>;

    async fn fetch_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>>;

    /// Create the gallery document; returns the store-assigned id.
    async fn create_gallery(&self, gallery: &NewGallery) -> Result<String>;

    /// Apply a patch as a single store transaction.
    async fn apply_patch(&self, patch: Patch) -> Result<()>;
}

/// Upload of raw image bytes; returns the stored asset's id and public URL.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredAsset>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub asset_id: String,
    pub url: String,
}

/// One document patch: an ordered list of operations committed atomically.
///
/// Mirrors the store's patch primitives so a `ContentStore` implementation
/// can translate it 1:1 into its mutation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub document_id: String,
    pub ops: Vec<PatchOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Initialize `field` to `value` only if the document lacks it.
    SetIfMissing { field: String, value: Value },

    /// Append `items` to the array at `field`.
    AppendToArray { field: String, items: Vec<Value> },

    /// Remove the entries addressed by `paths`.
    Unset { paths: Vec<String> },

    /// Overwrite `field` with `value`.
    Set { field: String, value: Value },
}

impl Patch {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ops: Vec::new(),
        }
    }

    pub fn set_if_missing(mut self, field: &str, value: Value) -> Self {
        self.ops.push(PatchOp::SetIfMissing {
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn append(mut self, field: &str, items: Vec<Value>) -> Self {
        self.ops.push(PatchOp::AppendToArray {
            field: field.to_string(),
            items,
        });
        self
    }

    pub fn unset(mut self, paths: Vec<String>) -> Self {
        self.ops.push(PatchOp::Unset { paths });
        self
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.ops.push(PatchOp::Set {
            field: field.to_string(),
            value,
        });
        self
    }
}
