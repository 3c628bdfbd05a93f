//! Gallery data model
//!
//! These types carry the store's wire field names (`_id`, `_key`, `_type`,
//! `_ref`) directly, so the same structs serve the repository, the fakes,
//! and the Sanity client without a separate DTO layer.

use serde::{Deserialize, Serialize};

/// Document type of the gallery singleton in the content store.
pub const GALLERY_DOC_TYPE: &str = "gallery";

/// Title given to a gallery created lazily on first upload.
pub const DEFAULT_GALLERY_TITLE: &str = "Photo Gallery";

/// Alt text substituted when the caller supplies none.
pub const DEFAULT_ALT_TEXT: &str = "Gallery image";

/// The singleton ordered collection of photos shown on the gallery page.
///
/// `photos` order is the authoritative display order; mutations other than
/// an explicit reorder must preserve it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gallery {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Gallery {
    /// The renderable fallback projection: no id, no title, no photos.
    ///
    /// Returned by the read path when the store has no gallery or is
    /// unreachable, so presentation code always has something to show.
    pub fn empty() -> Self {
        Self {
            id: None,
            title: None,
            photos: Vec::new(),
        }
    }

}

/// One entry in a gallery, referencing a stored image asset plus display
/// metadata. The asset reference is weak: the asset may be deleted
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    /// Store item type tag, always `"image"` on the wire.
    #[serde(rename = "_type", default = "Photo::type_name")]
    pub type_name: String,

    /// Unique within the containing gallery, assigned at append time.
    /// Absent on legacy entries created before key assignment existed.
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    pub asset: AssetRef,
}

impl Photo {
    fn type_name() -> String {
        "image".to_string()
    }

    /// Build a keyed photo entry for append. `alt` falls back to the fixed
    /// placeholder when empty.
    pub fn new(key: String, asset_id: &str, alt: &str) -> Self {
        let alt = if alt.trim().is_empty() {
            DEFAULT_ALT_TEXT.to_string()
        } else {
            alt.to_string()
        };
        Self {
            type_name: Self::type_name(),
            key: Some(key),
            alt: Some(alt),
            caption: None,
            asset: AssetRef::to_image(asset_id),
        }
    }

    /// Fallback-identity rule: a photo is identified by its `_key`, or by
    /// its asset reference when no key was ever assigned.
    pub fn identity(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.asset.reference)
    }

    /// Whether `candidate` identifies this entry under the fallback rule.
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.key {
            Some(key) => key == candidate,
            None => self.asset.reference == candidate,
        }
    }
}

/// Weak reference to a stored image asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRef {
    #[serde(rename = "_type")]
    pub ref_type: String,

    #[serde(rename = "_ref")]
    pub reference: String,
}

impl AssetRef {
    pub fn to_image(asset_id: &str) -> Self {
        Self {
            ref_type: "reference".to_string(),
            reference: asset_id.to_string(),
        }
    }
}

/// Create payload for the lazily-created gallery singleton.
#[derive(Debug, Clone, Serialize)]
pub struct NewGallery {
    #[serde(rename = "_type")]
    pub doc_type: String,

    pub title: String,

    pub photos: Vec<Photo>,
}

impl NewGallery {
    pub fn with_photo(photo: Photo) -> Self {
        Self {
            doc_type: GALLERY_DOC_TYPE.to_string(),
            title: DEFAULT_GALLERY_TITLE.to_string(),
            photos: vec![photo],
        }
    }
}
