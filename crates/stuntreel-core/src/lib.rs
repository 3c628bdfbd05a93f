//! Core gallery subsystem for the stuntreel site
//!
//! This crate owns everything between the admin UI and the external content
//! store:
//!
//! - `model` - the gallery aggregate and its wire format
//! - `error` - the structured failure taxonomy
//! - `store` - the `ContentStore`/`AssetStore` seams and the `Patch` type
//! - `repository` - GalleryRepository (fetch, append, remove, reorder)
//! - `upload` - UploadOrchestrator (validation, sequential batch, abort)
//! - `reorder` - drag-gesture tracking and reorder commit
//! - `fake` - in-memory store fakes with failure injection

pub mod error;
pub mod fake;
pub mod model;
pub mod reorder;
pub mod repository;
pub mod store;
pub mod upload;

pub use error::GalleryError;
pub use fake::{FakeAssetStore, FakeContentStore};
pub use model::{AssetRef, Gallery, NewGallery, Photo, DEFAULT_ALT_TEXT, DEFAULT_GALLERY_TITLE};
pub use reorder::{DragState, PhotoGrid, Point, Rect, ReorderPlan};
pub use repository::GalleryRepository;
pub use store::{AssetStore, ContentStore, Patch, PatchOp, StoredAsset};
pub use upload::{
    BatchFailure, BatchOutcome, FilePayload, RejectedFile, UploadOrchestrator, UploadedPhoto,
    MAX_UPLOAD_BYTES,
};
