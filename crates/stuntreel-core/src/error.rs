//! Structured error types for gallery operations.
//!
//! The failure kind is set at the point of detection (the transport layer
//! maps HTTP 413 to `PayloadTooLarge`, the query path produces `StoreRead`,
//! and so on) rather than inferred later from message text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum GalleryError {
    /// Client-side, pre-network rejection. Never retried; batch-scoped.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Gallery not found: {gallery_id}")]
    GalleryNotFound { gallery_id: String },

    #[error("Photo with key \"{photo_key}\" not found in gallery")]
    PhotoNotFound { photo_key: String },

    /// Upload rejected for size, detected from the transport status code or
    /// before any network call. Always names the offending file.
    #[error("{filename} is too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    /// The server answered with something that could not be parsed as
    /// structured data.
    #[error("Invalid response from store (HTTP {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    /// The store rejected a read. The gallery fetch path recovers from this
    /// by degrading to an empty projection; other callers surface it.
    #[error("Store read failed: {message}")]
    StoreRead { message: String },

    /// The store rejected a write (auth, network, quota). Fatal to the
    /// current operation, surfaced verbatim, never retried here.
    #[error("Store write failed: {message}")]
    StoreWrite { message: String },

    /// A required credential or setting is missing.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl GalleryError {
    /// Short human-readable summary for user-facing display, paired with the
    /// `Display` output as the detail string.
    pub fn summary(&self) -> &'static str {
        match self {
            GalleryError::Validation { .. } => "Invalid request",
            GalleryError::GalleryNotFound { .. } => "Gallery not found",
            GalleryError::PhotoNotFound { .. } => "Photo not found",
            GalleryError::PayloadTooLarge { .. } => "File too large",
            GalleryError::InvalidResponse { .. } => "Unexpected store response",
            GalleryError::StoreRead { .. } => "Failed to read from store",
            GalleryError::StoreWrite { .. } => "Failed to write to store",
            GalleryError::Config { .. } => "Server configuration error",
        }
    }
}
