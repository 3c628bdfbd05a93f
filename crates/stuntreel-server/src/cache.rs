//! TTL'd single-slot cache for the gallery read model
//!
//! The public gallery page tolerates content up to this stale; serving reads
//! from the slot keeps casual refreshes off the content store. Mutating
//! endpoints and the revalidation webhook drop the slot so admin actions are
//! visible on the next read.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use stuntreel_core::model::Gallery;

pub const GALLERY_CACHE_TTL: Duration = Duration::from_secs(10);

struct Slot {
    gallery: Gallery,
    stored_at: Instant,
}

pub struct GalleryCache {
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl GalleryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached gallery, if one was stored less than `ttl` ago.
    pub fn get(&self) -> Option<Gallery> {
        let guard = self.slot.lock().ok()?;
        let slot = guard.as_ref()?;
        if slot.stored_at.elapsed() < self.ttl {
            Some(slot.gallery.clone())
        } else {
            None
        }
    }

    pub fn put(&self, gallery: Gallery) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(Slot {
                gallery,
                stored_at: Instant::now(),
            });
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = None;
        }
    }
}
