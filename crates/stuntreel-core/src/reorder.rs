//! Drag-and-drop reorder tracking
//!
//! [`PhotoGrid`] holds the locally loaded copy of the photo list plus the
//! in-progress drag gesture, and converts a drop into a single full-replace
//! reorder call. States: Idle, Dragging(source), Dragging(source, target);
//! committing clears drag tracking unconditionally, whatever the outcome.
//!
//! On a successful commit the local view is replaced with the computed
//! order. On failure the pre-drop local order is kept (no reconciling
//! refetch), which may drift from the server if the call partially applied.

use tracing::debug;

use crate::error::GalleryError;
use crate::model::{Gallery, Photo};
use crate::repository::GalleryRepository;

/// Pointer position in the grid's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Bounding rectangle of a drop candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: usize,
        target: Option<usize>,
    },
}

/// The computed outcome of a drop: the new local order and the key sequence
/// to submit. Applied to the grid only after the server confirms.
#[derive(Debug, Clone)]
pub struct ReorderPlan {
    pub gallery_id: String,
    pub photos: Vec<Photo>,
}

impl ReorderPlan {
    /// Full key set for the reorder call, derived from the new local order.
    pub fn keys(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.identity().to_string()).collect()
    }
}

/// Locally held photo list with drag gesture tracking.
#[derive(Debug, Clone, Default)]
pub struct PhotoGrid {
    gallery_id: Option<String>,
    photos: Vec<Photo>,
    drag: DragState,
}

impl PhotoGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the local view with a freshly fetched read model. Resets any
    /// in-progress drag, since its indices no longer mean anything.
    pub fn load(&mut self, gallery: Gallery) {
        self.gallery_id = gallery.id;
        self.photos = gallery.photos;
        self.drag = DragState::Idle;
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Index currently highlighted as the drop target, if any.
    pub fn highlight(&self) -> Option<usize> {
        match self.drag {
            DragState::Dragging { target, .. } => target,
            DragState::Idle => None,
        }
    }

    /// Begin tracking a drag from `source`. No gallery mutation happens
    /// until a drop commits.
    pub fn drag_start(&mut self, source: usize) {
        if source >= self.photos.len() {
            return;
        }
        self.drag = DragState::Dragging {
            source,
            target: None,
        };
    }

    /// Record `index` as the hover target. Hovering the source itself is a
    /// no-op; the highlight is purely presentational.
    pub fn drag_over(&mut self, index: usize) {
        if let DragState::Dragging { source, ref mut target } = self.drag {
            if index != source && index < self.photos.len() {
                *target = Some(index);
            }
        }
    }

    /// Clear the highlight when the pointer has left the candidate's bounds.
    /// The drag itself continues.
    pub fn drag_leave(&mut self, pointer: Point, candidate_bounds: Rect) {
        if let DragState::Dragging { ref mut target, .. } = self.drag {
            if !candidate_bounds.contains(pointer) {
                *target = None;
            }
        }
    }

    /// A browser-level drag end outside any candidate: equivalent to a drop
    /// with no matched target.
    pub fn drag_end(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Convert a drop on `target` into a reorder plan. Returns `None` for
    /// the no-op cases: not dragging, drop-on-self, drop out of bounds, or
    /// no loaded gallery. Drag tracking clears unconditionally either way.
    pub fn drop_on(&mut self, target: usize) -> Option<ReorderPlan> {
        let state = std::mem::take(&mut self.drag);
        let DragState::Dragging { source, .. } = state else {
            return None;
        };
        if source == target || target >= self.photos.len() || self.photos.is_empty() {
            return None;
        }
        let gallery_id = self.gallery_id.clone()?;

        let mut photos = self.photos.clone();
        let moved = photos.remove(source);
        photos.insert(target, moved);

        Some(ReorderPlan { gallery_id, photos })
    }

    /// Adopt a server-confirmed plan as the local order.
    pub fn confirm(&mut self, plan: ReorderPlan) {
        self.photos = plan.photos;
    }

    /// Drop at `target` and commit the resulting order. Returns `Ok(false)`
    /// when the drop was a no-op. On commit failure the local order is left
    /// unchanged and the error is surfaced.
    pub async fn commit_drop(
        &mut self,
        repository: &GalleryRepository,
        target: usize,
    ) -> Result<bool, GalleryError> {
        let Some(plan) = self.drop_on(target) else {
            return Ok(false);
        };
        debug!(
            "[PhotoGrid] Committing reorder of gallery {}: {} key(s)",
            plan.gallery_id,
            plan.photos.len()
        );
        repository
            .reorder_photos(&plan.gallery_id, &plan.keys())
            .await?;
        self.confirm(plan);
        Ok(true)
    }
}
