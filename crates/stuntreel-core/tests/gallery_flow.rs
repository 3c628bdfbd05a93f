//! End-to-end gallery flow over the in-memory stores: upload a batch, read
//! the gallery back, reorder it with a drag gesture, then delete an entry.

use std::sync::Arc;

use stuntreel_core::fake::{FakeAssetStore, FakeContentStore};
use stuntreel_core::model::DEFAULT_GALLERY_TITLE;
use stuntreel_core::reorder::PhotoGrid;
use stuntreel_core::repository::GalleryRepository;
use stuntreel_core::store::{AssetStore, ContentStore};
use stuntreel_core::upload::{FilePayload, UploadOrchestrator};

fn image(filename: &str) -> FilePayload {
    FilePayload {
        filename: filename.to_string(),
        content_type: "image/jpeg".to_string(),
        alt: None,
        bytes: vec![0u8; 128],
    }
}

#[tokio::test]
async fn test_upload_fetch_reorder_delete_flow() {
    let content = Arc::new(FakeContentStore::new());
    let assets = Arc::new(FakeAssetStore::new());
    let repo = GalleryRepository::new(Arc::clone(&content) as Arc<dyn ContentStore>);
    let orchestrator =
        UploadOrchestrator::new(Arc::clone(&assets) as Arc<dyn AssetStore>, repo.clone());

    // First upload lazily creates the gallery with the fixed title.
    let outcome = orchestrator
        .upload_batch(vec![
            image("wire-flip.jpg"),
            image("car-hit.jpg"),
            image("high-fall.jpg"),
        ])
        .await
        .unwrap();
    assert_eq!(outcome.uploaded.len(), 3);
    assert!(outcome.rejected.is_empty());
    assert_eq!(
        outcome.gallery.title.as_deref(),
        Some(DEFAULT_GALLERY_TITLE)
    );

    let gallery = repo.fetch_gallery().await;
    let gallery_id = gallery.id.clone().unwrap();
    let alts = |photos: &[stuntreel_core::model::Photo]| -> Vec<String> {
        photos.iter().map(|p| p.alt.clone().unwrap()).collect()
    };
    assert_eq!(alts(&gallery.photos), vec!["wire-flip", "car-hit", "high-fall"]);

    // Drag the last photo to the front and commit.
    let mut grid = PhotoGrid::new();
    grid.load(gallery);
    grid.drag_start(2);
    assert!(grid.commit_drop(&repo, 0).await.unwrap());
    assert_eq!(alts(grid.photos()), vec!["high-fall", "wire-flip", "car-hit"]);

    let persisted = repo.fetch_gallery().await;
    assert_eq!(
        alts(&persisted.photos),
        vec!["high-fall", "wire-flip", "car-hit"]
    );

    // Delete the middle entry; the rest keep their relative order.
    let middle_key = persisted.photos[1].identity().to_string();
    repo.remove_photo(&gallery_id, &middle_key).await.unwrap();

    let after_delete = repo.fetch_gallery().await;
    assert_eq!(alts(&after_delete.photos), vec!["high-fall", "car-hit"]);
}
