// End-to-end serving tests
// Drive the render -> store -> resolve pipeline the way the binary does.

use image::{Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;
use utakata::render::TextRenderer;
use utakata::serve::{handle_health, resolve, ServeOutcome};
use utakata::store::LinkStore;

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 180, 160, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

async fn open_store() -> (TempDir, LinkStore) {
    let dir = TempDir::new().unwrap();
    let store = LinkStore::open(dir.path()).await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_rendered_image_roundtrips_through_the_store() {
    let renderer = TextRenderer::builtin();
    let captioned = renderer
        .caption_bottom(&sample_png(320, 240), "for your eyes only")
        .unwrap();

    let (_dir, store) = open_store().await;
    let link = store.create(&captioned, 2).await.unwrap();

    match resolve(&store, &link.token).await.unwrap() {
        ServeOutcome::Served {
            body,
            content_type,
            remaining,
        } => {
            assert_eq!(content_type, "image/jpeg");
            assert_eq!(remaining, 1);
            assert_eq!(body, captioned);

            let decoded = image::load_from_memory(&body).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (320, 240));
        }
        other => panic!("expected Served, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_view_link_serves_once_then_gone() {
    let (_dir, store) = open_store().await;
    let link = store.create(b"one shot", 1).await.unwrap();
    let blob_path = link.path.clone();

    match resolve(&store, &link.token).await.unwrap() {
        ServeOutcome::Served { remaining, body, .. } => {
            assert_eq!(remaining, 0);
            assert_eq!(body, b"one shot");
        }
        other => panic!("expected Served, got {other:?}"),
    }

    // Blob cleaned up after the exhausting view was streamed
    assert!(!blob_path.exists());
    assert_eq!(resolve(&store, &link.token).await.unwrap(), ServeOutcome::Gone);
}

#[tokio::test]
async fn test_every_view_of_the_budget_is_served() {
    let (_dir, store) = open_store().await;
    let link = store.create(b"multi", 3).await.unwrap();

    for expected_remaining in [2, 1, 0] {
        match resolve(&store, &link.token).await.unwrap() {
            ServeOutcome::Served { remaining, .. } => {
                assert_eq!(remaining, expected_remaining)
            }
            other => panic!("expected Served, got {other:?}"),
        }
    }
    assert_eq!(resolve(&store, &link.token).await.unwrap(), ServeOutcome::Gone);
}

#[tokio::test]
async fn test_vanished_blob_reports_missing_not_error() {
    let (_dir, store) = open_store().await;
    let link = store.create(b"fragile", 2).await.unwrap();
    tokio::fs::remove_file(&link.path).await.unwrap();

    assert_eq!(
        resolve(&store, &link.token).await.unwrap(),
        ServeOutcome::Missing
    );
}

#[tokio::test]
async fn test_health_tracks_the_whole_pipeline() {
    let (_dir, store) = open_store().await;

    let keep = store.create(b"keep", 3).await.unwrap();
    let burn = store.create(b"burn", 1).await.unwrap();

    resolve(&store, &keep.token).await.unwrap();
    resolve(&store, &burn.token).await.unwrap();

    let body = handle_health(&store).await.unwrap();
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["active_links"], 1);
    assert_eq!(health["stats"]["links_created"], 2);
    assert_eq!(health["stats"]["views_served"], 2);
    assert_eq!(health["stats"]["links_expired"], 1);
}
