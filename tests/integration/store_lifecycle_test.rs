// Store lifecycle integration tests
// Full create/consume/fetch cycles against a real SQLite database in a
// temporary directory.

use tempfile::TempDir;
use utakata::store::LinkStore;

async fn open_store() -> (TempDir, LinkStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LinkStore::open(dir.path()).await.expect("Failed to open store");
    (dir, store)
}

#[tokio::test]
async fn test_full_link_lifecycle() {
    let (_dir, store) = open_store().await;

    let link = store.create(b"the payload", 2).await.unwrap();
    assert_eq!(link.remaining, 2);

    let first = store.consume(&link.token).await.unwrap().unwrap();
    assert_eq!(first.remaining, 1);

    let second = store.consume(&link.token).await.unwrap().unwrap();
    assert_eq!(second.remaining, 0);

    // The zeroing consume removed the row
    assert_eq!(store.consume(&link.token).await.unwrap(), None);
    assert_eq!(store.fetch(&link.token).await.unwrap(), None);
    assert_eq!(store.active_links().await.unwrap(), 0);
}

#[tokio::test]
async fn test_remaining_never_goes_negative() {
    let (_dir, store) = open_store().await;
    let link = store.create(b"x", 3).await.unwrap();

    let mut last_seen = i64::MAX;
    while let Some(seen) = store.consume(&link.token).await.unwrap() {
        assert!(seen.remaining >= 0);
        assert!(seen.remaining < last_seen, "remaining must strictly decrease");
        last_seen = seen.remaining;
    }
    assert_eq!(last_seen, 0);
}

#[tokio::test]
async fn test_blob_is_unreachable_after_exhaustion() {
    let (_dir, store) = open_store().await;
    let link = store.create(b"short lived", 1).await.unwrap();

    let last = store.consume(&link.token).await.unwrap().unwrap();
    assert_eq!(last.remaining, 0);
    store.remove_blob(&last).await;

    assert!(!last.path.exists());
    assert_eq!(store.fetch(&link.token).await.unwrap(), None);
}

#[tokio::test]
async fn test_links_are_independent() {
    let (_dir, store) = open_store().await;

    let a = store.create(b"aaa", 1).await.unwrap();
    let b = store.create(b"bbb", 5).await.unwrap();
    assert_ne!(a.token, b.token);

    // Exhaust a, b is untouched
    store.consume(&a.token).await.unwrap();
    assert_eq!(store.consume(&a.token).await.unwrap(), None);

    let b_after = store.fetch(&b.token).await.unwrap().unwrap();
    assert_eq!(b_after.remaining, 5);
    assert_eq!(tokio::fs::read(&b_after.path).await.unwrap(), b"bbb");
}

#[tokio::test]
async fn test_store_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let (token_kept, token_spent) = {
        let store = LinkStore::open(dir.path()).await.unwrap();
        let kept = store.create(b"kept", 4).await.unwrap();
        let spent = store.create(b"spent", 1).await.unwrap();
        store.consume(&spent.token).await.unwrap();
        (kept.token, spent.token)
    };

    let store = LinkStore::open(dir.path()).await.unwrap();
    assert_eq!(store.fetch(&token_kept).await.unwrap().unwrap().remaining, 4);
    assert_eq!(store.fetch(&token_spent).await.unwrap(), None);
    assert_eq!(store.active_links().await.unwrap(), 1);
}

#[tokio::test]
async fn test_view_budget_is_clamped_to_at_least_one() {
    let (_dir, store) = open_store().await;

    for requested in [0i64, -1, -100] {
        let link = store.create(b"x", requested).await.unwrap();
        assert_eq!(link.remaining, 1, "requested {requested}");

        // Exactly one view is served
        assert!(store.consume(&link.token).await.unwrap().is_some());
        assert_eq!(store.consume(&link.token).await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_stats_reflect_served_and_expired_links() {
    let (_dir, store) = open_store().await;

    let a = store.create(b"a", 1).await.unwrap();
    let b = store.create(b"b", 2).await.unwrap();

    store.consume(&a.token).await.unwrap(); // expires a
    store.consume(&b.token).await.unwrap();
    store.consume("missing").await.unwrap(); // not counted

    let stats = store.stats();
    assert_eq!(stats.links_created, 2);
    assert_eq!(stats.views_served, 2);
    assert_eq!(stats.links_expired, 1);
}
