//! Best-effort file cleanup on record deletion.

use wastemap_lib::services::{AttachmentOutcome, DistributedStore};

use super::test_helpers::*;

/// Deleting a record whose file sits in the local cache removes the cached
/// copy.
#[tokio::test]
async fn test_delete_removes_cached_file() {
    let rig = test_rig().await;
    rig.store.set_available(false);

    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");
    let local_path = match rig.coordinator.store_attachment(1, staged).await {
        AttachmentOutcome::CachedLocally { local_path, .. } => local_path,
        other => panic!("expected CachedLocally, got {:?}", other),
    };

    rig.cache.remove(std::path::Path::new(&local_path)).await;
    assert!(!std::path::Path::new(&local_path).exists());
}

/// Deleting a record whose file lives in HDFS removes the remote copy;
/// deleting an already-absent path is a no-op.
#[tokio::test]
async fn test_delete_removes_remote_file() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");

    let hdfs_path = match rig.coordinator.store_attachment(2, staged).await {
        AttachmentOutcome::Uploaded { hdfs_path } => hdfs_path,
        other => panic!("expected Uploaded, got {:?}", other),
    };
    assert!(rig.store.file(&hdfs_path).is_some());

    rig.store.delete(&hdfs_path).await.unwrap();
    assert!(rig.store.file(&hdfs_path).is_none());

    // Double delete tolerated
    rig.store.delete(&hdfs_path).await.unwrap();
}

/// Cleanup failures while the store is down do not cascade: removing the
/// local copy still succeeds independently.
#[tokio::test]
async fn test_cleanup_tolerates_unreachable_store() {
    let rig = test_rig().await;
    rig.store.set_available(false);

    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");
    let local_path = match rig.coordinator.store_attachment(3, staged).await {
        AttachmentOutcome::CachedLocally { local_path, .. } => local_path,
        other => panic!("expected CachedLocally, got {:?}", other),
    };

    // Remote delete fails (store down) - the caller logs and continues
    assert!(rig.store.delete("/waste_files/3_x.txt").await.is_err());

    // Local cleanup is unaffected
    rig.cache.remove(std::path::Path::new(&local_path)).await;
    assert!(!std::path::Path::new(&local_path).exists());
}
