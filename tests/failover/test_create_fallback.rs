//! Upload coordinator: initial attempt and fallback to the local cache.

use wastemap_lib::services::AttachmentOutcome;

use super::test_helpers::*;

/// Store reachable: the attachment lands in HDFS at the derived path and no
/// local copy is kept.
#[tokio::test]
async fn test_upload_reaches_store_when_available() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");

    let outcome = rig.coordinator.store_attachment(1, staged).await;

    match outcome {
        AttachmentOutcome::Uploaded { hdfs_path } => {
            assert_eq!(hdfs_path, "/waste_files/1_x.txt");
            assert_eq!(rig.store.file(&hdfs_path).unwrap(), b"0123456789");
        }
        other => panic!("expected Uploaded, got {:?}", other),
    }

    // No fallback copy, no staging leftovers
    assert!(!rig.cache.entry_path(1, "x.txt").exists());
    assert_eq!(staging_entries(&rig.cache), 0);
}

/// Store unreachable: the create flow still gets a non-error outcome, the
/// bytes are demoted to the cache and the diagnostic names the failure.
#[tokio::test]
async fn test_upload_falls_back_to_cache_when_store_down() {
    let rig = test_rig().await;
    rig.store.set_available(false);

    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");
    let outcome = rig.coordinator.store_attachment(7, staged).await;

    match outcome {
        AttachmentOutcome::CachedLocally { local_path, error } => {
            assert_eq!(
                std::path::Path::new(&local_path),
                rig.cache.entry_path(7, "x.txt")
            );
            assert_eq!(std::fs::read(&local_path).unwrap(), b"0123456789");
            assert!(error.contains("HDFS upload failed"), "diagnostic: {error}");
        }
        other => panic!("expected CachedLocally, got {:?}", other),
    }

    // Nothing reached the store; staging is clean either way
    assert_eq!(rig.store.file_count(), 0);
    assert_eq!(staging_entries(&rig.cache), 0);
}

/// Client-supplied filenames are reduced to their basename in both the
/// remote path and the cache key.
#[tokio::test]
async fn test_upload_uses_basename_of_client_path() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "photos/site 1.png", b"png-bytes");

    match rig.coordinator.store_attachment(4, staged).await {
        AttachmentOutcome::Uploaded { hdfs_path } => {
            assert_eq!(hdfs_path, "/waste_files/4_site 1.png");
        }
        other => panic!("expected Uploaded, got {:?}", other),
    }
}

/// A staged file that is dropped without being stored leaves no trace.
#[tokio::test]
async fn test_staged_file_cleaned_up_on_drop() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "x.txt", b"abc");

    assert_eq!(staging_entries(&rig.cache), 1);
    drop(staged);
    assert_eq!(staging_entries(&rig.cache), 0);
}

/// The remote target path is deterministic per record and filename.
#[tokio::test]
async fn test_remote_path_derivation() {
    let rig = test_rig().await;
    assert_eq!(
        rig.coordinator.remote_path(12, "report.pdf"),
        "/waste_files/12_report.pdf"
    );
    assert_eq!(
        rig.coordinator.remote_path_for_entry("12_report.pdf"),
        "/waste_files/12_report.pdf"
    );
}
