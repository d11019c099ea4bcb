//! Unified reader: tier-transparent streaming.

use wastemap_lib::services::{AttachmentOutcome, FileReader};

use super::test_helpers::*;

/// A cached local copy is served even while the store is down, byte
/// identical to the original upload.
#[tokio::test]
async fn test_reader_serves_local_tier_while_store_down() {
    let rig = test_rig().await;
    rig.store.set_available(false);

    let staged = stage_bytes(&rig.cache, "x.txt", b"0123456789");
    let local_path = match rig.coordinator.store_attachment(1, staged).await {
        AttachmentOutcome::CachedLocally { local_path, .. } => local_path,
        other => panic!("expected CachedLocally, got {:?}", other),
    };

    let reader = FileReader::new(rig.store.clone());
    let record = record(1, None, Some(&local_path), Some("failed"));

    let attachment = reader.open(&record).await.unwrap().expect("file attached");
    assert_eq!(attachment.filename, "1_x.txt");
    assert_eq!(attachment.media_type, "text/plain");
    assert_eq!(collect_stream(attachment.stream).await.unwrap(), b"0123456789");
}

/// An uploaded record streams from the distributed store.
#[tokio::test]
async fn test_reader_serves_remote_tier() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "site.png", b"png-bytes");

    let hdfs_path = match rig.coordinator.store_attachment(2, staged).await {
        AttachmentOutcome::Uploaded { hdfs_path } => hdfs_path,
        other => panic!("expected Uploaded, got {:?}", other),
    };

    let reader = FileReader::new(rig.store.clone());
    let record = record(2, Some(&hdfs_path), None, Some("uploaded"));

    let attachment = reader.open(&record).await.unwrap().expect("file attached");
    assert_eq!(attachment.filename, "2_site.png");
    assert_eq!(attachment.media_type, "image/png");
    assert_eq!(collect_stream(attachment.stream).await.unwrap(), b"png-bytes");
}

/// Large attachments arrive in bounded chunks, not one buffer.
#[tokio::test]
async fn test_reader_streams_large_local_file_chunked() {
    let rig = test_rig().await;
    let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    rig.store.set_available(false);
    let staged = stage_bytes(&rig.cache, "big.bin", &payload);
    let local_path = match rig.coordinator.store_attachment(3, staged).await {
        AttachmentOutcome::CachedLocally { local_path, .. } => local_path,
        other => panic!("expected CachedLocally, got {:?}", other),
    };

    let reader = FileReader::new(rig.store.clone());
    let record = record(3, None, Some(&local_path), Some("failed"));

    let attachment = reader.open(&record).await.unwrap().expect("file attached");
    // collect_stream asserts every chunk stays within the 8 KiB bound
    assert_eq!(collect_stream(attachment.stream).await.unwrap(), payload);
}

/// A stale local_path (file already evicted) falls through to the remote
/// tier rather than erroring.
#[tokio::test]
async fn test_reader_falls_through_stale_local_path() {
    let rig = test_rig().await;
    let staged = stage_bytes(&rig.cache, "x.txt", b"remote copy");
    let hdfs_path = match rig.coordinator.store_attachment(4, staged).await {
        AttachmentOutcome::Uploaded { hdfs_path } => hdfs_path,
        other => panic!("expected Uploaded, got {:?}", other),
    };

    let reader = FileReader::new(rig.store.clone());
    let record = record(
        4,
        Some(&hdfs_path),
        Some("/nonexistent/4_x.txt"),
        Some("uploaded"),
    );

    let attachment = reader.open(&record).await.unwrap().expect("file attached");
    assert_eq!(collect_stream(attachment.stream).await.unwrap(), b"remote copy");
}

/// No file in either tier: the reader reports "no file attached".
#[tokio::test]
async fn test_reader_without_attachment() {
    let rig = test_rig().await;
    let reader = FileReader::new(rig.store.clone());

    let record = record(5, None, None, None);
    assert!(reader.open(&record).await.unwrap().is_none());
}

/// Remote-only record while the store is down: the read surfaces an error,
/// since there is no further fallback.
#[tokio::test]
async fn test_reader_remote_error_when_store_down() {
    let rig = test_rig().await;
    rig.store.set_available(false);

    let reader = FileReader::new(rig.store.clone());
    let record = record(6, Some("/waste_files/6_x.txt"), None, Some("uploaded"));

    assert!(reader.open(&record).await.is_err());
}
