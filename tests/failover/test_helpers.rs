//! Shared test helpers for the failover suite.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::{StreamExt, stream};

use wastemap_lib::entity::waste_record;
use wastemap_lib::error::{AppError, AppResult};
use wastemap_lib::services::{
    ByteStream, DistributedStore, LocalCache, StagedFile, UploadCoordinator,
};

/// HDFS root used by every test coordinator.
pub const TEST_REMOTE_ROOT: &str = "/waste_files";

/// In-memory distributed store with toggleable reachability.
#[derive(Default)]
pub struct MockStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    dirs: Mutex<HashSet<String>>,
    available: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        let store = MockStore::default();
        store.available.store(true, Ordering::SeqCst);
        store
    }

    /// Simulate the store going down or coming back up.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Storage(
                "connection refused (namenode unreachable)".to_string(),
            ))
        }
    }
}

#[async_trait]
impl DistributedStore for MockStore {
    async fn status(&self, path: &str) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.dirs.lock().unwrap().contains(path) || self.files.lock().unwrap().contains_key(path))
    }

    async fn mkdirs(&self, path: &str) -> AppResult<()> {
        self.check_available()?;
        self.dirs.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    async fn write(&self, path: &str, source: &Path) -> AppResult<()> {
        self.check_available()?;
        let data = tokio::fs::read(source)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to read source: {}", e)))?;
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.check_available()?;
        let data = self
            .file(path)
            .ok_or_else(|| AppError::NotFound(format!("HDFS file '{}'", path)))?;

        // Hand the data back in bounded chunks like a real remote read
        let chunks: Vec<AppResult<Bytes>> = data
            .chunks(8 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.check_available()?;
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

/// A coordinator wired to a mock store and a temp-dir cache.
pub struct TestRig {
    pub store: std::sync::Arc<MockStore>,
    pub coordinator: UploadCoordinator,
    pub cache: LocalCache,
    _cache_dir: tempfile::TempDir,
}

pub async fn test_rig() -> TestRig {
    let cache_dir = tempfile::tempdir().expect("Failed to create temp cache dir");
    let cache = LocalCache::new(cache_dir.path());
    cache.init().await.expect("Failed to init cache");

    let store = std::sync::Arc::new(MockStore::new());
    let coordinator =
        UploadCoordinator::new(store.clone(), cache.clone(), TEST_REMOTE_ROOT);

    TestRig {
        store,
        coordinator,
        cache,
        _cache_dir: cache_dir,
    }
}

/// Stage bytes the way the create handler does.
pub fn stage_bytes(cache: &LocalCache, filename: &str, bytes: &[u8]) -> StagedFile {
    let mut temp = tempfile::NamedTempFile::new_in(cache.staging_dir())
        .expect("Failed to create staging file");
    temp.write_all(bytes).expect("Failed to write staging file");
    temp.flush().expect("Failed to flush staging file");
    StagedFile::new(filename.to_string(), temp, bytes.len() as u64)
}

/// Number of entries left in the staging directory.
pub fn staging_entries(cache: &LocalCache) -> usize {
    std::fs::read_dir(cache.staging_dir())
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Build a record model in a given persistence state.
pub fn record(
    id: i32,
    hdfs_path: Option<&str>,
    local_path: Option<&str>,
    upload_status: Option<&str>,
) -> waste_record::Model {
    waste_record::Model {
        id,
        latitude: 31.5,
        longitude: 74.3,
        description: None,
        name: None,
        custom_id: None,
        quantity: 3,
        status: "new".to_string(),
        hdfs_path: hdfs_path.map(String::from),
        local_path: local_path.map(String::from),
        upload_status: upload_status.map(String::from),
        created_at: Utc::now(),
    }
}

/// Collect a byte stream into a buffer, asserting chunk bounds.
pub async fn collect_stream(mut stream: ByteStream) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        assert!(
            chunk.len() <= 8 * 1024,
            "stream chunk exceeds 8 KiB bound: {}",
            chunk.len()
        );
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
