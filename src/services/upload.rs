//! Upload coordinator for the two-tier attachment persistence.
//!
//! The coordinator tries to place attachment bytes into HDFS; when the store
//! is unreachable it demotes the file to the local fallback cache instead of
//! failing the surrounding request. Losing an uploaded file is treated as
//! worse than a metadata write with a recorded anomaly, so the only fatal
//! path here is losing the bytes entirely.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::services::local_cache::{LocalCache, file_basename};
use crate::services::store::StoreHandle;

/// An uploaded file staged on local disk while the initial HDFS attempt runs.
///
/// The staging file lives in the cache's staging directory so a demotion is
/// an atomic rename; dropping a `StagedFile` removes the staging file on
/// every other exit path, including mid-write failures.
pub struct StagedFile {
    filename: String,
    temp: NamedTempFile,
    size: u64,
}

impl StagedFile {
    pub fn new(filename: String, temp: NamedTempFile, size: u64) -> Self {
        StagedFile {
            filename,
            temp,
            size,
        }
    }

    /// Original (client-supplied) filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    fn into_parts(self) -> (String, NamedTempFile) {
        (self.filename, self.temp)
    }
}

/// Where the attachment bytes ended up after the initial attempt.
#[derive(Debug)]
pub enum AttachmentOutcome {
    /// The file reached HDFS.
    Uploaded { hdfs_path: String },
    /// HDFS was unavailable; the file sits in the local fallback cache.
    CachedLocally { local_path: String, error: String },
    /// Both the upload and the fallback write failed; the bytes are gone.
    Lost { error: String },
}

/// Coordinates "try distributed store, else fall back to local cache".
pub struct UploadCoordinator {
    store: StoreHandle,
    cache: LocalCache,
    remote_root: String,
}

impl UploadCoordinator {
    pub fn new(store: StoreHandle, cache: LocalCache, remote_root: impl Into<String>) -> Self {
        UploadCoordinator {
            store,
            cache,
            remote_root: remote_root.into(),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Deterministic HDFS target path for a record's attachment:
    /// `{root}/{record-id}_{basename(filename)}`.
    pub fn remote_path(&self, record_id: i32, filename: &str) -> String {
        format!(
            "{}/{}_{}",
            self.remote_root,
            record_id,
            file_basename(filename)
        )
    }

    /// HDFS target path for a cached entry, re-derived from the cache file
    /// name (which already carries the record-id prefix).
    pub fn remote_path_for_entry(&self, entry_name: &str) -> String {
        format!("{}/{}", self.remote_root, entry_name)
    }

    /// Best-effort creation of the uploads root. "Already exists" is the
    /// common case; every failure is swallowed because the subsequent write
    /// surfaces the real error anyway.
    async fn ensure_remote_root(&self) {
        match self.store.status(&self.remote_root).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => debug!("HDFS status probe for '{}' failed: {}", self.remote_root, e),
        }
        if let Err(e) = self.store.mkdirs(&self.remote_root).await {
            debug!("HDFS mkdirs for '{}' failed: {}", self.remote_root, e);
        }
    }

    /// Streamed write into HDFS, used for the initial attempt and reused by
    /// the retry reconciler.
    pub async fn upload_file(&self, hdfs_path: &str, source: &Path) -> AppResult<()> {
        self.ensure_remote_root().await;
        self.store.write(hdfs_path, source).await
    }

    /// Attempt to place a staged attachment into HDFS, demoting to the local
    /// cache on failure. Never returns an error: every outcome, including
    /// total loss, is reported as a value so the surrounding record creation
    /// can still succeed.
    pub async fn store_attachment(&self, record_id: i32, staged: StagedFile) -> AttachmentOutcome {
        let hdfs_path = self.remote_path(record_id, staged.filename());

        match self.upload_file(&hdfs_path, staged.path()).await {
            Ok(()) => {
                info!(
                    record_id,
                    hdfs_path = %hdfs_path,
                    size = staged.size(),
                    "Attachment uploaded to HDFS"
                );
                AttachmentOutcome::Uploaded { hdfs_path }
            }
            Err(e) => {
                let error = format!("HDFS upload failed: {}", e);
                warn!(record_id, "{}; demoting attachment to local cache", error);

                let (filename, temp) = staged.into_parts();
                match self.cache.install(temp, record_id, &filename) {
                    Ok(local_path) => AttachmentOutcome::CachedLocally {
                        local_path: local_path.display().to_string(),
                        error,
                    },
                    Err(cache_err) => AttachmentOutcome::Lost {
                        error: format!("{} (fallback cache write failed: {})", error, cache_err),
                    },
                }
            }
        }
    }
}
