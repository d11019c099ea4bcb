//! Local fallback cache for attachments that could not reach HDFS.
//!
//! Not a performance cache: entries are the only copy of at-risk bytes and
//! stay until a retry promotes them to the distributed store or the record
//! is deleted. Entries are keyed `{record-id}_{basename(filename)}` under
//! the configured root. Writes go through a staging subdirectory on the same
//! filesystem so installing an entry is an atomic rename and concurrent
//! readers never observe a partial file.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Reduce an uploaded filename to its final path component.
///
/// Multipart clients may send full paths (and Windows separators); only the
/// basename participates in cache keys and HDFS target paths.
pub fn file_basename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("file")
}

/// Local fallback cache rooted at a configured directory.
#[derive(Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalCache { root: root.into() }
    }

    /// Create the cache root and its staging subdirectory.
    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.staging_dir())
            .await
            .map_err(|e| {
                AppError::FileSystem(format!(
                    "Failed to create upload cache directory '{}': {}",
                    self.root.display(),
                    e
                ))
            })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for in-flight staging files, on the same filesystem as the
    /// cache so installs are atomic renames.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(".staging")
    }

    /// Cache entry name for a record's attachment.
    pub fn entry_name(record_id: i32, filename: &str) -> String {
        format!("{}_{}", record_id, file_basename(filename))
    }

    /// Full path of a record's cache entry.
    pub fn entry_path(&self, record_id: i32, filename: &str) -> PathBuf {
        self.root.join(Self::entry_name(record_id, filename))
    }

    /// Move a staged file into the cache, replacing any previous entry.
    pub fn install(
        &self,
        staged: NamedTempFile,
        record_id: i32,
        filename: &str,
    ) -> AppResult<PathBuf> {
        let dest = self.entry_path(record_id, filename);
        staged.persist(&dest).map_err(|e| {
            AppError::FileSystem(format!(
                "Failed to move staged file into cache '{}': {}",
                dest.display(),
                e.error
            ))
        })?;

        info!("Cached attachment locally at {}", dest.display());
        Ok(dest)
    }

    /// Best-effort removal of a cache entry. A missing file is fine; it may
    /// already have been evicted by a successful retry.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!("Removed cached attachment {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove cached attachment {}: {}",
                path.display(),
                e
            ),
        }
    }
}
