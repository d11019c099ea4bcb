//! Narrow client interface to the distributed filesystem.
//!
//! The upload coordinator, retry reconciler and unified reader all talk to
//! the store through this trait; the production implementation is the
//! WebHDFS client in [`crate::services::hdfs`]. Failures are plain
//! [`AppError`] values with no structured retry of their own.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::error::AppResult;

/// Chunked byte stream produced by a store read.
pub type ByteStream = BoxStream<'static, AppResult<Bytes>>;

/// Operations the persistence subsystem needs from the distributed store.
#[async_trait]
pub trait DistributedStore: Send + Sync {
    /// Check whether a path exists.
    async fn status(&self, path: &str) -> AppResult<bool>;

    /// Create a directory, including missing parents.
    async fn mkdirs(&self, path: &str) -> AppResult<()>;

    /// Stream the contents of a local file to `path`, overwriting any
    /// existing file.
    async fn write(&self, path: &str, source: &Path) -> AppResult<()>;

    /// Open `path` for reading as a chunked byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Delete `path`. Deleting an absent path is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;
}

/// Shared handle to a store implementation.
pub type StoreHandle = Arc<dyn DistributedStore>;
