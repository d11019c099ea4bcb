//! Unified reader: streams a record's attachment from whichever tier holds it.
//!
//! Decision order: a cached local copy wins (it stays readable while HDFS is
//! down), then the distributed store, then "no file attached". Streams are
//! chunked at 8 KiB so large attachments never sit in memory whole.

use futures_util::StreamExt;
use tokio_util::io::ReaderStream;

use crate::entity::waste_record;
use crate::error::{AppError, AppResult};
use crate::services::store::{ByteStream, StoreHandle};

/// Chunk size for streamed downloads.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// An opened attachment ready for streaming to the client.
pub struct Attachment {
    /// Download filename (the stored entry name, id-prefixed).
    pub filename: String,
    /// Media type inferred from the filename extension.
    pub media_type: &'static str,
    pub stream: ByteStream,
}

/// Tier-transparent attachment reader.
pub struct FileReader {
    store: StoreHandle,
}

impl FileReader {
    pub fn new(store: StoreHandle) -> Self {
        FileReader { store }
    }

    /// Open a record's attachment. Returns `None` when the record has no
    /// file in either tier.
    pub async fn open(&self, record: &waste_record::Model) -> AppResult<Option<Attachment>> {
        // A cached local copy is authoritative while it exists.
        if let Some(local_path) = record.local_path.as_deref() {
            match tokio::fs::File::open(local_path).await {
                Ok(file) => {
                    let filename = path_filename(local_path);
                    let media_type = media_type_for_filename(&filename);
                    let stream = ReaderStream::with_capacity(file, READ_CHUNK_SIZE)
                        .map(|chunk| {
                            chunk.map_err(|e| {
                                AppError::FileSystem(format!("Error reading local file: {}", e))
                            })
                        })
                        .boxed();
                    return Ok(Some(Attachment {
                        filename,
                        media_type,
                        stream,
                    }));
                }
                // Evicted between the DB read and now; fall through to HDFS.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::FileSystem(format!(
                        "Error reading local file '{}': {}",
                        local_path, e
                    )));
                }
            }
        }

        if let Some(hdfs_path) = record.hdfs_path.as_deref() {
            let stream = self.store.read(hdfs_path).await?;
            let filename = path_filename(hdfs_path);
            let media_type = media_type_for_filename(&filename);
            return Ok(Some(Attachment {
                filename,
                media_type,
                stream,
            }));
        }

        Ok(None)
    }
}

/// Final component of a stored path, for the download filename.
fn path_filename(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("attachment")
        .to_string()
}

/// Infer the media type for a file based on its extension.
pub fn media_type_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
