//! Retry reconciler: promotes locally-cached attachments into HDFS.
//!
//! Idempotent and re-invokable: callers (an operator, or a scheduled job)
//! can drive it repeatedly until promotion succeeds. A record with nothing
//! cached reports `NothingToRetry` rather than an error.

use std::path::Path;

use tracing::{info, warn};

use crate::entity::waste_record;
use crate::services::upload::UploadCoordinator;

/// Result of a reconciliation attempt.
#[derive(Debug)]
pub enum RetryOutcome {
    /// The cached file reached HDFS; the caller must persist the promotion
    /// and may then evict the cached copy.
    Promoted { hdfs_path: String },
    /// No cached file exists (already reconciled, or the record never had a
    /// failed upload).
    NothingToRetry,
    /// The store is still unreachable; the record stays `failed`.
    Failed { reason: String },
}

/// Re-attempts the distributed upload of a record's cached bytes.
pub struct RetryReconciler<'a> {
    coordinator: &'a UploadCoordinator,
}

impl<'a> RetryReconciler<'a> {
    pub fn new(coordinator: &'a UploadCoordinator) -> Self {
        RetryReconciler { coordinator }
    }

    /// Attempt promotion for one record. The caller serializes calls per
    /// record and applies the metadata transition on `Promoted`.
    pub async fn reconcile(&self, record: &waste_record::Model) -> RetryOutcome {
        let Some(local_path) = record.local_path.as_deref() else {
            return RetryOutcome::NothingToRetry;
        };

        let source = Path::new(local_path);
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return RetryOutcome::NothingToRetry;
        }

        let Some(entry_name) = source.file_name().and_then(|n| n.to_str()) else {
            return RetryOutcome::Failed {
                reason: format!("Cached path '{}' has no usable file name", local_path),
            };
        };
        let hdfs_path = self.coordinator.remote_path_for_entry(entry_name);

        match self.coordinator.upload_file(&hdfs_path, source).await {
            Ok(()) => {
                info!(
                    record_id = record.id,
                    hdfs_path = %hdfs_path,
                    "Retry promoted cached attachment to HDFS"
                );
                RetryOutcome::Promoted { hdfs_path }
            }
            Err(e) => {
                warn!(record_id = record.id, "Retry failed: {}", e);
                RetryOutcome::Failed {
                    reason: format!("Retry failed: {}", e),
                }
            }
        }
    }
}
