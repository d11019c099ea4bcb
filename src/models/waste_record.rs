//! Waste record domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::waste_record;

/// Lifecycle of a record's attached file.
///
/// `Pending` exists only transiently while the initial upload attempt is in
/// flight; every persisted record with a file ends up `Uploaded` or `Failed`.
/// The only transition out of `Failed` is a successful retry; there is no
/// transition out of `Uploaded` except record deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploaded,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
        }
    }

    /// Parse from the stored column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "uploaded" => Some(Self::Uploaded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A waste record as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WasteResponse {
    pub id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub name: Option<String>,
    pub custom_id: Option<String>,
    pub quantity: i32,
    pub status: String,
    /// Path in HDFS, set iff the file currently lives there.
    pub hdfs_path: Option<String>,
    pub upload_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<waste_record::Model> for WasteResponse {
    fn from(record: waste_record::Model) -> Self {
        WasteResponse {
            id: record.id,
            latitude: record.latitude,
            longitude: record.longitude,
            description: record.description,
            name: record.name,
            custom_id: record.custom_id,
            quantity: record.quantity,
            status: record.status,
            hdfs_path: record.hdfs_path,
            upload_status: record.upload_status,
            created_at: record.created_at,
        }
    }
}

/// Response for record creation.
///
/// Creation reports success even when the attachment could not reach HDFS;
/// `hdfs_error` carries the diagnostic in that case and `upload_status` shows
/// which tier holds the file.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateWasteResponse {
    #[serde(flatten)]
    pub record: WasteResponse,
    /// Diagnostic when the HDFS upload failed; null on success.
    pub hdfs_error: Option<String>,
}

/// Partial metadata update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateWasteRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub custom_id: Option<String>,
    pub quantity: Option<i32>,
    pub status: Option<String>,
}

impl UpdateWasteRequest {
    /// True when no field was provided.
    pub fn is_empty(&self) -> bool {
        self.latitude.is_none()
            && self.longitude.is_none()
            && self.description.is_none()
            && self.name.is_none()
            && self.custom_id.is_none()
            && self.quantity.is_none()
            && self.status.is_none()
    }
}

/// Response for the retry endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct RetryResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdfs_path: Option<String>,
}

/// Response for record deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}
