//! Database queries for waste records.
//!
//! The tier-transition updates (`mark_uploaded`, `mark_failed`) always set
//! one path column and clear the other in the same UPDATE, so a record never
//! claims two authoritative copies of its file.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

use crate::entity::waste_record::{self, ActiveModel, Entity as WasteRecord};
use crate::error::{AppError, AppResult};
use crate::models::{UpdateWasteRequest, UploadStatus};

use super::DbPool;

/// Fields for a new record; attachment tier fields start unset.
#[derive(Debug, Clone)]
pub struct NewWasteRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub name: Option<String>,
    pub custom_id: Option<String>,
    pub quantity: i32,
    pub status: String,
}

impl DbPool {
    /// Insert a new waste record.
    pub async fn insert_record(&self, new: NewWasteRecord) -> AppResult<waste_record::Model> {
        let model = ActiveModel {
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            description: Set(new.description),
            name: Set(new.name),
            custom_id: Set(new.custom_id),
            quantity: Set(new.quantity),
            status: Set(new.status),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert waste record: {}", e)))?;

        Ok(result)
    }

    /// Get a record by ID.
    pub async fn get_record(&self, id: i32) -> AppResult<Option<waste_record::Model>> {
        let result = WasteRecord::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get waste record: {}", e)))?;

        Ok(result)
    }

    /// Get a record by ID, or a NotFound error.
    pub async fn require_record(&self, id: i32) -> AppResult<waste_record::Model> {
        self.get_record(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Waste record {}", id)))
    }

    /// List all records, oldest first.
    pub async fn list_records(&self) -> AppResult<Vec<waste_record::Model>> {
        let records = WasteRecord::find()
            .order_by_asc(waste_record::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list waste records: {}", e)))?;

        Ok(records)
    }

    /// Apply a partial metadata update; absent fields are left unchanged.
    pub async fn update_record(
        &self,
        id: i32,
        update: &UpdateWasteRequest,
    ) -> AppResult<waste_record::Model> {
        let record = self.require_record(id).await?;

        let mut active: ActiveModel = record.into();
        if let Some(latitude) = update.latitude {
            active.latitude = Set(latitude);
        }
        if let Some(longitude) = update.longitude {
            active.longitude = Set(longitude);
        }
        if let Some(ref description) = update.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(ref name) = update.name {
            active.name = Set(Some(name.clone()));
        }
        if let Some(ref custom_id) = update.custom_id {
            active.custom_id = Set(Some(custom_id.clone()));
        }
        if let Some(quantity) = update.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(ref status) = update.status {
            active.status = Set(status.clone());
        }

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update waste record: {}", e)))?;

        Ok(result)
    }

    /// Record that the file now lives in HDFS; any cached copy is no longer
    /// authoritative.
    pub async fn mark_uploaded(
        &self,
        record: waste_record::Model,
        hdfs_path: &str,
    ) -> AppResult<waste_record::Model> {
        let mut active: ActiveModel = record.into();
        active.hdfs_path = Set(Some(hdfs_path.to_string()));
        active.local_path = Set(None);
        active.upload_status = Set(Some(UploadStatus::Uploaded.as_str().to_string()));

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark record uploaded: {}", e)))?;

        Ok(result)
    }

    /// Record that the upload failed; `local_path` is None when even the
    /// fallback write failed and the bytes were lost.
    pub async fn mark_failed(
        &self,
        record: waste_record::Model,
        local_path: Option<&str>,
    ) -> AppResult<waste_record::Model> {
        let mut active: ActiveModel = record.into();
        active.hdfs_path = Set(None);
        active.local_path = Set(local_path.map(String::from));
        active.upload_status = Set(Some(UploadStatus::Failed.as_str().to_string()));

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark record failed: {}", e)))?;

        Ok(result)
    }

    /// Delete a record. Returns false if it did not exist.
    pub async fn delete_record(&self, id: i32) -> AppResult<bool> {
        let result = WasteRecord::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete waste record: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
