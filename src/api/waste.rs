//! Waste record API handlers.
//!
//! The create endpoint accepts a multipart form with an optional attachment
//! and always reports success when the metadata write succeeds, even if the
//! attachment could not reach HDFS; the failure is visible in
//! `upload_status` and `hdfs_error` instead of the HTTP status.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, post, put, web};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::db::DbPool;
use crate::db::waste_records::NewWasteRecord;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateWasteResponse, DeleteResponse, RetryResponse, UpdateWasteRequest, WasteResponse,
};
use crate::services::{
    AttachmentOutcome, FileReader, RecordLocks, RetryOutcome, RetryReconciler, StagedFile,
    UploadCoordinator,
};

// ============================================================================
// Multipart form parsing
// ============================================================================

/// Parsed `POST /waste` multipart form.
#[derive(Default)]
struct WasteForm {
    latitude: Option<f64>,
    longitude: Option<f64>,
    description: Option<String>,
    name: Option<String>,
    custom_id: Option<String>,
    quantity: Option<i32>,
    status: Option<String>,
    file: Option<StagedFile>,
}

/// Read a text field into a string.
async fn read_text_field(field: &mut actix_multipart::Field) -> AppResult<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data)
        .map_err(|_| AppError::InvalidInput("Form field is not valid UTF-8".to_string()))
}

/// Stream a file field into a staging temp file, enforcing the size limit.
///
/// The temp file lives in the cache's staging directory and is removed on
/// drop, so an aborted upload never leaves a stray file behind.
async fn stage_file_field(
    field: &mut actix_multipart::Field,
    filename: String,
    staging_dir: &std::path::Path,
    max_upload_size: usize,
) -> AppResult<StagedFile> {
    let temp = tempfile::NamedTempFile::new_in(staging_dir)
        .map_err(|e| AppError::FileSystem(format!("Failed to create staging file: {}", e)))?;
    let reopened = temp
        .reopen()
        .map_err(|e| AppError::FileSystem(format!("Failed to open staging file: {}", e)))?;
    let mut out = tokio::fs::File::from_std(reopened);

    let mut size: u64 = 0;
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::InvalidInput(format!("Multipart read error: {}", e)))?;
        size += chunk.len() as u64;
        if size > max_upload_size as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "Attachment exceeds the {} byte upload limit",
                max_upload_size
            )));
        }
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to write staging file: {}", e)))?;
    }
    out.flush()
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to flush staging file: {}", e)))?;

    Ok(StagedFile::new(filename, temp, size))
}

fn parse_float(value: &str, field: &'static str) -> AppResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::InvalidInput(format!("{} must be a valid number", field)))
}

fn parse_int(value: &str, field: &'static str) -> AppResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidInput(format!("{} must be a valid integer", field)))
}

/// Process the create form field by field.
async fn parse_waste_form(
    payload: &mut Multipart,
    staging_dir: &std::path::Path,
    max_upload_size: usize,
) -> AppResult<WasteForm> {
    let mut form = WasteForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(String::from),
                cd.get_filename().map(String::from),
            ),
            None => continue,
        };
        let Some(name) = name else {
            continue;
        };

        match name.as_str() {
            "latitude" => {
                let value = read_text_field(&mut field).await?;
                form.latitude = Some(parse_float(&value, "latitude")?);
            }
            "longitude" => {
                let value = read_text_field(&mut field).await?;
                form.longitude = Some(parse_float(&value, "longitude")?);
            }
            "description" => form.description = Some(read_text_field(&mut field).await?),
            "name" => form.name = Some(read_text_field(&mut field).await?),
            "custom_id" => form.custom_id = Some(read_text_field(&mut field).await?),
            "quantity" => {
                let value = read_text_field(&mut field).await?;
                form.quantity = Some(parse_int(&value, "quantity")?);
            }
            "status" => form.status = Some(read_text_field(&mut field).await?),
            "file" => {
                let Some(filename) = filename else {
                    continue;
                };
                form.file =
                    Some(stage_file_field(&mut field, filename, staging_dir, max_upload_size).await?);
            }
            // Unknown fields are drained and ignored
            _ => {
                let _ = read_text_field(&mut field).await;
            }
        }
    }

    Ok(form)
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a waste record, optionally with an attached file.
///
/// Returns 201 with the record even when the attachment could not reach
/// HDFS; in that case `upload_status` is `failed` and `hdfs_error` carries
/// the diagnostic.
#[utoipa::path(
    post,
    path = "/waste",
    tag = "Waste",
    responses(
        (status = 201, description = "Record created", body = CreateWasteResponse),
        (status = 400, description = "Missing or invalid fields")
    )
)]
#[post("/waste")]
pub async fn create_waste(
    mut payload: Multipart,
    pool: web::Data<DbPool>,
    coordinator: web::Data<UploadCoordinator>,
    locks: web::Data<RecordLocks>,
    max_upload_size: web::Data<usize>,
) -> AppResult<HttpResponse> {
    let staging_dir = coordinator.cache().staging_dir();
    let form = parse_waste_form(&mut payload, &staging_dir, **max_upload_size).await?;

    // Geolocation is validated before any persistence or upload attempt
    let latitude = form
        .latitude
        .ok_or_else(|| AppError::InvalidInput("Missing required field: latitude".to_string()))?;
    let longitude = form
        .longitude
        .ok_or_else(|| AppError::InvalidInput("Missing required field: longitude".to_string()))?;

    let mut record = pool
        .insert_record(NewWasteRecord {
            latitude,
            longitude,
            description: form.description,
            name: form.name,
            custom_id: form.custom_id,
            quantity: form.quantity.unwrap_or(0),
            status: form.status.unwrap_or_else(|| "new".to_string()),
        })
        .await?;

    info!(record_id = record.id, "Waste record created");

    let mut hdfs_error = None;
    if let Some(staged) = form.file {
        let _guard = locks.acquire(record.id).await;
        match coordinator.store_attachment(record.id, staged).await {
            AttachmentOutcome::Uploaded { hdfs_path } => {
                record = pool.mark_uploaded(record, &hdfs_path).await?;
            }
            AttachmentOutcome::CachedLocally { local_path, error } => {
                record = pool.mark_failed(record, Some(&local_path)).await?;
                hdfs_error = Some(error);
            }
            AttachmentOutcome::Lost { error } => {
                record = pool.mark_failed(record, None).await?;
                hdfs_error = Some(error);
            }
        }
    }

    Ok(HttpResponse::Created().json(CreateWasteResponse {
        record: record.into(),
        hdfs_error,
    }))
}

/// List all waste records (metadata only).
#[utoipa::path(
    get,
    path = "/waste",
    tag = "Waste",
    responses(
        (status = 200, description = "All records", body = [WasteResponse])
    )
)]
#[get("/waste")]
pub async fn list_waste(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let records = pool.list_records().await?;
    let response: Vec<WasteResponse> = records.into_iter().map(WasteResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Get a single waste record.
#[utoipa::path(
    get,
    path = "/waste/{id}",
    tag = "Waste",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "The record", body = WasteResponse),
        (status = 404, description = "Record not found")
    )
)]
#[get("/waste/{id}")]
pub async fn get_waste(path: web::Path<i32>, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let record = pool.require_record(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(WasteResponse::from(record)))
}

/// Partially update a record's metadata. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/waste/{id}",
    tag = "Waste",
    params(("id" = i32, Path, description = "Record ID")),
    request_body = UpdateWasteRequest,
    responses(
        (status = 200, description = "Updated record", body = WasteResponse),
        (status = 404, description = "Record not found")
    )
)]
#[put("/waste/{id}")]
pub async fn update_waste(
    path: web::Path<i32>,
    body: web::Json<UpdateWasteRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let record = pool.update_record(path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(WasteResponse::from(record)))
}

/// Delete a record and best-effort clean up its file in whichever tier
/// holds it. File cleanup failures are logged, never surfaced: orphaned
/// metadata is worse than an orphaned file.
#[utoipa::path(
    delete,
    path = "/waste/{id}",
    tag = "Waste",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteResponse),
        (status = 404, description = "Record not found")
    )
)]
#[delete("/waste/{id}")]
pub async fn delete_waste(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
    coordinator: web::Data<UploadCoordinator>,
    locks: web::Data<RecordLocks>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let guard = locks.acquire(id).await;
    let record = pool.require_record(id).await?;

    if let Some(hdfs_path) = record.hdfs_path.as_deref() {
        if let Err(e) = coordinator.store().delete(hdfs_path).await {
            warn!(
                record_id = id,
                "Failed to delete HDFS file '{}': {}", hdfs_path, e
            );
        }
    }
    if let Some(local_path) = record.local_path.as_deref() {
        coordinator
            .cache()
            .remove(std::path::Path::new(local_path))
            .await;
    }

    let deleted = pool.delete_record(id).await?;
    drop(guard);
    locks.forget(id);

    info!(record_id = id, "Waste record deleted");
    Ok(HttpResponse::Ok().json(DeleteResponse { deleted }))
}

/// Retry the HDFS upload of a record whose attachment is cached locally.
///
/// Idempotent: a record with nothing to promote answers
/// `{success: false, message: "No local file to retry"}`.
#[utoipa::path(
    post,
    path = "/waste/{id}/retry",
    tag = "Waste",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Retry outcome", body = RetryResponse),
        (status = 404, description = "Record not found")
    )
)]
#[post("/waste/{id}/retry")]
pub async fn retry_upload(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
    coordinator: web::Data<UploadCoordinator>,
    locks: web::Data<RecordLocks>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let _guard = locks.acquire(id).await;
    let record = pool.require_record(id).await?;

    let reconciler = RetryReconciler::new(coordinator.get_ref());
    let response = match reconciler.reconcile(&record).await {
        RetryOutcome::Promoted { hdfs_path } => {
            let local_path = record.local_path.clone();
            pool.mark_uploaded(record, &hdfs_path).await?;
            if let Some(local_path) = local_path {
                coordinator
                    .cache()
                    .remove(std::path::Path::new(&local_path))
                    .await;
            }
            RetryResponse {
                success: true,
                message: "Uploaded to HDFS".to_string(),
                hdfs_path: Some(hdfs_path),
            }
        }
        RetryOutcome::NothingToRetry => RetryResponse {
            success: false,
            message: "No local file to retry".to_string(),
            hdfs_path: None,
        },
        RetryOutcome::Failed { reason } => RetryResponse {
            success: false,
            message: reason,
            hdfs_path: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Stream a record's attached file from whichever tier currently holds it.
#[utoipa::path(
    get,
    path = "/waste/{id}/file",
    tag = "Waste",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Record or file not found")
    )
)]
#[get("/waste/{id}/file")]
pub async fn get_waste_file(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
    reader: web::Data<FileReader>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let record = pool.require_record(id).await?;

    match reader.open(&record).await? {
        Some(attachment) => Ok(HttpResponse::Ok()
            .content_type(attachment.media_type)
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", attachment.filename),
            ))
            .streaming(attachment.stream)),
        None => Err(AppError::NotFound(format!("File for waste record {}", id))),
    }
}

/// Configure waste record routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_waste)
        .service(list_waste)
        .service(retry_upload)
        .service(get_waste_file)
        .service(get_waste)
        .service(update_waste)
        .service(delete_waste);
}
