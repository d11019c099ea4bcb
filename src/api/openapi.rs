//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wastemap Server",
        version = "0.3.1",
        description = "API server for recording geotagged waste reports with HDFS-backed file storage and a local fallback cache"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Waste record endpoints
        api::waste::create_waste,
        api::waste::list_waste,
        api::waste::get_waste,
        api::waste::update_waste,
        api::waste::delete_waste,
        api::waste::retry_upload,
        api::waste::get_waste_file,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Waste records
            models::UploadStatus,
            models::WasteResponse,
            models::CreateWasteResponse,
            models::UpdateWasteRequest,
            models::RetryResponse,
            models::DeleteResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Waste", description = "Waste record management and attachment persistence")
    )
)]
pub struct ApiDoc;
