//! Domain models for the waste report server.

pub mod waste_record;

// Re-export commonly used types
pub use waste_record::{
    CreateWasteResponse, DeleteResponse, RetryResponse, UpdateWasteRequest, UploadStatus,
    WasteResponse,
};
