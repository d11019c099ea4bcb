//! Business logic services.

pub mod hdfs;
pub mod local_cache;
pub mod reader;
pub mod record_locks;
pub mod retry;
pub mod store;
pub mod upload;

pub use hdfs::HdfsClient;
pub use local_cache::LocalCache;
pub use reader::{Attachment, FileReader};
pub use record_locks::RecordLocks;
pub use retry::{RetryOutcome, RetryReconciler};
pub use store::{ByteStream, DistributedStore, StoreHandle};
pub use upload::{AttachmentOutcome, StagedFile, UploadCoordinator};
