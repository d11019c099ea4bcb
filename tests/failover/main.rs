//! Two-tier persistence failover test suite.
//!
//! Drives the upload coordinator, retry reconciler and unified reader
//! against an in-memory distributed store whose reachability can be toggled,
//! covering the create/fallback/retry/read lifecycle without requiring a
//! running HDFS cluster or database.
//!
//! Run with: cargo test --test failover

mod test_helpers;

mod test_create_fallback;
mod test_delete_cleanup;
mod test_reader;
