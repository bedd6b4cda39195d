//! # idesk Common Library
//!
//! Shared code for the Interview Support dashboard service and client:
//! - Task record access over raw MongoDB documents
//! - Round extraction, normalization and mismatch classification
//! - NDJSON encoding and incremental decoding
//! - Subject-line validation and branch reports
//! - Task store abstraction (MongoDB and in-memory)
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod mismatch;
pub mod ndjson;
pub mod report;
pub mod rounds;
pub mod store;
pub mod subject;
pub mod task;

pub use error::{Error, Result};
pub use mongodb::bson;
pub use mismatch::MismatchRecord;
pub use rounds::CANONICAL_ROUNDS;
pub use task::TaskRecord;
