//! idesk terminal client
//!
//! Consumes the idesk-api NDJSON feeds incrementally and submits round and
//! status corrections with local optimistic state.

pub mod board;
pub mod client;

pub use board::MismatchBoard;
pub use client::{ApiClient, ClientError};
