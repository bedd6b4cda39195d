//! Task store abstraction
//!
//! Handlers talk to a [`TaskStore`] instead of a MongoDB collection so the
//! HTTP layer can run against the in-memory adapter in tests. Reads hand back
//! a lazy [`TaskStream`]: the underlying cursor only advances when the stream
//! is polled, and dropping the stream releases the cursor.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::task::TaskRecord;
use crate::Result;

mod filter;
pub mod memory;
pub mod mongo;

pub use filter::TaskFilter;
pub use memory::MemoryTaskStore;
pub use mongo::MongoTaskStore;

/// Pull-based sequence of tasks backed by a database cursor
pub type TaskStream = BoxStream<'static, Result<TaskRecord>>;

/// A single-field write applied to one or many tasks
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// `$set` the field to a string value
    Set { field: String, value: String },
    /// `$unset` the field
    Unset { field: String },
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<String>) -> Self {
        Self::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn unset(field: &str) -> Self {
        Self::Unset {
            field: field.to_string(),
        }
    }

    /// `Some(value)` sets, `None` removes the field
    pub fn set_or_unset(field: &str, value: Option<String>) -> Self {
        match value {
            Some(value) => Self::set(field, value),
            None => Self::unset(field),
        }
    }
}

/// Read/write access to the task collection
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Open a cursor over all tasks matching `filter`, in store order
    async fn stream(&self, filter: TaskFilter) -> Result<TaskStream>;

    /// Apply `update` to the task with identifier `id`; returns the matched count
    async fn update_one(&self, id: &str, update: FieldUpdate) -> Result<u64>;

    /// Apply `update` to every task whose identifier is in `ids`; returns the
    /// matched count. Atomic per document only.
    async fn update_many(&self, ids: &[String], update: FieldUpdate) -> Result<u64>;
}
