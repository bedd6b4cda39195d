//! In-memory task store
//!
//! Holds documents in insertion order and evaluates [`TaskFilter`] in
//! process. Used by tests and by local demos without a MongoDB instance.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mongodb::bson::{Bson, Document};
use tokio::sync::RwLock;

use super::{FieldUpdate, TaskFilter, TaskStore, TaskStream};
use crate::task::{fields, id_to_bson, TaskRecord};
use crate::Result;

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: Vec<Document>) -> Self {
        Self {
            docs: RwLock::new(docs),
        }
    }

    pub async fn insert(&self, doc: Document) {
        self.docs.write().await.push(doc);
    }

    /// Current copy of the document with identifier `id`
    pub async fn get(&self, id: &str) -> Option<TaskRecord> {
        let wanted = id_to_bson(id);
        self.docs
            .read()
            .await
            .iter()
            .find(|doc| doc.get(fields::ID) == Some(&wanted))
            .cloned()
            .map(TaskRecord::new)
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    async fn apply<F>(&self, update: &FieldUpdate, mut selects: F) -> u64
    where
        F: FnMut(&Bson) -> bool,
    {
        let mut docs = self.docs.write().await;
        let mut matched = 0;

        for doc in docs.iter_mut() {
            if !doc.get(fields::ID).is_some_and(&mut selects) {
                continue;
            }
            matched += 1;
            match update {
                FieldUpdate::Set { field, value } => {
                    doc.insert(field.as_str(), value.as_str());
                }
                FieldUpdate::Unset { field } => {
                    doc.remove(field);
                }
            }
        }

        matched
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn stream(&self, filter: TaskFilter) -> Result<TaskStream> {
        let matching: Vec<Result<TaskRecord>> = self
            .docs
            .read()
            .await
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .map(|doc| Ok(TaskRecord::new(doc)))
            .collect();

        Ok(stream::iter(matching).boxed())
    }

    async fn update_one(&self, id: &str, update: FieldUpdate) -> Result<u64> {
        let wanted = id_to_bson(id);
        let mut seen = false;
        // update_one touches at most the first match
        let matched = self
            .apply(&update, |candidate| {
                if !seen && *candidate == wanted {
                    seen = true;
                    true
                } else {
                    false
                }
            })
            .await;
        Ok(matched)
    }

    async fn update_many(&self, ids: &[String], update: FieldUpdate) -> Result<u64> {
        let wanted: Vec<Bson> = ids.iter().map(|id| id_to_bson(id)).collect();
        Ok(self.apply(&update, |candidate| wanted.contains(candidate)).await)
    }
}
