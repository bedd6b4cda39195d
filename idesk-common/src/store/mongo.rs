//! MongoDB-backed task store

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;
use tracing::debug;

use super::{FieldUpdate, TaskFilter, TaskStore, TaskStream};
use crate::db::MongoConnector;
use crate::task::{fields, id_to_bson, TaskRecord};
use crate::{Error, Result};

/// Task store over one collection, reached through the shared connector
#[derive(Debug, Clone)]
pub struct MongoTaskStore {
    connector: Arc<MongoConnector>,
    collection: String,
}

impl MongoTaskStore {
    pub fn new(connector: Arc<MongoConnector>, collection: impl Into<String>) -> Self {
        Self {
            connector,
            collection: collection.into(),
        }
    }

    async fn collection(&self) -> Result<Collection<Document>> {
        let db = self.connector.database().await?;
        Ok(db.collection::<Document>(&self.collection))
    }

    /// Pass a driver result through, dropping the cached connection first if
    /// the failure means the server went away
    async fn checked<T>(&self, result: mongodb::error::Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.connector.invalidate_on(&e).await;
                Err(Error::from(e))
            }
        }
    }
}

/// Update document for a single-field write
pub fn update_document(update: &FieldUpdate) -> Document {
    match update {
        FieldUpdate::Set { field, value } => doc! { "$set": { field.as_str(): value.as_str() } },
        FieldUpdate::Unset { field } => doc! { "$unset": { field.as_str(): "" } },
    }
}

/// `_id` filter for a set of identifiers
pub fn ids_filter(ids: &[String]) -> Document {
    let ids: Vec<Bson> = ids.iter().map(|id| id_to_bson(id)).collect();
    doc! { fields::ID: { "$in": ids } }
}

#[async_trait]
impl TaskStore for MongoTaskStore {
    async fn stream(&self, filter: TaskFilter) -> Result<TaskStream> {
        let query = filter.to_document();
        debug!(collection = %self.collection, query = %query, "Opening task cursor");

        let find = self.collection().await?.find(query).await;
        let cursor = self.checked(find).await?;

        let connector = Arc::clone(&self.connector);
        let tasks = cursor.then(move |item| {
            let connector = Arc::clone(&connector);
            async move {
                match item {
                    Ok(doc) => Ok(TaskRecord::new(doc)),
                    Err(e) => {
                        connector.invalidate_on(&e).await;
                        Err(Error::from(e))
                    }
                }
            }
        });
        Ok(tasks.boxed())
    }

    async fn update_one(&self, id: &str, update: FieldUpdate) -> Result<u64> {
        let update_result = self
            .collection()
            .await?
            .update_one(doc! { fields::ID: id_to_bson(id) }, update_document(&update))
            .await;
        let result = self.checked(update_result).await?;
        debug!(id, matched = result.matched_count, "update_one applied");
        Ok(result.matched_count)
    }

    async fn update_many(&self, ids: &[String], update: FieldUpdate) -> Result<u64> {
        let update_result = self
            .collection()
            .await?
            .update_many(ids_filter(ids), update_document(&update))
            .await;
        let result = self.checked(update_result).await?;
        debug!(
            requested = ids.len(),
            matched = result.matched_count,
            "update_many applied"
        );
        Ok(result.matched_count)
    }
}
