//! MongoDB connection cache
//!
//! One client per process, created on first use and shared by every request.
//! A cached handle that has not been verified for [`RECHECK_INTERVAL`] is
//! pinged before it is handed out; if the ping fails the cache is dropped and
//! a fresh client is built. Store operations that fail with a connection
//! error also drop the cache. A failed connect leaves the cache empty so the
//! next request tries again.

use std::time::{Duration, Instant};

use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::{Client, Database};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::Result;

/// How long a verified handle is trusted without another ping
pub const RECHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedDatabase {
    db: Database,
    verified_at: Instant,
}

#[derive(Debug)]
pub struct MongoConnector {
    uri: String,
    database_name: String,
    recheck_interval: Duration,
    cached: Mutex<Option<CachedDatabase>>,
}

impl MongoConnector {
    /// Create a connector; no connection is made until [`Self::database`]
    pub fn new(uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.into(),
            recheck_interval: RECHECK_INTERVAL,
            cached: Mutex::new(None),
        }
    }

    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Cached database handle, connecting (and pinging) on first use
    pub async fn database(&self) -> Result<Database> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_mut() {
            if entry.verified_at.elapsed() < self.recheck_interval {
                return Ok(entry.db.clone());
            }

            match ping(&entry.db).await {
                Ok(()) => {
                    debug!(database = %self.database_name, "Cached MongoDB connection re-verified");
                    entry.verified_at = Instant::now();
                    return Ok(entry.db.clone());
                }
                Err(e) => {
                    warn!(
                        database = %self.database_name,
                        "Cached MongoDB connection failed its ping, reconnecting: {}", e
                    );
                    *cached = None;
                }
            }
        }

        let client = Client::with_uri_str(&self.uri).await?;
        let db = client.database(&self.database_name);
        ping(&db).await?;

        info!(database = %self.database_name, "✓ Connected to MongoDB");
        *cached = Some(CachedDatabase {
            db: db.clone(),
            verified_at: Instant::now(),
        });
        Ok(db)
    }

    /// Drop the cached handle; the next [`Self::database`] call reconnects
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            info!(database = %self.database_name, "MongoDB connection cache invalidated");
        }
    }

    /// Invalidate when `error` means the server is unreachable
    pub async fn invalidate_on(&self, error: &mongodb::error::Error) {
        if is_connection_error(error) {
            self.invalidate().await;
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}

async fn ping(db: &Database) -> mongodb::error::Result<()> {
    db.run_command(doc! { "ping": 1 }).await.map(|_| ())
}

/// Errors after which the cached client should not be reused
pub fn is_connection_error(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}
