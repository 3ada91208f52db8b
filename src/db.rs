use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::ErrorKind,
    options::ClientOptions,
    Client,
};
use std::time::Duration;

/// Failures of the document store, as seen by the rest of the service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The store could not be reached (or is not configured at all).
    #[error("database unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but rejected the write.
    #[error("write failed: {0}")]
    Write(String),
    /// The store was reached but the read failed or returned malformed data.
    #[error("read failed: {0}")]
    Read(String),
}

impl StorageError {
    fn from_driver(err: mongodb::error::Error, on_other: fn(String) -> StorageError) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. } => StorageError::Unavailable(err.to_string()),
            _ => on_other(err.to_string()),
        }
    }
}

/// Minimal document store surface the service depends on.
///
/// Implementations assign the identity of inserted documents; callers never
/// supply one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts `document` into `collection` and returns the identity assigned to it.
    async fn insert(&self, collection: &str, document: Document) -> Result<ObjectId, StorageError>;

    /// Returns at most `limit` documents, most recently inserted first.
    async fn find_recent(&self, collection: &str, limit: u32)
        -> Result<Vec<Document>, StorageError>;

    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// MongoDB-backed store.
pub struct Database {
    pub db: mongodb::Database,
}

impl Database {
    /// Builds the client. The driver connects lazily, so an unreachable server
    /// surfaces on the first operation rather than here.
    pub async fn new(
        database_url: &str,
        database_name: &str,
        server_selection_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(database_url).await?;
        options.app_name = Some("rust-broker-api".to_string());
        options.server_selection_timeout = Some(server_selection_timeout);

        let client = Client::with_options(options)?;

        Ok(Self {
            db: client.database(database_name),
        })
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn insert(&self, collection: &str, document: Document) -> Result<ObjectId, StorageError> {
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| StorageError::from_driver(e, StorageError::Write))?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            StorageError::Write(format!(
                "store returned a non-ObjectId identity: {}",
                result.inserted_id
            ))
        })
    }

    async fn find_recent(
        &self,
        collection: &str,
        limit: u32,
    ) -> Result<Vec<Document>, StorageError> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(doc! {})
            .sort(doc! { "_id": -1 })
            .limit(i64::from(limit))
            .await
            .map_err(|e| StorageError::from_driver(e, StorageError::Read))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| StorageError::from_driver(e, StorageError::Read))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.db
            .list_collection_names()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::from_driver(e, StorageError::Unavailable))
    }
}

/// Stand-in used when no connection string is configured. Every call fails.
pub struct UnconfiguredStore;

const NOT_CONFIGURED: &str = "Database not configured";

#[async_trait]
impl DocumentStore for UnconfiguredStore {
    async fn insert(&self, _collection: &str, _document: Document) -> Result<ObjectId, StorageError> {
        Err(StorageError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn find_recent(
        &self,
        _collection: &str,
        _limit: u32,
    ) -> Result<Vec<Document>, StorageError> {
        Err(StorageError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable(NOT_CONFIGURED.to_string()))
    }
}
