use mongodb::bson::{self, Bson, DateTime, Document};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::db::{DocumentStore, StorageError};
use crate::models::StoredDocument;
use crate::validation::ListLimit;

/// Field holding the store-assigned identity.
pub const ID_FIELD: &str = "_id";
/// Server-side insertion timestamp stamped on every created document.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Persistence adapter between validated records and the document store.
///
/// Cheap to clone; all clones share the same store handle.
#[derive(Clone)]
pub struct DocumentStorage {
    store: Arc<dyn DocumentStore>,
}

impl DocumentStorage {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a validated record and return its identity as a hex string.
    ///
    /// Any `_id` the record might carry is discarded; identity is always
    /// assigned by the store.
    pub async fn create<R: Serialize>(
        &self,
        collection: &str,
        record: &R,
    ) -> Result<String, StorageError> {
        let mut document = bson::to_document(record)
            .map_err(|e| StorageError::Write(format!("record is not a document: {}", e)))?;
        document.remove(ID_FIELD);
        document.insert(CREATED_AT_FIELD, DateTime::now());

        let id = self.store.insert(collection, document).await?;
        tracing::debug!("Inserted document {} into '{}'", id, collection);

        Ok(id.to_hex())
    }

    /// Most recent documents of `collection`, with identities as strings.
    pub async fn list(
        &self,
        collection: &str,
        limit: ListLimit,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let documents = self.store.find_recent(collection, limit.get()).await?;

        documents
            .into_iter()
            .take(limit.get() as usize)
            .map(to_stored_document)
            .collect()
    }

    /// Lightweight reachability probe.
    pub async fn ping(&self) -> Result<(), StorageError> {
        self.store.ping().await
    }
}

/// Converts a raw document into its transport form.
///
/// The identity must be present. It is rendered as a hex string when it is an
/// ObjectId and as its plain JSON form otherwise.
pub fn to_stored_document(mut document: Document) -> Result<StoredDocument, StorageError> {
    let id = match document.remove(ID_FIELD) {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s,
        Some(other) => match normalize_bson(other) {
            Value::String(s) => s,
            value => value.to_string(),
        },
        None => {
            return Err(StorageError::Read(
                "document without identity returned by store".to_string(),
            ))
        }
    };

    let fields: Map<String, Value> = document
        .into_iter()
        .map(|(key, value)| (key, normalize_bson(value)))
        .collect();

    Ok(StoredDocument { id, fields })
}

/// Renders a BSON value as plain JSON, with no store-internal types left.
///
/// ObjectIds become hex strings and datetimes RFC 3339 strings, at any depth.
/// Everything else uses relaxed extended JSON.
pub fn normalize_bson(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, normalize_bson(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(normalize_bson).collect()),
        other => other.into_relaxed_extjson(),
    }
}
