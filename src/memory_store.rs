//! Process-local [`DocumentStore`] for tests and local runs without MongoDB.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::db::{DocumentStore, StorageError};

/// Keeps documents per collection in insertion order.
///
/// Reachability can be toggled with [`InMemoryStore::set_available`] to exercise
/// the unavailable-store paths.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<ObjectId, StorageError> {
        self.check_available()?;

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StorageError::Write("store lock poisoned".to_string()))?;
        let docs = collections.entry(collection.to_string()).or_default();

        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(StorageError::Write(format!(
                    "unsupported identity type: {:?}",
                    other.element_type()
                )))
            }
            None => ObjectId::new(),
        };
        if docs.iter().any(|d| d.get_object_id("_id").ok() == Some(id)) {
            return Err(StorageError::Write(format!("duplicate key: {}", id)));
        }

        document.insert("_id", id);
        docs.push(document);
        Ok(id)
    }

    async fn find_recent(
        &self,
        collection: &str,
        limit: u32,
    ) -> Result<Vec<Document>, StorageError> {
        self.check_available()?;

        let collections = self
            .collections
            .lock()
            .map_err(|_| StorageError::Read("store lock poisoned".to_string()))?;

        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().rev().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn assigns_unique_identities() {
        let store = InMemoryStore::new();
        let a = store.insert("lead", doc! {"name": "a"}).await.unwrap();
        let b = store.insert("lead", doc! {"name": "b"}).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("lead"), 2);
    }

    #[tokio::test]
    async fn newest_first_and_bounded() {
        let store = InMemoryStore::new();
        for n in 0..5 {
            store.insert("lead", doc! {"n": n}).await.unwrap();
        }
        let docs = store.find_recent("lead", 2).await.unwrap();
        let ns: Vec<i32> = docs.iter().map(|d| d.get_i32("n").unwrap()).collect();
        assert_eq!(ns, vec![4, 3]);
    }

    #[tokio::test]
    async fn rejects_duplicate_identity() {
        let store = InMemoryStore::new();
        let id = store.insert("lead", doc! {}).await.unwrap();
        let err = store.insert("lead", doc! {"_id": id}).await.unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
        assert_eq!(store.count("lead"), 1);
    }

    #[tokio::test]
    async fn switched_off_store_is_unavailable() {
        let store = InMemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.ping().await, Err(StorageError::Unavailable(_))));
        assert!(matches!(
            store.insert("lead", doc! {}).await,
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.count("lead"), 0);
    }
}
