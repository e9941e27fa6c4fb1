//! In-process document store.

use appointly_common::services::{
    BoxFuture, Document, DocumentStore, FieldFilter, Fields, ServiceError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type Collection = BTreeMap<String, Fields>;

/// A [`DocumentStore`] kept in a map of collection name to documents.
///
/// `create` checks and inserts under one lock, so it gives the same
/// at-most-once guarantee as Firestore's conditional create.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Collection>) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| ServiceError::failed("firestore", "memory store lock poisoned"))?;
        f(&mut collections)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> BoxFuture<'_, Option<Document>, ServiceError> {
        let result = self.with(|c| {
            Ok(c.get(collection)
                .and_then(|docs| docs.get(id))
                .map(|fields| Document::new(id, fields.clone())))
        });
        Box::pin(async move { result })
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> BoxFuture<'_, (), ServiceError> {
        let result = self.with(|c| {
            let docs = c.entry(collection.to_string()).or_default();
            match docs.get_mut(id) {
                Some(existing) if merge => existing.extend(fields),
                _ => {
                    docs.insert(id.to_string(), fields);
                }
            }
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> BoxFuture<'_, (), ServiceError> {
        let result = self.with(|c| {
            let docs = c.entry(collection.to_string()).or_default();
            if docs.contains_key(id) {
                return Err(ServiceError::AlreadyExists(format!("{}/{}", collection, id)));
            }
            docs.insert(id.to_string(), fields);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn query(
        &self,
        collection: &str,
        filter: FieldFilter,
    ) -> BoxFuture<'_, Vec<Document>, ServiceError> {
        let result = self.with(|c| {
            Ok(c.get(collection)
                .into_iter()
                .flatten()
                .filter(|(_, fields)| filter.matches(fields))
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect())
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "u1", fields(json!({"name": "Ada", "email": "ada@example.com"})), false)
            .await
            .unwrap();
        store
            .set("users", "u1", fields(json!({"role": "seller"})), true)
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Ada"));
        assert_eq!(doc.fields["role"], json!("seller"));

        store
            .set("users", "u1", fields(json!({"role": "buyer"})), false)
            .await
            .unwrap();
        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert!(doc.fields.get("name").is_none());
    }

    #[tokio::test]
    async fn test_create_is_conditional() {
        let store = MemoryDocumentStore::new();
        store
            .create("appointments", "s1_100", fields(json!({"buyerUid": "b1"})))
            .await
            .unwrap();
        let second = store
            .create("appointments", "s1_100", fields(json!({"buyerUid": "b2"})))
            .await;
        assert_eq!(
            second,
            Err(ServiceError::AlreadyExists("appointments/s1_100".to_string()))
        );
        let doc = store.get("appointments", "s1_100").await.unwrap().unwrap();
        assert_eq!(doc.fields["buyerUid"], json!("b1"));
    }

    #[tokio::test]
    async fn test_create_and_query() {
        let store = MemoryDocumentStore::new();
        store
            .create("appointments", "s1_100", fields(json!({"participants": ["s1", "b1"]})))
            .await
            .unwrap();
        store
            .create("appointments", "s2_100", fields(json!({"participants": ["s2", "b2"]})))
            .await
            .unwrap();

        let found = store
            .query("appointments", FieldFilter::array_contains("participants", "b1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "s1_100");
        assert_eq!(store.len("appointments"), 2);
        assert!(store.get("appointments", "missing").await.unwrap().is_none());
    }
}
