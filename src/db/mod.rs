//! Database layer: path-addressed JSON documents.
//!
//! The store is an external collaborator. [`FirestoreStore`] talks to Cloud
//! Firestore, [`MemoryStore`] keeps everything in-process for local runs and
//! tests. Records are translated to and from raw documents by [`encode`] and
//! [`decode`].

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Sub-collection under `users/{uid}`
    pub const WORKOUTS: &str = "workouts";
    /// Sub-collection under `users/{uid}`
    pub const LOCATIONS: &str = "locations";
}

/// Raw document body.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A collection, either top-level or nested under one parent document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    /// `(collection, document_id)` of the owning document
    pub parent: Option<(String, String)>,
    pub name: String,
}

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self {
            parent: None,
            name: name.to_string(),
        }
    }

    pub fn child(parent_collection: &str, parent_id: &str, name: &str) -> Self {
        Self {
            parent: Some((parent_collection.to_string(), parent_id.to_string())),
            name: name.to_string(),
        }
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some((col, id)) => write!(f, "{}/{}/{}", col, id, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A single document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// `users/{uid}`
pub fn user_doc(uid: &str) -> DocPath {
    CollectionPath::root(collections::USERS).doc(uid)
}

/// `users/{uid}/workouts`
pub fn workouts_of(uid: &str) -> CollectionPath {
    CollectionPath::child(collections::USERS, uid, collections::WORKOUTS)
}

/// `users/{uid}/locations`
pub fn locations_of(uid: &str) -> CollectionPath {
    CollectionPath::child(collections::USERS, uid, collections::LOCATIONS)
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Hosted document database contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` if it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Write a document. With `merge`, only the given top-level fields are replaced.
    async fn set(&self, path: &DocPath, doc: Document, merge: bool) -> Result<(), StoreError>;

    /// Write a document only if none exists at `path`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] otherwise; the stored document
    /// is left untouched.
    async fn create(&self, path: &DocPath, doc: Document) -> Result<(), StoreError>;

    /// Remove a document. Missing documents are not an error.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Append a document under a store-assigned ID and return that ID.
    async fn add(&self, collection: &CollectionPath, doc: Document) -> Result<String, StoreError>;

    /// All documents of a collection ordered by one field, as `(id, body)` pairs.
    async fn query_ordered(
        &self,
        collection: &CollectionPath,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<(String, Document)>, StoreError>;
}

/// Serialize a record into a document body. The `id` field lives in the path.
pub fn encode<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(mut doc)) => {
            doc.remove("id");
            Ok(doc)
        }
        Ok(other) => Err(StoreError::Write(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::Write(e.to_string())),
    }
}

/// Decode a document body into a record, filling in `id` and any missing fields.
pub fn decode<T: DeserializeOwned>(path: &DocPath, mut doc: Document) -> Result<T, StoreError> {
    doc.insert("id".to_string(), serde_json::Value::String(path.id.clone()));
    serde_json::from_value(serde_json::Value::Object(doc)).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Field decoders that fall back to a default instead of failing the record.
///
/// Used on profile fields, where one field of the wrong type must not make
/// the whole document unreadable.
pub mod lenient {
    use chrono::{DateTime, Utc};
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Decode the field as `T`, or use `T::default()` on a type mismatch.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).unwrap_or_default())
    }

    /// Decode an RFC3339 timestamp, or the Unix epoch if the field is not one.
    pub fn timestamp_or_epoch<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(crate::time_utils::parse_utc_rfc3339)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }
}

/// Firestore-style auto ID: 20 random alphanumeric characters.
pub fn auto_id() -> Result<String, StoreError> {
    use ring::rand::{SecureRandom, SystemRandom};

    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut bytes = [0u8; 20];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| StoreError::Write("failed to generate document id".to_string()))?;

    Ok(bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Workout;

    #[test]
    fn test_paths_display() {
        assert_eq!(user_doc("u1").to_string(), "users/u1");
        assert_eq!(workouts_of("u1").to_string(), "users/u1/workouts");
        assert_eq!(locations_of("u1").doc("l9").to_string(), "users/u1/locations/l9");
    }

    #[test]
    fn test_encode_strips_id_and_decode_restores_it() {
        let workout = Workout {
            id: "abc".to_string(),
            name: "Run".to_string(),
            kind: "Cardio".to_string(),
            duration: 30,
            ..Default::default()
        };

        let doc = encode(&workout).unwrap();
        assert!(!doc.contains_key("id"));
        assert_eq!(doc["type"], "Cardio");

        let decoded: Workout = decode(&workouts_of("u1").doc("xyz"), doc).unwrap();
        assert_eq!(decoded.id, "xyz");
        assert_eq!(decoded.name, "Run");
    }

    #[test]
    fn test_decode_reports_path_on_bad_field() {
        let mut doc = Document::new();
        doc.insert("duration".to_string(), serde_json::json!("thirty"));

        let err = decode::<Workout>(&workouts_of("u1").doc("bad"), doc).unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref path, .. } if path == "users/u1/workouts/bad"));
    }

    #[test]
    fn test_auto_id_shape() {
        let a = auto_id().unwrap();
        let b = auto_id().unwrap();
        assert_eq!(a.len(), 20);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
