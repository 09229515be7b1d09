// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used when no GCP project is configured and by the test suite. Semantics
//! follow Firestore: merges replace top-level fields, deletes of missing
//! documents succeed, and ordering compares timestamps chronologically.

use crate::db::{auto_id, CollectionPath, Direction, DocPath, Document, DocumentStore};
use crate::error::StoreError;
use crate::time_utils::parse_utc_rfc3339;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Documents keyed by collection, then by ID.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<CollectionPath, BTreeMap<String, Document>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a transport outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &CollectionPath) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id).cloned()))
    }

    async fn set(&self, path: &DocPath, doc: Document, merge: bool) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut docs = self.collections.entry(path.collection.clone()).or_default();
        if merge {
            if let Some(existing) = docs.get_mut(&path.id) {
                existing.extend(doc);
                return Ok(());
            }
        }
        docs.insert(path.id.clone(), doc);
        Ok(())
    }

    async fn create(&self, path: &DocPath, doc: Document) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut docs = self.collections.entry(path.collection.clone()).or_default();
        if docs.contains_key(&path.id) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        docs.insert(path.id.clone(), doc);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.ensure_online()?;
        if let Some(mut docs) = self.collections.get_mut(&path.collection) {
            docs.remove(&path.id);
        }
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, doc: Document) -> Result<String, StoreError> {
        self.ensure_online()?;
        let id = auto_id()?;
        self.collections
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), doc);
        Ok(id)
    }

    async fn query_ordered(
        &self,
        collection: &CollectionPath,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.ensure_online()?;
        let mut rows: Vec<(String, Document)> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|(_, a), (_, b)| {
            let ord = compare_fields(a.get(order_by), b.get(order_by));
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });

        Ok(rows)
    }
}

/// Missing fields sort first, then numbers, then strings (timestamps chronologically).
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (parse_utc_rfc3339(x), parse_utc_rfc3339(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
