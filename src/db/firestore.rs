// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Firestore implementation of [`DocumentStore`].
//!
//! Documents are addressed as:
//! - `users/{uid}` (profiles)
//! - `users/{uid}/workouts/{id}`
//! - `users/{uid}/locations/{id}`

use crate::db::{auto_id, CollectionPath, Direction, DocPath, Document, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Read(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Read(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All operations return [`StoreError::NotConnected`].
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::NotConnected)
    }

    /// Full resource path of the document that owns `collection`.
    fn parent_of(client: &firestore::FirestoreDb, collection: &CollectionPath) -> String {
        match &collection.parent {
            Some((col, id)) => format!("{}/{}/{}", client.get_documents_path(), col, id),
            None => client.get_documents_path().to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let client = self.get_client()?;
        let parent = Self::parent_of(client, &path.collection);

        client
            .fluent()
            .select()
            .by_id_in(&path.collection.name)
            .parent(&parent)
            .obj()
            .one(&path.id)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn set(&self, path: &DocPath, doc: Document, merge: bool) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let parent = Self::parent_of(client, &path.collection);

        let update = if merge {
            // Only the given top-level fields are masked in; everything else stays.
            let fields: Vec<String> = doc.keys().cloned().collect();
            client.fluent().update().fields(fields)
        } else {
            client.fluent().update()
        };

        let _: () = update
            .in_col(&path.collection.name)
            .document_id(&path.id)
            .parent(&parent)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        tracing::debug!(path = %path, merge, "Document written");
        Ok(())
    }

    async fn create(&self, path: &DocPath, doc: Document) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let parent = Self::parent_of(client, &path.collection);

        let result: Result<(), _> = client
            .fluent()
            .insert()
            .into(&path.collection.name)
            .document_id(&path.id)
            .parent(&parent)
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(path = %path, "Document created");
                Ok(())
            }
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                Err(StoreError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(StoreError::Write(e.to_string())),
        }
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let parent = Self::parent_of(client, &path.collection);

        client
            .fluent()
            .delete()
            .from(&path.collection.name)
            .document_id(&path.id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        tracing::debug!(path = %path, "Document deleted");
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, doc: Document) -> Result<String, StoreError> {
        let id = auto_id()?;
        self.set(&collection.doc(&id), doc, false).await?;
        Ok(id)
    }

    async fn query_ordered(
        &self,
        collection: &CollectionPath,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let client = self.get_client()?;
        let parent = Self::parent_of(client, collection);

        let direction = match direction {
            Direction::Ascending => firestore::FirestoreQueryDirection::Ascending,
            Direction::Descending => firestore::FirestoreQueryDirection::Descending,
        };

        let docs = client
            .fluent()
            .select()
            .from(collection.name.as_str())
            .parent(&parent)
            .order_by([(order_by, direction)])
            .query()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
            match firestore::FirestoreDb::deserialize_doc_to::<Document>(&doc) {
                Ok(body) => rows.push((id, body)),
                Err(e) => {
                    tracing::warn!(collection = %collection, id = %id, error = %e, "Skipping unreadable document");
                }
            }
        }

        Ok(rows)
    }
}
