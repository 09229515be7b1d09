// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access facade over the session provider, document store, and location API.
//!
//! Translates raw documents into [`User`], [`Workout`], and [`Location`]
//! records and raw failures into [`AuthError`], [`StoreError`], and
//! [`LocationError`]. Holds no state of its own.

use crate::config::GeolocationOptions;
use crate::db::{self, Direction, Document, DocumentStore};
use crate::error::{AppError, AuthError, LocationError, StoreError};
use crate::models::{CapturedLocation, Location, RegisterForm, User, Workout, WorkoutForm};
use crate::services::geolocation::LocationProvider;
use crate::services::session::{Identity, SessionProvider};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

/// Field the workout list is ordered by.
const WORKOUT_ORDER_FIELD: &str = "date";
/// Field the location list is ordered by.
const LOCATION_ORDER_FIELD: &str = "timestamp";

/// Typed operations over the external services.
#[derive(Clone)]
pub struct AccessFacade {
    session: Arc<dyn SessionProvider>,
    store: Arc<dyn DocumentStore>,
    location: Arc<dyn LocationProvider>,
}

impl AccessFacade {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        store: Arc<dyn DocumentStore>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            session,
            store,
            location,
        }
    }

    /// Identity stream of the session provider.
    pub fn session_stream(&self) -> watch::Receiver<Option<Identity>> {
        self.session.current_session()
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Create an account, name it, and write its profile document.
    pub async fn register(&self, form: RegisterForm) -> Result<User, AppError> {
        let form = RegisterForm {
            email: form.email.trim().to_string(),
            password: form.password,
            username: form.username.trim().to_string(),
        };

        if let Err(errors) = form.validate() {
            let fields = errors.field_errors();
            let err = if fields.contains_key("email") {
                AuthError::InvalidEmail
            } else if fields.contains_key("password") {
                AuthError::WeakPassword
            } else {
                AuthError::MissingUsername
            };
            return Err(err.into());
        }

        let identity = self
            .session
            .create_account(&form.email, &form.password)
            .await?;

        if let Err(e) = self.session.set_display_name(&form.username).await {
            // The account exists either way; the store document carries the name.
            tracing::warn!(uid = %identity.uid, error = %e, "Failed to set display name");
        }

        let user = User::new(&identity, &form.username);
        self.store
            .set(&db::user_doc(&user.id), db::encode(&user)?, false)
            .await?;

        tracing::info!(uid = %user.id, "User registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.session.authenticate(email, password).await?;
        tracing::info!(uid = %identity.uid, "User logged in");
        Ok(identity)
    }

    /// End the session. Failures are logged, never surfaced.
    pub async fn logout(&self) {
        match self.session.end_session().await {
            Ok(()) => tracing::info!("User logged out"),
            Err(e) => tracing::error!(error = %e, "Logout failed"),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Fetch a user profile. `None` if no document exists.
    pub async fn get_user_data(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let path = db::user_doc(uid);
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(None);
        };

        let mut user: User = db::decode(&path, doc)?;
        let current = self.session.current_session().borrow().clone();
        if let Some(identity) = current.filter(|identity| identity.uid == uid) {
            user.fill_from_identity(&identity);
        }
        Ok(Some(user))
    }

    /// Profile for an established session, created with defaults if missing.
    ///
    /// The default is only ever written with a create-if-absent write, so an
    /// existing profile is never replaced. If the lookup fails the local
    /// default is returned without touching the store.
    pub async fn load_or_create_user(&self, identity: &Identity) -> User {
        match self.get_user_data(&identity.uid).await {
            Ok(Some(mut user)) => {
                user.fill_from_identity(identity);
                return user;
            }
            Ok(None) => {
                tracing::info!(uid = %identity.uid, "No profile document, creating default");
            }
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Profile load failed, using local default");
                return User::default_for(identity);
            }
        }

        let user = User::default_for(identity);
        let path = db::user_doc(&user.id);
        let write = match db::encode(&user) {
            Ok(doc) => self.store.create(&path, doc).await,
            Err(e) => Err(e),
        };
        match write {
            Ok(()) => user,
            Err(StoreError::AlreadyExists(_)) => {
                // Created concurrently; prefer the stored profile.
                match self.get_user_data(&identity.uid).await {
                    Ok(Some(mut stored)) => {
                        stored.fill_from_identity(identity);
                        stored
                    }
                    _ => user,
                }
            }
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Failed to persist default profile");
                user
            }
        }
    }

    /// Merge a new username into the profile document and the session profile.
    pub async fn update_user_profile(&self, uid: &str, username: &str) -> Result<(), AppError> {
        let username = username.trim();
        let form = crate::models::ProfileForm {
            username: username.to_string(),
        };
        if form.validate().is_err() {
            return Err(AppError::BadRequest(
                "Username must be between 1 and 64 characters.".to_string(),
            ));
        }

        let patch = fields(serde_json::json!({
            "username": username,
            "displayName": username,
        }));
        self.store.set(&db::user_doc(uid), patch, true).await?;

        if let Err(e) = self.session.set_display_name(username).await {
            tracing::warn!(uid, error = %e, "Failed to update session display name");
        }

        tracing::info!(uid, "Profile updated");
        Ok(())
    }

    /// Flip the premium flag. No billing happens here.
    pub async fn upgrade_to_premium(&self, uid: &str) -> Result<(), StoreError> {
        let patch = fields(serde_json::json!({ "isPremium": true }));
        self.store.set(&db::user_doc(uid), patch, true).await?;
        tracing::info!(uid, "Premium enabled");
        Ok(())
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// Workouts of a user, newest first.
    pub async fn load_workouts(&self, uid: &str) -> Result<Vec<Workout>, StoreError> {
        self.load_ordered(db::workouts_of(uid), WORKOUT_ORDER_FIELD)
            .await
    }

    /// Store a new workout and return its ID.
    pub async fn add_workout(&self, uid: &str, form: WorkoutForm) -> Result<String, AppError> {
        if let Err(errors) = form.validate() {
            let message = if errors.field_errors().contains_key("name") {
                "Please enter a workout name."
            } else {
                "Duration must be between 1 and 1440 minutes."
            };
            return Err(AppError::BadRequest(message.to_string()));
        }

        let workout = form.into_workout(Utc::now());
        if workout.name.is_empty() {
            return Err(AppError::BadRequest(
                "Please enter a workout name.".to_string(),
            ));
        }

        let id = self
            .store
            .add(&db::workouts_of(uid), db::encode(&workout)?)
            .await?;

        tracing::info!(uid, workout_id = %id, kind = %workout.kind, "Workout added");
        Ok(id)
    }

    pub async fn delete_workout(&self, uid: &str, workout_id: &str) -> Result<(), StoreError> {
        self.store
            .delete(&db::workouts_of(uid).doc(workout_id))
            .await?;
        tracing::info!(uid, workout_id, "Workout deleted");
        Ok(())
    }

    // ─── Location Operations ─────────────────────────────────────

    /// One position request, bounded by `options.timeout`.
    pub async fn capture_location(
        &self,
        options: &GeolocationOptions,
    ) -> Result<CapturedLocation, LocationError> {
        match tokio::time::timeout(options.timeout, self.location.current_position(options)).await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = options.timeout.as_millis() as u64, "Location request timed out");
                Err(LocationError::Timeout)
            }
        }
    }

    /// Saved locations of a user, newest capture first.
    pub async fn load_locations(&self, uid: &str) -> Result<Vec<Location>, StoreError> {
        self.load_ordered(db::locations_of(uid), LOCATION_ORDER_FIELD)
            .await
    }

    /// Persist a captured location with a fresh save timestamp; returns its ID.
    pub async fn save_location(
        &self,
        uid: &str,
        captured: &CapturedLocation,
    ) -> Result<String, StoreError> {
        let location = Location::from_capture(captured, Utc::now());
        let id = self
            .store
            .add(&db::locations_of(uid), db::encode(&location)?)
            .await?;

        tracing::info!(uid, location_id = %id, accuracy = location.accuracy, "Location saved");
        Ok(id)
    }

    pub async fn delete_location(&self, uid: &str, location_id: &str) -> Result<(), StoreError> {
        self.store
            .delete(&db::locations_of(uid).doc(location_id))
            .await?;
        tracing::info!(uid, location_id, "Location deleted");
        Ok(())
    }

    // ─── Helper Methods ──────────────────────────────────────────

    /// Query a sub-collection newest first, skipping documents that fail to decode.
    async fn load_ordered<T: DeserializeOwned>(
        &self,
        collection: db::CollectionPath,
        order_by: &str,
    ) -> Result<Vec<T>, StoreError> {
        let rows = self
            .store
            .query_ordered(&collection, order_by, Direction::Descending)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, doc) in rows {
            match db::decode(&collection.doc(&id), doc) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed document"),
            }
        }

        tracing::debug!(collection = %collection, count = records.len(), "Loaded records");
        Ok(records)
    }
}

/// Top-level fields of a JSON object literal, for merge writes.
fn fields(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}
