// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! fittrack: personal fitness tracking on a hosted backend
//!
//! This crate provides typed access to the hosted session provider and
//! document store, an application state controller for a UI shell, and a
//! local JSON API exposing that controller.

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use controller::AppController;
use db::{DocumentStore, FirestoreStore, MemoryStore};
use error::StoreError;
use services::{
    AccessFacade, FixedLocationProvider, IdentityToolkitProvider, LocalSessionProvider,
    LocationProvider, SessionProvider,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub controller: Arc<AppController>,
}

impl AppState {
    /// Wire the backends selected by `config` into a controller.
    ///
    /// The session listener is not started here; call
    /// [`AppController::spawn_session_listener`] once a runtime is available.
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        let session: Arc<dyn SessionProvider> = match &config.firebase_api_key {
            Some(api_key) => {
                tracing::info!("Using Firebase Authentication");
                Arc::new(IdentityToolkitProvider::new(api_key.clone()))
            }
            None => {
                tracing::warn!("FIREBASE_API_KEY not set, using in-process accounts");
                Arc::new(LocalSessionProvider::new())
            }
        };

        let store: Arc<dyn DocumentStore> = match &config.gcp_project_id {
            Some(project_id) => Arc::new(FirestoreStore::new(project_id).await?),
            None => {
                tracing::warn!("GCP_PROJECT_ID not set, using in-memory document store");
                Arc::new(MemoryStore::new())
            }
        };

        let location: Arc<dyn LocationProvider> = match config.device_fix {
            Some(fix) => Arc::new(FixedLocationProvider::new(fix)),
            None => Arc::new(FixedLocationProvider::unavailable()),
        };

        Ok(Self::with_backends(config, session, store, location))
    }

    pub fn with_backends(
        config: Config,
        session: Arc<dyn SessionProvider>,
        store: Arc<dyn DocumentStore>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        let facade = AccessFacade::new(session, store, location);
        let controller = Arc::new(AppController::new(facade, &config));
        Self { config, controller }
    }
}
