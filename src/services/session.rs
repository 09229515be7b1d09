// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session provider contract.
//!
//! The provider owns credentials and tokens. The rest of the app only sees the
//! current [`Identity`], pushed through a `watch` channel whenever the session
//! changes.

use crate::error::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// The signed-in account as reported by the session provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Subject ID; doubles as the user document ID
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Hosted identity service contract.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Stream of the current identity; `None` while signed out.
    fn current_session(&self) -> watch::Receiver<Option<Identity>>;

    /// Create an account and sign in as it.
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign in with email and password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign out. Publishes `None`.
    async fn end_session(&self) -> Result<(), AuthError>;

    /// Update the display name of the signed-in account.
    async fn set_display_name(&self, display_name: &str) -> Result<(), AuthError>;
}

/// Publisher side of the identity stream shared by provider implementations.
#[derive(Debug)]
pub struct SessionChannel {
    tx: watch::Sender<Option<Identity>>,
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Publish a new identity. Subscribers are only woken if it differs.
    pub fn publish(&self, identity: Option<Identity>) {
        self.tx.send_if_modified(|current| {
            if *current == identity {
                return false;
            }
            *current = identity;
            true
        });
    }

    /// Apply a change to the signed-in identity, if any.
    pub fn update_current(&self, f: impl FnOnce(&mut Identity)) {
        self.tx.send_if_modified(|current| match current {
            Some(identity) => {
                f(identity);
                true
            }
            None => false,
        });
    }
}
