// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::services::session::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Username given to profiles created without one.
pub const DEFAULT_USERNAME: &str = "User";

/// User profile stored at `users/{uid}`.
///
/// Every field has a default so partially written documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Session subject ID (also the document ID)
    pub id: String,
    #[serde(deserialize_with = "crate::db::lenient::or_default")]
    pub email: String,
    #[serde(deserialize_with = "crate::db::lenient::or_default")]
    pub username: String,
    /// Display name mirrored into the session profile
    #[serde(deserialize_with = "crate::db::lenient::or_default")]
    pub display_name: String,
    #[serde(
        serialize_with = "crate::time_utils::rfc3339_millis::serialize",
        deserialize_with = "crate::db::lenient::timestamp_or_epoch"
    )]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::db::lenient::or_default")]
    pub is_premium: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            email: String::new(),
            username: String::new(),
            display_name: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            is_premium: false,
        }
    }
}

impl User {
    /// Fresh profile for a newly registered account.
    pub fn new(identity: &Identity, username: &str) -> Self {
        Self {
            id: identity.uid.clone(),
            email: identity.email.clone(),
            username: username.to_string(),
            display_name: username.to_string(),
            created_at: identity.created_at,
            is_premium: false,
        }
    }

    /// Profile used when the store has no document for an established session.
    pub fn default_for(identity: &Identity) -> Self {
        let username = identity
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_username(&identity.email));
        Self::new(identity, &username)
    }

    /// Fill fields the stored document left empty from the session profile.
    pub fn fill_from_identity(&mut self, identity: &Identity) {
        self.id = identity.uid.clone();
        if self.email.is_empty() {
            self.email = identity.email.clone();
        }
        if self.username.is_empty() {
            self.username = identity
                .display_name
                .clone()
                .unwrap_or_else(|| default_username(&identity.email));
        }
        if self.display_name.is_empty() {
            self.display_name = self.username.clone();
        }
        if self.created_at == DateTime::<Utc>::UNIX_EPOCH {
            self.created_at = identity.created_at;
        }
    }
}

/// Local part of the email address, or [`DEFAULT_USERNAME`].
pub fn default_username(email: &str) -> String {
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .unwrap_or(DEFAULT_USERNAME)
        .to_string()
}

/// Registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub username: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Profile edit form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}
