// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observable view state.

use crate::models::{CapturedLocation, Location, User, Workout};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Screen the UI shell should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Page {
    #[default]
    Auth,
    Dashboard,
    Workouts,
    Locations,
    Profile,
}

/// Transient per-form feedback. At most one error and one success per form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Messages {
    pub auth_error: Option<String>,
    pub workout_error: Option<String>,
    pub workout_success: Option<String>,
    pub location_error: Option<String>,
    pub location_success: Option<String>,
    pub profile_error: Option<String>,
    pub profile_success: Option<String>,
    pub premium_error: Option<String>,
    pub premium_success: Option<String>,
}

/// Everything a renderer needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ViewState {
    pub page: Page,
    pub user: Option<User>,
    /// Newest first
    pub workouts: Vec<Workout>,
    /// Newest first
    pub locations: Vec<Location>,
    /// Last capture, not yet saved
    pub current_location: Option<CapturedLocation>,
    pub messages: Messages,
    pub is_capturing: bool,
    pub is_upgrading: bool,
}

impl ViewState {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Forget everything that belongs to the signed-in user.
    pub fn clear_user_scope(&mut self) {
        self.user = None;
        self.workouts.clear();
        self.locations.clear();
        self.current_location = None;
        self.is_capturing = false;
        self.is_upgrading = false;
        self.messages = Messages {
            auth_error: self.messages.auth_error.take(),
            ..Messages::default()
        };
        self.page = Page::Auth;
    }
}
