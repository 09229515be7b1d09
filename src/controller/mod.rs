// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application state controller.
//!
//! Owns the observable [`ViewState`], turns user actions into facade calls,
//! and follows the session provider's identity stream. Every failure ends up
//! as a message in the state; nothing here is fatal.

pub mod state;

pub use state::{Messages, Page, ViewState};

use crate::config::{Config, GeolocationOptions};
use crate::error::{AppError, AuthError};
use crate::models::{CapturedLocation, LoginForm, RegisterForm, WorkoutForm};
use crate::services::{AccessFacade, Identity};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

pub struct AppController {
    facade: AccessFacade,
    geolocation: GeolocationOptions,
    premium_delay: Duration,
    session: watch::Receiver<Option<Identity>>,
    state: watch::Sender<ViewState>,
    /// UID of the last session transition applied to the state.
    transition: Mutex<Option<String>>,
}

impl AppController {
    pub fn new(facade: AccessFacade, config: &Config) -> Self {
        let session = facade.session_stream();
        let (state, _rx) = watch::channel(ViewState::default());
        Self {
            facade,
            geolocation: config.geolocation,
            premium_delay: config.premium_upgrade_delay,
            session,
            state,
            transition: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// UID of the signed-in user as the state knows it.
    pub fn current_uid(&self) -> Option<String> {
        self.state.borrow().user.as_ref().map(|u| u.id.clone())
    }

    /// Confirm `uid` is still the signed-in user.
    ///
    /// A request admitted under one session must not act on the next one.
    pub fn check_session(&self, uid: &str) -> Result<(), AppError> {
        match self.current_uid() {
            Some(current) if current == uid => Ok(()),
            current => {
                tracing::warn!(uid, current = ?current, "Session changed during request");
                Err(AppError::Unauthorized)
            }
        }
    }

    pub fn facade(&self) -> &AccessFacade {
        &self.facade
    }

    // ─── Session ─────────────────────────────────────────────────

    /// Follow the identity stream until the provider goes away.
    pub fn spawn_session_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut rx = self.facade.session_stream();

        tokio::spawn(async move {
            loop {
                rx.borrow_and_update();
                controller.sync_session().await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Session stream closed");
        })
    }

    /// Bring the state in line with the provider's current identity.
    ///
    /// Idempotent: does nothing unless the signed-in UID changed since the
    /// last call.
    pub async fn sync_session(&self) {
        let mut handled = self.transition.lock().await;
        self.settle_session(&mut handled).await;
    }

    async fn settle_session(&self, handled: &mut Option<String>) {
        let identity = self.session.borrow().clone();
        let uid = identity.as_ref().map(|i| i.uid.clone());
        if *handled == uid {
            return;
        }

        match identity {
            Some(identity) => self.enter_session(&identity).await,
            None => {
                tracing::info!(previous = ?handled, "Session ended");
                self.state.send_modify(ViewState::clear_user_scope);
            }
        }
        *handled = uid;
    }

    async fn enter_session(&self, identity: &Identity) {
        tracing::info!(uid = %identity.uid, "Session established");

        let user = self.facade.load_or_create_user(identity).await;
        let workouts = self
            .facade
            .load_workouts(&identity.uid)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(uid = %identity.uid, error = %e, "Failed to load workouts");
                Vec::new()
            });
        let locations = self
            .facade
            .load_locations(&identity.uid)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(uid = %identity.uid, error = %e, "Failed to load locations");
                Vec::new()
            });

        self.state.send_modify(|state| {
            state.clear_user_scope();
            state.messages.auth_error = None;
            state.user = Some(user);
            state.workouts = workouts;
            state.locations = locations;
            state.page = Page::Dashboard;
        });
    }

    pub async fn register(&self, form: RegisterForm) -> Result<(), AppError> {
        let mut handled = self.transition.lock().await;
        let result = self.facade.register(form).await;
        self.settle_session(&mut handled).await;

        match result {
            Ok(_) => Ok(()),
            // The account exists and the session is live; only the profile write failed.
            Err(AppError::Store(e)) if handled.is_some() => {
                tracing::warn!(error = %e, "Account created without profile document");
                self.set_messages(|m| {
                    m.auth_error = None;
                    m.profile_error =
                        Some("Account created, but your profile could not be saved.".to_string());
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                self.set_messages(|m| {
                    m.auth_error = Some(user_message(&e, "Registration failed."))
                });
                Err(e)
            }
        }
    }

    pub async fn login(&self, form: LoginForm) -> Result<(), AppError> {
        let mut handled = self.transition.lock().await;
        let result = self.facade.login(&form.email, &form.password).await;
        self.settle_session(&mut handled).await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.set_messages(|m| m.auth_error = Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    pub async fn logout(&self) {
        let mut handled = self.transition.lock().await;
        self.facade.logout().await;
        self.settle_session(&mut handled).await;
    }

    // ─── Workouts ────────────────────────────────────────────────

    /// Add a workout, then reload the list from the store.
    pub async fn add_workout(&self, form: WorkoutForm) -> Result<String, AppError> {
        let uid = self.require_uid()?;
        self.set_messages(|m| {
            m.workout_error = None;
            m.workout_success = None;
        });

        match self.facade.add_workout(&uid, form).await {
            Ok(id) => {
                self.reload_workouts(&uid).await;
                self.set_messages(|m| m.workout_success = Some("Workout added successfully!".to_string()));
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Add workout failed");
                self.set_messages(|m| {
                    m.workout_error = Some(user_message(&e, "Failed to add workout. Please try again."))
                });
                Err(e)
            }
        }
    }

    /// Delete a workout, then reload the list once the delete has landed.
    pub async fn delete_workout(&self, workout_id: &str) -> Result<(), AppError> {
        let uid = self.require_uid()?;

        match self.facade.delete_workout(&uid, workout_id).await {
            Ok(()) => {
                self.reload_workouts(&uid).await;
                self.set_messages(|m| {
                    m.workout_error = None;
                    m.workout_success = Some("Workout deleted.".to_string());
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(uid = %uid, workout_id, error = %e, "Delete workout failed");
                let e = AppError::from(e);
                self.set_messages(|m| {
                    m.workout_error = Some(user_message(&e, "Failed to delete workout."))
                });
                Err(e)
            }
        }
    }

    async fn reload_workouts(&self, uid: &str) {
        let workouts = self.facade.load_workouts(uid).await.unwrap_or_else(|e| {
            tracing::warn!(uid, error = %e, "Failed to reload workouts");
            Vec::new()
        });
        self.state.send_if_modified(|state| {
            if state.user.as_ref().map(|u| u.id.as_str()) != Some(uid) {
                return false;
            }
            state.workouts = workouts;
            true
        });
    }

    // ─── Locations ───────────────────────────────────────────────

    /// Take a position fix and hold it as the unsaved current location.
    ///
    /// A previous capture younger than the configured maximum age is reused
    /// without asking the device again.
    pub async fn capture_location(&self) -> Result<CapturedLocation, AppError> {
        self.require_uid()?;

        if let Some(cached) = self.cached_capture() {
            tracing::debug!(timestamp = %cached.timestamp, "Reusing cached position");
            return Ok(cached);
        }

        self.state.send_modify(|state| {
            state.is_capturing = true;
            state.messages.location_error = None;
            state.messages.location_success = None;
        });

        let result = self.facade.capture_location(&self.geolocation).await;

        self.state.send_modify(|state| {
            state.is_capturing = false;
            match &result {
                Ok(captured) => {
                    state.current_location = Some(*captured);
                    state.messages.location_success = Some("Location captured.".to_string());
                }
                Err(e) => state.messages.location_error = Some(e.to_string()),
            }
        });

        result.map_err(|e| {
            tracing::warn!(code = e.code(), error = %e, "Location capture failed");
            e.into()
        })
    }

    fn cached_capture(&self) -> Option<CapturedLocation> {
        let max_age = chrono::Duration::from_std(self.geolocation.max_cache_age).ok()?;
        if max_age <= chrono::Duration::zero() {
            return None;
        }
        let current = self.state.borrow().current_location?;
        (Utc::now() - current.timestamp < max_age).then_some(current)
    }

    /// Persist the current capture and clear it.
    pub async fn save_location(&self) -> Result<String, AppError> {
        let uid = self.require_uid()?;
        let current = self.state.borrow().current_location;
        let Some(captured) = current else {
            let message = "No location to save. Capture one first.";
            self.set_messages(|m| m.location_error = Some(message.to_string()));
            return Err(AppError::BadRequest(message.to_string()));
        };

        match self.facade.save_location(&uid, &captured).await {
            Ok(id) => {
                self.reload_locations(&uid).await;
                self.state.send_modify(|state| {
                    state.current_location = None;
                    state.messages.location_error = None;
                    state.messages.location_success = Some("Location saved successfully!".to_string());
                });
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Save location failed");
                let e = AppError::from(e);
                self.set_messages(|m| {
                    m.location_error = Some(user_message(&e, "Failed to save location. Please try again."))
                });
                Err(e)
            }
        }
    }

    pub async fn delete_location(&self, location_id: &str) -> Result<(), AppError> {
        let uid = self.require_uid()?;

        match self.facade.delete_location(&uid, location_id).await {
            Ok(()) => {
                self.reload_locations(&uid).await;
                self.set_messages(|m| {
                    m.location_error = None;
                    m.location_success = Some("Location deleted.".to_string());
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(uid = %uid, location_id, error = %e, "Delete location failed");
                let e = AppError::from(e);
                self.set_messages(|m| {
                    m.location_error = Some(user_message(&e, "Failed to delete location."))
                });
                Err(e)
            }
        }
    }

    async fn reload_locations(&self, uid: &str) {
        let locations = self.facade.load_locations(uid).await.unwrap_or_else(|e| {
            tracing::warn!(uid, error = %e, "Failed to reload locations");
            Vec::new()
        });
        self.state.send_if_modified(|state| {
            if state.user.as_ref().map(|u| u.id.as_str()) != Some(uid) {
                return false;
            }
            state.locations = locations;
            true
        });
    }

    // ─── Profile ─────────────────────────────────────────────────

    pub async fn update_profile(&self, username: &str) -> Result<(), AppError> {
        let uid = self.require_uid()?;
        let username = username.trim().to_string();

        match self.facade.update_user_profile(&uid, &username).await {
            Ok(()) => {
                self.state.send_modify(|state| {
                    if let Some(user) = state.user.as_mut() {
                        user.username = username.clone();
                        user.display_name = username.clone();
                    }
                    state.messages.profile_error = None;
                    state.messages.profile_success = Some("Profile updated successfully!".to_string());
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Profile update failed");
                self.set_messages(|m| {
                    m.profile_success = None;
                    m.profile_error = Some(user_message(&e, "Failed to update profile. Please try again."));
                });
                Err(e)
            }
        }
    }

    /// Simulated checkout: wait, then flip the premium flag.
    pub async fn upgrade_to_premium(&self) -> Result<(), AppError> {
        let uid = self.require_uid()?;
        if self.state.borrow().user.as_ref().is_some_and(|u| u.is_premium) {
            return Ok(());
        }

        self.state.send_modify(|state| {
            state.is_upgrading = true;
            state.messages.premium_error = None;
            state.messages.premium_success = None;
        });

        if !self.premium_delay.is_zero() {
            tokio::time::sleep(self.premium_delay).await;
        }

        let result = self.facade.upgrade_to_premium(&uid).await;
        self.state.send_modify(|state| {
            state.is_upgrading = false;
            match &result {
                Ok(()) => {
                    if let Some(user) = state.user.as_mut().filter(|u| u.id == uid) {
                        user.is_premium = true;
                    }
                    state.messages.premium_success = Some("Welcome to Premium!".to_string());
                }
                Err(_) => {
                    state.messages.premium_error = Some("Upgrade failed. Please try again.".to_string());
                }
            }
        });

        result.map_err(|e| {
            tracing::warn!(uid = %uid, error = %e, "Premium upgrade failed");
            e.into()
        })
    }

    // ─── Navigation ──────────────────────────────────────────────

    /// Switch pages. Signed-out users always land on the auth page.
    pub fn navigate(&self, page: Page) {
        self.state.send_modify(|state| {
            state.page = if state.is_signed_in() { page } else { Page::Auth };
            state.messages = Messages::default();
        });
    }

    pub fn clear_messages(&self) {
        self.state.send_modify(|state| state.messages = Messages::default());
    }

    // ─── Helper Methods ──────────────────────────────────────────

    fn require_uid(&self) -> Result<String, AppError> {
        self.current_uid().ok_or(AppError::Unauthorized)
    }

    fn set_messages(&self, f: impl FnOnce(&mut Messages)) {
        self.state.send_modify(|state| f(&mut state.messages));
    }
}

/// Text shown for a failed action. Store failures get the action's generic
/// message.
fn user_message(err: &AppError, fallback: &str) -> String {
    match err {
        AppError::Auth(e) => e.to_string(),
        AppError::Location(e) => e.to_string(),
        AppError::BadRequest(msg) => msg.clone(),
        AppError::Unauthorized => AuthError::NotSignedIn.to_string(),
        AppError::Store(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LocationError, StoreError};

    #[test]
    fn test_user_message_mapping() {
        assert_eq!(
            user_message(&AuthError::WrongPassword.into(), "x"),
            "Incorrect password."
        );
        assert_eq!(
            user_message(&LocationError::PermissionDenied.into(), "x"),
            "Location access denied. Please enable location permissions."
        );
        assert_eq!(
            user_message(&StoreError::NotConnected.into(), "Failed to add workout."),
            "Failed to add workout."
        );
        assert_eq!(
            user_message(&AppError::BadRequest("Please enter a workout name.".into()), "x"),
            "Please enter a workout name."
        );
    }
}
