// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application state controller tests.
//!
//! Covers the end-to-end user flows and the session listener reacting to
//! identity changes that happen outside the controller.

use fittrack::config::{Config, GeolocationOptions};
use fittrack::controller::{Messages, Page, ViewState};
use fittrack::db::{self, DocumentStore};
use fittrack::error::AppError;
use fittrack::models::{LoginForm, RegisterForm, WorkoutForm};
use fittrack::services::{FixedLocationProvider, SessionProvider};
use std::time::Duration;
use tokio::sync::watch;

mod common;

fn register_form(email: &str, password: &str, username: &str) -> RegisterForm {
    RegisterForm {
        email: email.to_string(),
        password: password.to_string(),
        username: username.to_string(),
    }
}

fn login_form(email: &str, password: &str) -> LoginForm {
    LoginForm {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn run_form() -> WorkoutForm {
    WorkoutForm {
        name: "Run".to_string(),
        kind: "Cardio".to_string(),
        duration: 30,
        ..Default::default()
    }
}

/// Wait until the state satisfies `f`, failing the test after two seconds.
async fn wait_for_state(rx: &mut watch::Receiver<ViewState>, f: impl FnMut(&ViewState) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(f))
        .await
        .expect("state did not settle in time")
        .expect("state channel closed");
}

#[tokio::test]
async fn test_register_login_add_workout_scenario() {
    let (state, _) = common::test_state();
    let controller = &state.controller;

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    controller.logout().await;
    assert!(controller.snapshot().user.is_none());

    controller.login(login_form("a@x.com", "secret1")).await.unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.page, Page::Dashboard);
    assert_eq!(snapshot.user.as_ref().map(|u| u.username.as_str()), Some("Ana"));

    controller.add_workout(run_form()).await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.workouts.len(), 1);
    assert_eq!(snapshot.workouts[0].name, "Run");
    assert_eq!(snapshot.workouts[0].icon(), "🏃");
    assert_eq!(
        snapshot.messages.workout_success.as_deref(),
        Some("Workout added successfully!")
    );

    let uid = controller.current_uid().unwrap();
    let stored = controller.facade().load_workouts(&uid).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, snapshot.workouts[0].id);
}

#[tokio::test]
async fn test_wrong_password_stays_signed_out() {
    let (state, backends) = common::test_state();
    let controller = &state.controller;

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    controller.logout().await;

    let err = controller
        .login(login_form("a@x.com", "not-it"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect password.");

    let snapshot = controller.snapshot();
    assert!(snapshot.user.is_none());
    assert_eq!(snapshot.page, Page::Auth);
    assert_eq!(snapshot.messages.auth_error.as_deref(), Some("Incorrect password."));
    assert!(backends.session.current_session().borrow().is_none());
}

#[tokio::test]
async fn test_registration_error_message() {
    let (state, _) = common::test_state();

    let err = state
        .controller
        .register(register_form("a@x.com", "12345", "Ana"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
    assert_eq!(
        state.controller.snapshot().messages.auth_error.as_deref(),
        Some("Password should be at least 6 characters.")
    );
}

#[tokio::test]
async fn test_registration_with_store_outage_signs_in() {
    let (state, backends) = common::test_state();
    let controller = &state.controller;
    backends.store.set_offline(true);

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    let snapshot = controller.snapshot();
    assert!(snapshot.is_signed_in());
    assert_eq!(snapshot.page, Page::Dashboard);
    assert_eq!(snapshot.user.unwrap().username, "Ana");
    assert!(snapshot.messages.auth_error.is_none());
    assert_eq!(
        snapshot.messages.profile_error.as_deref(),
        Some("Account created, but your profile could not be saved.")
    );
    assert!(backends.session.current_session().borrow().is_some());
}

#[tokio::test]
async fn test_listener_clears_state_on_external_sign_out() {
    let (state, backends) = common::test_state();
    let controller = state.controller.clone();
    let _listener = controller.spawn_session_listener();

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    controller.add_workout(run_form()).await.unwrap();
    assert_eq!(controller.snapshot().workouts.len(), 1);

    let mut rx = controller.subscribe();
    backends.session.end_session().await.unwrap();
    wait_for_state(&mut rx, |s| s.user.is_none()).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.page, Page::Auth);
    assert!(snapshot.workouts.is_empty());
    assert!(snapshot.locations.is_empty());
}

#[tokio::test]
async fn test_listener_loads_profile_on_external_sign_in() {
    let (state, backends) = common::test_state();
    let controller = state.controller.clone();
    let _listener = controller.spawn_session_listener();

    let mut rx = controller.subscribe();
    // No profile document: the listener creates a default one
    let identity = backends
        .session
        .create_account("jo@x.com", "secret1")
        .await
        .unwrap();
    wait_for_state(&mut rx, |s| s.user.is_some()).await;

    let snapshot = controller.snapshot();
    let user = snapshot.user.unwrap();
    assert_eq!(user.id, identity.uid);
    assert_eq!(user.username, "jo");
    assert_eq!(snapshot.page, Page::Dashboard);
    assert!(backends
        .store
        .get(&db::user_doc(&identity.uid))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_register_with_listener_keeps_chosen_username() {
    let (state, backends) = common::test_state();
    let controller = state.controller.clone();
    let _listener = controller.spawn_session_listener();

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    // Let the listener observe the sign-in
    tokio::task::yield_now().await;
    controller.sync_session().await;

    let user = controller.snapshot().user.unwrap();
    assert_eq!(user.username, "Ana");

    let stored = controller.facade().get_user_data(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "Ana");
    assert_eq!(backends.store.len(&db::workouts_of(&user.id)), 0);
}

#[tokio::test]
async fn test_sign_in_with_store_outage_uses_default_profile() {
    let (state, backends) = common::test_state();
    let controller = &state.controller;

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    controller.logout().await;

    backends.store.set_offline(true);
    controller.login(login_form("a@x.com", "secret1")).await.unwrap();

    let snapshot = controller.snapshot();
    let user = snapshot.user.expect("session should still have a user");
    assert_eq!(user.username, "Ana");
    assert!(snapshot.workouts.is_empty());
    assert!(snapshot.locations.is_empty());

    let err = controller.add_workout(run_form()).await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
    assert_eq!(
        controller.snapshot().messages.workout_error.as_deref(),
        Some("Failed to add workout. Please try again.")
    );
}

#[tokio::test]
async fn test_delete_workout_reloads_list() {
    let (state, _) = common::test_state();
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    let id = controller.add_workout(run_form()).await.unwrap();
    controller.delete_workout(&id).await.unwrap();
    assert!(controller.snapshot().workouts.is_empty());

    // Already gone: still no error
    controller.delete_workout(&id).await.unwrap();
    assert!(controller.snapshot().messages.workout_error.is_none());
}

#[tokio::test]
async fn test_actions_require_session() {
    let (state, _) = common::test_state();

    let err = state.controller.add_workout(run_form()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert!(matches!(
        state.controller.capture_location().await,
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_check_session_rejects_previous_user() {
    let (state, _) = common::test_state();
    let controller = &state.controller;

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    let ana = controller.current_uid().unwrap();
    controller.check_session(&ana).unwrap();

    controller.logout().await;
    controller
        .register(register_form("b@x.com", "secret1", "Bo"))
        .await
        .unwrap();

    assert!(matches!(
        controller.check_session(&ana),
        Err(AppError::Unauthorized)
    ));
    controller
        .check_session(&controller.current_uid().unwrap())
        .unwrap();

    controller.logout().await;
    assert!(matches!(
        controller.check_session(&ana),
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_capture_and_save_location() {
    let (state, _) = common::test_state();
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    let err = controller.save_location().await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let captured = controller.capture_location().await.unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_location, Some(captured));
    assert!(!snapshot.is_capturing);

    let id = controller.save_location().await.unwrap();
    let snapshot = controller.snapshot();
    assert!(snapshot.current_location.is_none());
    assert_eq!(snapshot.locations.len(), 1);
    assert_eq!(snapshot.locations[0].id, id);
    assert_eq!(snapshot.locations[0].latitude, captured.latitude);
    assert_eq!(snapshot.locations[0].accuracy, captured.accuracy);

    controller.delete_location(&id).await.unwrap();
    assert!(controller.snapshot().locations.is_empty());
}

#[tokio::test]
async fn test_capture_timeout_message() {
    let mut config = Config::test_default();
    config.geolocation = GeolocationOptions {
        timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let (state, _) = common::test_state_with(
        config,
        FixedLocationProvider::new(common::TEST_FIX).with_latency(Duration::from_secs(5)),
    );
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    assert!(controller.capture_location().await.is_err());

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_capturing);
    assert!(snapshot.current_location.is_none());
    assert_eq!(
        snapshot.messages.location_error.as_deref(),
        Some("Location request timed out.")
    );
}

#[tokio::test]
async fn test_capture_permission_denied_message() {
    let (state, _) =
        common::test_state_with(Config::test_default(), FixedLocationProvider::failing(1));
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    assert!(controller.capture_location().await.is_err());
    assert_eq!(
        controller.snapshot().messages.location_error.as_deref(),
        Some("Location access denied. Please enable location permissions.")
    );
}

#[tokio::test]
async fn test_recent_capture_is_reused() {
    let mut config = Config::test_default();
    config.geolocation.max_cache_age = Duration::from_secs(60);
    let (state, _) = common::test_state_with(
        config,
        FixedLocationProvider::new(common::TEST_FIX).with_latency(Duration::from_millis(5)),
    );
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    let first = controller.capture_location().await.unwrap();
    let second = controller.capture_location().await.unwrap();
    assert_eq!(first.timestamp, second.timestamp);
}

#[tokio::test]
async fn test_update_profile() {
    let (state, _) = common::test_state();
    let controller = &state.controller;
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    controller.update_profile("Ana Maria").await.unwrap();
    let snapshot = controller.snapshot();
    let user = snapshot.user.unwrap();
    assert_eq!(user.username, "Ana Maria");
    assert_eq!(user.display_name, "Ana Maria");
    assert_eq!(
        snapshot.messages.profile_success.as_deref(),
        Some("Profile updated successfully!")
    );

    assert!(controller.update_profile("").await.is_err());
    assert!(controller.snapshot().messages.profile_error.is_some());
}

#[tokio::test]
async fn test_premium_upgrade_after_delay() {
    let mut config = Config::test_default();
    config.premium_upgrade_delay = Duration::from_millis(50);
    let (state, _) = common::test_state_with(config, FixedLocationProvider::new(common::TEST_FIX));
    let controller = state.controller.clone();
    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();

    let mut rx = controller.subscribe();
    let upgrade = tokio::spawn({
        let controller = controller.clone();
        async move { controller.upgrade_to_premium().await }
    });

    wait_for_state(&mut rx, |s| s.is_upgrading).await;
    assert!(!controller.snapshot().user.unwrap().is_premium);

    upgrade.await.unwrap().unwrap();
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_upgrading);
    assert!(snapshot.user.as_ref().unwrap().is_premium);
    assert_eq!(
        snapshot.messages.premium_success.as_deref(),
        Some("Welcome to Premium!")
    );

    let uid = snapshot.user.unwrap().id;
    let stored = controller.facade().get_user_data(&uid).await.unwrap().unwrap();
    assert!(stored.is_premium);
}

#[tokio::test]
async fn test_navigation_requires_session() {
    let (state, _) = common::test_state();
    let controller = &state.controller;

    controller.navigate(Page::Workouts);
    assert_eq!(controller.snapshot().page, Page::Auth);

    controller
        .register(register_form("a@x.com", "secret1", "Ana"))
        .await
        .unwrap();
    controller.navigate(Page::Workouts);
    assert_eq!(controller.snapshot().page, Page::Workouts);

    controller.add_workout(run_form()).await.unwrap();
    controller.clear_messages();
    assert_eq!(controller.snapshot().messages, Messages::default());
}
