// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use fittrack::config::{Config, DeviceFix};
use fittrack::db::MemoryStore;
use fittrack::routes::create_router;
use fittrack::services::{FixedLocationProvider, LocalSessionProvider};
use fittrack::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Position reported by the test device.
#[allow(dead_code)]
pub const TEST_FIX: DeviceFix = DeviceFix {
    latitude: 37.3318,
    longitude: -122.0312,
    accuracy: 12.0,
};

/// In-process backends, kept so tests can poke at them directly.
#[allow(dead_code)]
pub struct TestBackends {
    pub session: Arc<LocalSessionProvider>,
    pub store: MemoryStore,
}

/// Create an app state with in-process backends and the given location provider.
#[allow(dead_code)]
pub fn test_state_with(
    config: Config,
    location: FixedLocationProvider,
) -> (Arc<AppState>, TestBackends) {
    let session = Arc::new(LocalSessionProvider::new());
    let store = MemoryStore::new();

    let state = Arc::new(AppState::with_backends(
        config,
        session.clone(),
        Arc::new(store.clone()),
        Arc::new(location),
    ));

    (state, TestBackends { session, store })
}

/// Create an app state with in-process backends and a working device.
#[allow(dead_code)]
pub fn test_state() -> (Arc<AppState>, TestBackends) {
    test_state_with(Config::test_default(), FixedLocationProvider::new(TEST_FIX))
}

/// Create a test app with in-process dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let (state, _) = test_state();
    (create_router(state.clone()), state)
}
