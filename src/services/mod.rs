// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborators and the access facade over them.

pub mod facade;
pub mod geolocation;
pub mod identity_toolkit;
pub mod local_auth;
pub mod session;

pub use facade::AccessFacade;
pub use geolocation::{FixedLocationProvider, LocationProvider};
pub use identity_toolkit::IdentityToolkitProvider;
pub use local_auth::LocalSessionProvider;
pub use session::{Identity, SessionChannel, SessionProvider};
