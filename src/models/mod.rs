// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod user;
pub mod workout;

pub use location::{CapturedLocation, Location};
pub use user::{LoginForm, ProfileForm, RegisterForm, User};
pub use workout::{workout_icon, Workout, WorkoutForm};
