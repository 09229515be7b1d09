// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the signed-in user.

use crate::controller::Page;
use crate::error::Result;
use crate::middleware::auth::SessionUser;
use crate::models::{CapturedLocation, ProfileForm, WorkoutForm};
use crate::routes::StateResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require an established session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/workouts", post(add_workout))
        .route("/api/workouts/{id}", delete(delete_workout))
        .route("/api/location/capture", post(capture_location))
        .route("/api/locations", post(save_location))
        .route("/api/locations/{id}", delete(delete_location))
        .route("/api/profile", put(update_profile))
        .route("/api/premium", post(upgrade_to_premium))
        .route("/api/page", post(navigate))
        .route("/api/messages", delete(clear_messages))
}

/// Response for actions that create a record.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatedResponse {
    pub id: String,
    pub state: StateResponse,
}

#[derive(Deserialize)]
struct NavigateRequest {
    page: Page,
}

async fn get_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<StateResponse>> {
    state.controller.check_session(&user.uid)?;
    Ok(Json(state.controller.snapshot().into()))
}

// ─── Workouts ────────────────────────────────────────────────

async fn add_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(form): Json<WorkoutForm>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    tracing::debug!(uid = %user.uid, name = %form.name, "Add workout requested");
    state.controller.check_session(&user.uid)?;
    let id = state.controller.add_workout(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            state: state.controller.snapshot().into(),
        }),
    ))
}

/// Deleting an unknown ID is not an error.
async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>> {
    tracing::debug!(uid = %user.uid, workout_id = %id, "Delete workout requested");
    state.controller.check_session(&user.uid)?;
    state.controller.delete_workout(&id).await?;
    Ok(Json(state.controller.snapshot().into()))
}

// ─── Locations ───────────────────────────────────────────────

async fn capture_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<CapturedLocation>> {
    state.controller.check_session(&user.uid)?;
    let captured = state.controller.capture_location().await?;
    Ok(Json(captured))
}

/// Save the pending capture.
async fn save_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    tracing::debug!(uid = %user.uid, "Save location requested");
    state.controller.check_session(&user.uid)?;
    let id = state.controller.save_location().await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            state: state.controller.snapshot().into(),
        }),
    ))
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>> {
    tracing::debug!(uid = %user.uid, location_id = %id, "Delete location requested");
    state.controller.check_session(&user.uid)?;
    state.controller.delete_location(&id).await?;
    Ok(Json(state.controller.snapshot().into()))
}

// ─── Profile ─────────────────────────────────────────────────

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<StateResponse>> {
    state.controller.check_session(&user.uid)?;
    state.controller.update_profile(&form.username).await?;
    Ok(Json(state.controller.snapshot().into()))
}

/// Simulated checkout; no payment is taken.
async fn upgrade_to_premium(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<StateResponse>> {
    tracing::debug!(uid = %user.uid, "Premium upgrade requested");
    state.controller.check_session(&user.uid)?;
    state.controller.upgrade_to_premium().await?;
    Ok(Json(state.controller.snapshot().into()))
}

// ─── Navigation ──────────────────────────────────────────────

async fn navigate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<StateResponse>> {
    state.controller.check_session(&user.uid)?;
    state.controller.navigate(request.page);
    Ok(Json(state.controller.snapshot().into()))
}

async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<StateResponse>> {
    state.controller.check_session(&user.uid)?;
    state.controller.clear_messages();
    Ok(Json(state.controller.snapshot().into()))
}
