// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password session routes.

use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{LoginForm, RegisterForm};
use crate::routes::StateResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Create an account and sign in as it.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<StateResponse>> {
    state.controller.register(form).await?;
    Ok(Json(state.controller.snapshot().into()))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> Result<Json<StateResponse>> {
    state.controller.login(form).await?;
    Ok(Json(state.controller.snapshot().into()))
}

/// Always succeeds; provider failures are only logged.
async fn logout(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    state.controller.logout().await;
    Json(state.controller.snapshot().into())
}
