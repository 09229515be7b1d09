// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gate for the local API.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The signed-in user for the current request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub uid: String,
}

/// Middleware that requires an established session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let uid = state
        .controller
        .current_uid()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(SessionUser { uid });
    Ok(next.run(request).await)
}
