// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! The `Display` text of [`AuthError`] and [`LocationError`] is what the user
//! sees, so keep it short and human-readable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Session provider failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,

    #[error("Please enter a username.")]
    MissingUsername,

    #[error("This email is already registered.")]
    EmailInUse,

    #[error("Incorrect password.")]
    WrongPassword,

    #[error("No account found with this email.")]
    UserNotFound,

    #[error("Invalid email or password.")]
    InvalidCredential,

    #[error("This account has been disabled.")]
    UserDisabled,

    #[error("Too many attempts. Please try again later.")]
    TooManyRequests,

    #[error("Network error. Please check your connection.")]
    Network(String),

    #[error("Not signed in.")]
    NotSignedIn,

    #[error("Authentication failed: {0}")]
    Other(String),
}

impl AuthError {
    /// Map a Firebase Auth error code (e.g. `WEAK_PASSWORD : Password should be...`).
    pub fn from_provider_code(raw: &str) -> Self {
        let code = raw.split(':').next().unwrap_or(raw).trim();
        match code {
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthError::WeakPassword,
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            "INVALID_PASSWORD" => AuthError::WrongPassword,
            "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
            "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredential,
            "USER_DISABLED" => AuthError::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyRequests,
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AuthError::NotSignedIn,
            _ => AuthError::Other(code.to_string()),
        }
    }
}

/// Document store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Database not connected (offline mode)")]
    NotConnected,

    #[error("Store read failed: {0}")]
    Read(String),

    #[error("Store write failed: {0}")]
    Write(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Malformed document at {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Device location failures.
///
/// Codes 1-3 follow the geolocation API's `PositionError` numbering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location access denied. Please enable location permissions.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("Location request timed out.")]
    Timeout,

    #[error("An unknown error occurred while getting location.")]
    Unknown,
}

impl LocationError {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            _ => LocationError::Unknown,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            LocationError::PermissionDenied => 1,
            LocationError::PositionUnavailable => 2,
            LocationError::Timeout => 3,
            LocationError::Unknown => 0,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Auth(AuthError::Network(msg)) => {
                tracing::warn!(error = %msg, "Session provider unreachable");
                (StatusCode::BAD_GATEWAY, "auth_error", Some(self.to_string()))
            }
            AppError::Auth(AuthError::NotSignedIn) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", None)
            }
            AppError::Auth(err) => (StatusCode::BAD_REQUEST, "auth_error", Some(err.to_string())),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                (StatusCode::BAD_GATEWAY, "store_error", None)
            }
            AppError::Location(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "location_error",
                Some(err.to_string()),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
