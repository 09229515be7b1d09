// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Display name updates
//! - Mapping provider error codes to [`AuthError`]

use crate::error::AuthError;
use crate::services::session::{Identity, SessionChannel, SessionProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// ID token of the signed-in account.
struct ActiveSession {
    id_token: String,
}

/// Hosted session provider.
pub struct IdentityToolkitProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    active: Mutex<Option<ActiveSession>>,
    session: SessionChannel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkitProvider {
    /// Create a client for the given Firebase Web API key.
    ///
    /// For local development with the Auth emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => DEFAULT_BASE_URL.to_string(),
        };
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            active: Mutex::new(None),
            session: SessionChannel::new(),
        }
    }

    /// POST to `accounts:{method}` and decode the JSON response.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + Sync + ?Sized,
        T: for<'de> Deserialize<'de> + Send,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => AuthError::from_provider_code(&envelope.error.message),
                Err(_) => AuthError::Other(format!("HTTP {}: {}", status, body)),
            };
            tracing::warn!(method, status = status.as_u16(), error = ?error, "Identity Toolkit call failed");
            return Err(error);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::Other(format!("Malformed response: {}", e)))
    }

    /// Account creation time; falls back to now if the lookup fails.
    async fn created_at(&self, id_token: &str) -> DateTime<Utc> {
        let lookup: Result<LookupResponse, _> =
            self.call("lookup", &LookupRequest { id_token }).await;

        lookup
            .ok()
            .and_then(|r| r.users.into_iter().next())
            .and_then(|u| u.created_at)
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
    }

    async fn sign_in_with(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let response: PasswordResponse = self
            .call(
                method,
                &PasswordRequest {
                    email: email.trim(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let created_at = self.created_at(&response.id_token).await;
        let identity = Identity {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name.filter(|n| !n.is_empty()),
            created_at,
        };

        *self.active.lock().await = Some(ActiveSession {
            id_token: response.id_token,
        });
        self.session.publish(Some(identity.clone()));

        tracing::info!(uid = %identity.uid, method, "Session established");
        Ok(identity)
    }
}

#[async_trait]
impl SessionProvider for IdentityToolkitProvider {
    fn current_session(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.sign_in_with("signUp", email, password).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.sign_in_with("signInWithPassword", email, password).await
    }

    async fn end_session(&self) -> Result<(), AuthError> {
        // ID tokens are stateless; dropping them is the sign-out.
        *self.active.lock().await = None;
        self.session.publish(None);
        Ok(())
    }

    async fn set_display_name(&self, display_name: &str) -> Result<(), AuthError> {
        let id_token = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or(AuthError::NotSignedIn)?;

        let _: serde_json::Value = self
            .call(
                "update",
                &UpdateRequest {
                    id_token: &id_token,
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;

        self.session
            .update_current(|identity| identity.display_name = Some(display_name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        // Port 9 (discard) on localhost is not an HTTP server.
        let provider =
            IdentityToolkitProvider::with_base_url("key".to_string(), "http://127.0.0.1:9".to_string());

        let err = provider.authenticate("a@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(provider.current_session().borrow().is_none());
    }

    #[tokio::test]
    async fn test_display_name_requires_session() {
        let provider =
            IdentityToolkitProvider::with_base_url("key".to_string(), "http://127.0.0.1:9".to_string());

        assert_eq!(
            provider.set_display_name("Ana").await,
            Err(AuthError::NotSignedIn)
        );
    }

    #[test]
    fn test_error_envelope_decodes() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(
            AuthError::from_provider_code(&envelope.error.message),
            AuthError::EmailInUse
        );
    }
}
