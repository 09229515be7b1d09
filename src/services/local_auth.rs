// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process session provider.
//!
//! Mirrors the hosted provider's observable behavior (error codes, sign-in on
//! account creation) without a network. Used when no Firebase API key is
//! configured and by the test suite. Accounts live only as long as the process.

use crate::error::AuthError;
use crate::services::session::{Identity, SessionChannel, SessionProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use validator::ValidateEmail;

const MIN_PASSWORD_LEN: usize = 6;
const PBKDF2_ITERATIONS: u32 = 10_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

struct Account {
    uid: String,
    email: String,
    salt: [u8; SALT_LEN],
    hash: [u8; HASH_LEN],
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    disabled: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Session provider backed by an in-memory account table.
pub struct LocalSessionProvider {
    /// Keyed by lowercase email
    accounts: DashMap<String, Account>,
    session: SessionChannel,
    rng: SystemRandom,
    offline: AtomicBool,
}

impl Default for LocalSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSessionProvider {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            session: SessionChannel::new(),
            rng: SystemRandom::new(),
            offline: AtomicBool::new(false),
        }
    }

    /// Block sign-in for an account, as an administrator would.
    pub fn disable_account(&self, email: &str) -> bool {
        match self.accounts.get_mut(&email.trim().to_lowercase()) {
            Some(mut account) => {
                account.disabled = true;
                true
            }
            None => false,
        }
    }

    /// Simulate losing the network: every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Network("provider unreachable".to_string()));
        }
        Ok(())
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], AuthError> {
        let mut buf = [0u8; N];
        self.rng
            .fill(&mut buf)
            .map_err(|_| AuthError::Other("random generator failure".to_string()))?;
        Ok(buf)
    }

    fn iterations() -> NonZeroU32 {
        NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
    }
}

#[async_trait]
impl SessionProvider for LocalSessionProvider {
    fn current_session(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.ensure_online()?;

        let email = email.trim();
        if !email.validate_email() {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let key = email.to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }

        let salt: [u8; SALT_LEN] = self.random_bytes()?;
        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            Self::iterations(),
            &salt,
            password.as_bytes(),
            &mut hash,
        );
        let uid_bytes: [u8; 14] = self.random_bytes()?;

        let account = Account {
            uid: hex::encode(uid_bytes),
            email: email.to_string(),
            salt,
            hash,
            display_name: None,
            created_at: Utc::now(),
            disabled: false,
        };
        let identity = account.identity();

        // Re-check under the entry lock; the early check above is only a fast path.
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(AuthError::EmailInUse),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(account);
            }
        }

        tracing::info!(uid = %identity.uid, "Local account created");
        self.session.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.ensure_online()?;

        let email = email.trim();
        if !email.validate_email() {
            return Err(AuthError::InvalidEmail);
        }

        let identity = {
            let account = self
                .accounts
                .get(&email.to_lowercase())
                .ok_or(AuthError::UserNotFound)?;

            pbkdf2::verify(
                pbkdf2::PBKDF2_HMAC_SHA256,
                Self::iterations(),
                &account.salt,
                password.as_bytes(),
                &account.hash,
            )
            .map_err(|_| AuthError::WrongPassword)?;

            if account.disabled {
                return Err(AuthError::UserDisabled);
            }
            account.identity()
        };

        self.session.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn end_session(&self) -> Result<(), AuthError> {
        self.session.publish(None);
        Ok(())
    }

    async fn set_display_name(&self, display_name: &str) -> Result<(), AuthError> {
        self.ensure_online()?;

        let current = self.session.current().ok_or(AuthError::NotSignedIn)?;
        let key = current.email.to_lowercase();
        match self.accounts.get_mut(&key) {
            Some(mut account) => account.display_name = Some(display_name.to_string()),
            None => return Err(AuthError::NotSignedIn),
        }

        self.session
            .update_current(|identity| identity.display_name = Some(display_name.to_string()));
        Ok(())
    }
}
