// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location API contract.

use crate::config::{DeviceFix, GeolocationOptions};
use crate::error::LocationError;
use crate::models::CapturedLocation;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Single-shot position source.
///
/// Implementations report failures with the three geolocation error codes
/// (see [`LocationError::from_code`]). The caller enforces `options.timeout`.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<CapturedLocation, LocationError>;
}

/// Reports a configured fix (or a configured failure) after an optional delay.
///
/// Stands in for device hardware on headless runs.
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    outcome: Result<DeviceFix, LocationError>,
    latency: Duration,
}

impl FixedLocationProvider {
    pub fn new(fix: DeviceFix) -> Self {
        Self {
            outcome: Ok(fix),
            latency: Duration::ZERO,
        }
    }

    /// Always fail with the given geolocation error code.
    pub fn failing(code: u16) -> Self {
        Self {
            outcome: Err(LocationError::from_code(code)),
            latency: Duration::ZERO,
        }
    }

    /// No fix configured: behaves like a device without positioning.
    pub fn unavailable() -> Self {
        Self::failing(2)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<CapturedLocation, LocationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let fix = self.outcome.clone()?;
        tracing::debug!(
            high_accuracy = options.high_accuracy,
            accuracy = fix.accuracy,
            "Reporting fixed device position"
        );

        Ok(CapturedLocation {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            timestamp: Utc::now(),
        })
    }
}
