// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Geolocation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A position reported by the device, not yet saved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CapturedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    /// When the device took the fix
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

/// Stored location record at `users/{uid}/locations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Location {
    /// Store-assigned document ID
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    /// Original capture time
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub saved_at: DateTime<Utc>,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            id: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            accuracy: 0.0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            saved_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Location {
    /// Record to store for a capture; coordinates are copied unchanged.
    pub fn from_capture(captured: &CapturedLocation, saved_at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            latitude: captured.latitude,
            longitude: captured.longitude,
            accuracy: captured.accuracy,
            timestamp: captured.timestamp,
            saved_at,
        }
    }
}
