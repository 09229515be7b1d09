// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored workout record at `users/{uid}/workouts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Workout {
    /// Store-assigned document ID
    pub id: String,
    pub name: String,
    /// Free-form category (Cardio, Strength, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Duration in minutes
    pub duration: u32,
    pub notes: String,
    /// When the workout happened
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: DateTime<Utc>,
}

impl Default for Workout {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: String::new(),
            duration: 0,
            notes: String::new(),
            date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Workout {
    pub fn icon(&self) -> &'static str {
        workout_icon(&self.kind)
    }
}

/// Icon shown next to a workout category.
pub fn workout_icon(kind: &str) -> &'static str {
    match kind.trim().to_ascii_lowercase().as_str() {
        "cardio" => "🏃",
        "strength" => "💪",
        "flexibility" => "🧘",
        "sports" => "⚽",
        "hiit" => "🔥",
        _ => "🏋️",
    }
}

/// Add-workout form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WorkoutForm {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[validate(range(min = 1, max = 1440))]
    pub duration: u32,
    #[serde(default)]
    pub notes: String,
    /// Defaults to the time the workout is added
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl WorkoutForm {
    /// Build the record to store; the ID is assigned by the store.
    pub fn into_workout(self, now: DateTime<Utc>) -> Workout {
        Workout {
            id: String::new(),
            name: self.name.trim().to_string(),
            kind: self.kind.trim().to_string(),
            duration: self.duration,
            notes: self.notes,
            date: self.date.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_lookup() {
        assert_eq!(workout_icon("Cardio"), "🏃");
        assert_eq!(workout_icon("strength"), "💪");
        assert_eq!(workout_icon(" HIIT "), "🔥");
        assert_eq!(workout_icon("Underwater basket weaving"), "🏋️");
        assert_eq!(workout_icon(""), "🏋️");
    }

    #[test]
    fn test_form_validation() {
        let form = WorkoutForm {
            name: "Run".to_string(),
            kind: "Cardio".to_string(),
            duration: 30,
            ..Default::default()
        };
        assert!(form.validate().is_ok());

        let empty_name = WorkoutForm {
            duration: 30,
            ..Default::default()
        };
        assert!(empty_name.validate().is_err());

        let zero_minutes = WorkoutForm {
            name: "Run".to_string(),
            ..Default::default()
        };
        assert!(zero_minutes.validate().is_err());
    }

    #[test]
    fn test_form_defaults_date_to_now() {
        let now = Utc::now();
        let workout = WorkoutForm {
            name: " Run ".to_string(),
            kind: "Cardio".to_string(),
            duration: 30,
            ..Default::default()
        }
        .into_workout(now);

        assert_eq!(workout.name, "Run");
        assert_eq!(workout.date, now);
        assert!(workout.id.is_empty());
    }

    #[test]
    fn test_type_field_name_on_the_wire() {
        let doc = serde_json::json!({ "name": "Lift", "type": "Strength", "duration": 45 });
        let workout: Workout = serde_json::from_value(doc).unwrap();
        assert_eq!(workout.kind, "Strength");
        assert_eq!(workout.notes, "");
        assert_eq!(workout.icon(), "💪");
    }
}
