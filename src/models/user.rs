// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// JLPT levels, hardest first.
pub const JLPT_LEVELS: [&str; 5] = ["N1", "N2", "N3", "N4", "N5"];

/// Allowed UI themes.
pub const THEMES: [&str; 3] = ["light", "dark", "system"];

/// Largest XP award accepted in one call.
pub const MAX_XP_AWARD: i64 = 10_000;

/// User profile stored in the `users` table (keyed by auth user id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Auth user id
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Profile image URL (may be a data URL)
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub prefers_english: Option<bool>,
    #[serde(default)]
    pub jlpt_goal_level: Option<String>,
    #[serde(default)]
    pub native_language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub sound_notifications: Option<bool>,
    #[serde(default)]
    pub desktop_notifications: Option<bool>,
    #[serde(default)]
    pub streak_days: Option<u32>,
    /// Last day (UTC) the streak was counted
    #[serde(default)]
    pub last_streak_date: Option<NaiveDate>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub xp: Option<i64>,
    #[serde(default)]
    pub learning_goals: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Fresh profile as created at signup.
    pub fn new(id: Uuid, email: Option<String>, now: &str) -> Self {
        Self {
            id,
            email,
            username: None,
            display_name: None,
            avatar_url: None,
            prefers_english: None,
            jlpt_goal_level: Some("N5".to_string()),
            native_language: None,
            timezone: None,
            theme: None,
            sound_notifications: Some(true),
            desktop_notifications: Some(true),
            streak_days: Some(0),
            last_streak_date: None,
            xp: Some(0),
            learning_goals: None,
            created_at: Some(now.to_string()),
            updated_at: Some(now.to_string()),
        }
    }

    /// Count a visit on `today` towards the daily streak.
    ///
    /// Returns `false` when today was already counted (nothing changes).
    pub fn apply_streak(&mut self, today: NaiveDate) -> bool {
        match next_streak(self.last_streak_date, self.streak_days.unwrap_or(0), today) {
            Some(streak) => {
                self.streak_days = Some(streak);
                self.last_streak_date = Some(today);
                true
            }
            None => false,
        }
    }

    /// Add experience points.
    pub fn add_xp(&mut self, points: i64) {
        self.xp = Some(self.xp.unwrap_or(0).saturating_add(points));
    }

    /// Apply a partial update. Only fields present in `update` change.
    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = &update.$field {
                    self.$field = Some(v.clone());
                })*
            };
        }
        merge!(
            username,
            display_name,
            avatar_url,
            prefers_english,
            jlpt_goal_level,
            native_language,
            timezone,
            theme,
            sound_notifications,
            desktop_notifications,
            learning_goals
        );
    }
}

/// New streak length for a visit on `today`, or `None` if already counted.
///
/// - consecutive day: streak + 1
/// - gap of more than one day: restart at 1
/// - first visit: 1
/// - last date in the future (clock skew): keep the current count
pub fn next_streak(last: Option<NaiveDate>, current: u32, today: NaiveDate) -> Option<u32> {
    let Some(last) = last else {
        return Some(1);
    };

    match (today - last).num_days() {
        0 => None,
        1 => Some(current.saturating_add(1)),
        d if d > 1 => Some(1),
        _ => Some(current),
    }
}

/// Partial profile update accepted from clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2_000_000))]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefers_english: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_jlpt_level"))]
    pub jlpt_goal_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub native_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_theme"))]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub learning_goals: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().map(|o| o.is_empty()))
            .unwrap_or(true)
    }
}

fn validate_jlpt_level(level: &str) -> Result<(), ValidationError> {
    if JLPT_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ValidationError::new("jlpt_level"))
    }
}

fn validate_theme(theme: &str) -> Result<(), ValidationError> {
    if THEMES.contains(&theme) {
        Ok(())
    } else {
        Err(ValidationError::new("theme"))
    }
}
