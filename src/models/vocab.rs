// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vocabulary models: JLPT word list, per-level counts and per-user
//! encounter tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::user::JLPT_LEVELS;

/// Word count for one JLPT level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VocabStats {
    pub level: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: u64,
}

impl VocabStats {
    /// Count words per level, always returning N1..N5 in that order.
    ///
    /// Levels stored as bare numbers (`3`, `"3"`) are read as `N3`.
    /// Levels outside N1..N5 are ignored.
    pub fn aggregate<'a>(levels: impl IntoIterator<Item = &'a Value>) -> Vec<VocabStats> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for raw in levels {
            if let Some(level) = normalize_level(raw) {
                *counts.entry(level).or_insert(0) += 1;
            }
        }

        JLPT_LEVELS
            .iter()
            .map(|&level| VocabStats {
                level: level.to_string(),
                count: counts.get(level).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// Normalize a stored JLPT level to the `N<n>` form.
pub fn normalize_level(raw: &Value) -> Option<String> {
    let level = match raw {
        Value::Number(n) => format!("N{}", n),
        Value::String(s) if s.starts_with('N') => s.clone(),
        Value::String(s) => format!("N{}", s.trim()),
        _ => return None,
    };
    JLPT_LEVELS.contains(&level.as_str()).then_some(level)
}

/// Entry from the `jlpt_vocab` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JlptVocab {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[serde(default)]
    pub kanji: Option<String>,
    pub hiragana: String,
    #[serde(default)]
    pub romaji: Option<String>,
    pub english_meaning: String,
    #[serde(default)]
    pub jlpt_level: Option<String>,
    #[serde(default)]
    pub word_type: Option<String>,
}

impl JlptVocab {
    /// Case-insensitive substring match on hiragana, kanji or meaning.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.hiragana.contains(&query)
            || self.kanji.as_deref().is_some_and(|k| k.contains(&query))
            || self.english_meaning.to_lowercase().contains(&query)
    }
}

/// Who produced the text a word was seen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum EncounterSource {
    /// Typed by the learner
    User,
    /// Said by the AI tutor
    Ai,
    /// Looked up by hovering a word
    Hover,
}

impl EncounterSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncounterSource::User => "user",
            EncounterSource::Ai => "ai",
            EncounterSource::Hover => "hover",
        }
    }
}

/// Per-user, per-word encounter counts (`vocab_tracker` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VocabEncounter {
    pub user_id: Uuid,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub word_id: i64,
    pub frequency: u32,
    pub user_usage_count: u32,
    pub ai_encounter_count: u32,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub memory_strength: u32,
    /// "conversation" or "manual"
    pub source: String,
}

impl VocabEncounter {
    /// First encounter of a word.
    pub fn first(user_id: Uuid, word_id: i64, source: EncounterSource, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            word_id,
            frequency: 1,
            user_usage_count: u32::from(source == EncounterSource::User),
            ai_encounter_count: u32::from(source == EncounterSource::Ai),
            last_seen_at: Some(now),
            memory_strength: 0,
            source: if source == EncounterSource::Hover {
                "manual".to_string()
            } else {
                "conversation".to_string()
            },
        }
    }

    /// Record another encounter.
    pub fn record(&mut self, source: EncounterSource, now: DateTime<Utc>) {
        self.frequency += 1;
        self.last_seen_at = Some(now);
        match source {
            EncounterSource::User => self.user_usage_count += 1,
            EncounterSource::Ai => self.ai_encounter_count += 1,
            EncounterSource::Hover => {}
        }
    }
}

/// A tracker row joined with its vocabulary entry, as listed on the
/// vocabulary page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackedWord {
    #[serde(flatten)]
    pub encounter: VocabEncounter,
    pub word: JlptVocab,
}

/// Order tracked words most frequent first, ties by word id.
pub fn sort_tracked(words: &mut [TrackedWord]) {
    words.sort_by(|a, b| {
        b.encounter
            .frequency
            .cmp(&a.encounter.frequency)
            .then(a.encounter.word_id.cmp(&b.encounter.word_id))
    });
}
