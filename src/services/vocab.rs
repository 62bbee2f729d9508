// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vocabulary tracking for conversation messages.
//!
//! Every Japanese word in a message that matches a JLPT vocabulary entry
//! counts as one encounter for the user. Tracking is best effort: failures
//! are logged and never surface to the caller.

use crate::db::Backend;
use crate::error::AppError;
use crate::models::EncounterSource;
use crate::text::japanese_words;
use futures_util::{stream, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

/// Lookups in flight at once for a single message.
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Shortest word (in characters) worth tracking.
pub const MIN_WORD_CHARS: usize = 2;

/// Outcome of tracking one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackingSummary {
    /// Candidate words extracted from the text
    pub candidates: usize,
    /// Words that matched a vocabulary entry and were counted
    pub tracked: usize,
    /// Lookups or increments that failed
    pub failed: usize,
}

/// Records vocabulary encounters against a backend.
#[derive(Clone)]
pub struct VocabTracker {
    db: Arc<dyn Backend>,
}

impl VocabTracker {
    pub fn new(db: Arc<dyn Backend>) -> Self {
        Self { db }
    }

    /// Count every known word in `text` for `user_id`.
    pub async fn track_message(
        &self,
        user_id: Uuid,
        text: &str,
        source: EncounterSource,
    ) -> TrackingSummary {
        let words: Vec<String> = japanese_words(text)
            .into_iter()
            .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
            .map(str::to_owned)
            .collect();

        let mut summary = TrackingSummary {
            candidates: words.len(),
            ..Default::default()
        };

        let results: Vec<Result<bool, AppError>> = stream::iter(words)
            .map(|word| async move { self.track_word(user_id, &word, source).await })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(true) => summary.tracked += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Vocabulary tracking failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::debug!(
            user_id = %user_id,
            source = source.as_str(),
            candidates = summary.candidates,
            tracked = summary.tracked,
            "Tracked message vocabulary"
        );
        summary
    }

    /// Look up one word and count the first match. `false` when unknown.
    async fn track_word(
        &self,
        user_id: Uuid,
        word: &str,
        source: EncounterSource,
    ) -> Result<bool, AppError> {
        let matches = self.db.search_vocab(word).await?;
        let Some(first) = matches.first() else {
            return Ok(false);
        };

        self.db
            .increment_word_frequency(user_id, first.id, source)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::JlptVocab;

    fn word(id: i64, kanji: Option<&str>, hiragana: &str, meaning: &str) -> JlptVocab {
        JlptVocab {
            id,
            kanji: kanji.map(str::to_string),
            hiragana: hiragana.to_string(),
            romaji: None,
            english_meaning: meaning.to_string(),
            jlpt_level: Some("N5".to_string()),
            word_type: None,
        }
    }

    fn setup() -> (MemoryDb, VocabTracker) {
        let db = MemoryDb::new();
        db.insert_vocab(word(1, Some("学生"), "がくせい", "student"));
        db.insert_vocab(word(2, Some("先生"), "せんせい", "teacher"));
        let tracker = VocabTracker::new(Arc::new(db.clone()));
        (db, tracker)
    }

    #[tokio::test]
    async fn test_user_message_counts_usage() {
        let (db, tracker) = setup();
        let user = Uuid::new_v4();

        let summary = tracker
            .track_message(user, "学生 です。先生 は？", EncounterSource::User)
            .await;

        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.tracked, 2);
        assert_eq!(summary.failed, 0);

        let e = db.encounter(user, 1).unwrap();
        assert_eq!(e.frequency, 1);
        assert_eq!(e.user_usage_count, 1);
        assert_eq!(e.ai_encounter_count, 0);
        assert_eq!(e.source, "conversation");
    }

    #[tokio::test]
    async fn test_repeated_words_accumulate() {
        let (db, tracker) = setup();
        let user = Uuid::new_v4();

        tracker
            .track_message(user, "学生、学生", EncounterSource::Ai)
            .await;
        tracker.track_message(user, "学生", EncounterSource::User).await;

        let e = db.encounter(user, 1).unwrap();
        assert_eq!(e.frequency, 3);
        assert_eq!(e.ai_encounter_count, 2);
        assert_eq!(e.user_usage_count, 1);
    }

    #[tokio::test]
    async fn test_single_characters_and_latin_ignored() {
        let (db, tracker) = setup();
        let user = Uuid::new_v4();

        let summary = tracker
            .track_message(user, "a 木 hello", EncounterSource::User)
            .await;
        assert_eq!(summary, TrackingSummary::default());
        assert!(db.encounter(user, 1).is_none());
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let (db, tracker) = setup();
        db.fail_rpcs(Some("tracker offline"));

        let summary = tracker
            .track_message(Uuid::new_v4(), "学生", EncounterSource::User)
            .await;
        assert_eq!(summary.tracked, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_tracking_runs_on_spawned_task() {
        let (db, tracker) = setup();
        let user = Uuid::new_v4();
        let text = String::from("先生 と 学生");

        let summary = tokio::spawn(async move {
            tracker
                .track_message(user, &text, EncounterSource::Ai)
                .await
        })
        .await
        .unwrap();

        assert_eq!(summary.tracked, 2);
        assert_eq!(db.encounter(user, 2).unwrap().ai_encounter_count, 1);
    }
}
