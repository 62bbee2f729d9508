// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local backend for tests and offline development.
//!
//! Implements the same rules the Supabase RPCs apply (streaks, XP,
//! conversation completion) on top of concurrent maps.

use crate::db::Backend;
use crate::error::AppError;
use crate::models::user::MAX_XP_AWARD;
use crate::models::vocab::sort_tracked;
use crate::models::{
    Conversation, ConversationStatus, EncounterSource, JlptVocab, Message, NewConversation,
    NewMessage, Persona, ProfileUpdate, TrackedWord, UserProfile, VocabEncounter, VocabStats,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Most rows returned by a vocabulary search.
const SEARCH_LIMIT: usize = 20;

#[derive(Default)]
struct Store {
    personas: DashMap<i64, Value>,
    profiles: DashMap<Uuid, UserProfile>,
    vocab: DashMap<i64, JlptVocab>,
    encounters: DashMap<(Uuid, i64), VocabEncounter>,
    conversations: DashMap<i64, Conversation>,
    messages: DashMap<i64, Vec<Message>>,
    next_conversation_id: AtomicI64,
    next_message_id: AtomicI64,
    fail_rpc: std::sync::Mutex<Option<String>>,
}

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    store: Arc<Store>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Seeding ─────────────────────────────────────────────────

    pub fn insert_persona(&self, persona: Persona) {
        if let Ok(row) = serde_json::to_value(&persona) {
            self.insert_persona_row(row);
        }
    }

    /// Store a persona row exactly as given, extra columns included.
    pub fn insert_persona_row(&self, row: Value) {
        let id = row["id"].as_i64().unwrap_or_default();
        self.store.personas.insert(id, row);
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.store.profiles.insert(profile.id, profile);
    }

    pub fn insert_vocab(&self, word: JlptVocab) {
        self.store.vocab.insert(word.id, word);
    }

    /// Tracker row for a user and word, if the word has been seen.
    pub fn encounter(&self, user_id: Uuid, word_id: i64) -> Option<VocabEncounter> {
        self.store
            .encounters
            .get(&(user_id, word_id))
            .map(|e| e.clone())
    }

    /// Make every RPC-backed call fail with `message` until cleared.
    pub fn fail_rpcs(&self, message: Option<&str>) {
        if let Ok(mut guard) = self.store.fail_rpc.lock() {
            *guard = message.map(str::to_string);
        }
    }

    fn check_rpc(&self) -> Result<(), AppError> {
        match self.store.fail_rpc.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(message) => Err(AppError::Rpc(message.clone())),
                None => Ok(()),
            },
            Err(_) => Err(AppError::Database("store lock poisoned".to_string())),
        }
    }

    fn update_profile<F>(&self, user_id: Uuid, f: F) -> Option<UserProfile>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut entry = self.store.profiles.get_mut(&user_id)?;
        f(entry.value_mut());
        entry.updated_at = Some(Utc::now().to_rfc3339());
        Some(entry.clone())
    }
}

#[async_trait]
impl Backend for MemoryDb {
    async fn get_personas(&self) -> Result<Vec<Value>, AppError> {
        self.check_rpc()?;
        let mut personas: Vec<(i64, Value)> = self
            .store
            .personas
            .iter()
            .map(|p| (*p.key(), p.value().clone()))
            .collect();
        personas.sort_by_key(|(id, _)| *id);
        Ok(personas.into_iter().map(|(_, row)| row).collect())
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.store.profiles.get(&user_id).map(|p| p.clone()))
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .store
            .profiles
            .iter()
            .find(|p| p.email.as_deref() == Some(email))
            .map(|p| p.value().clone()))
    }

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        use dashmap::mapref::entry::Entry;

        match self.store.profiles.entry(profile.id) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "duplicate key value violates unique constraint \"users_pkey\" ({})",
                profile.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(profile.clone());
                tracing::info!(user_id = %profile.id, "Created user profile");
                Ok(profile.clone())
            }
        }
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError> {
        Ok(self.update_profile(user_id, |p| p.apply_update(update)))
    }

    async fn update_streak(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        self.check_rpc()?;
        let today = Utc::now().date_naive();
        Ok(self.update_profile(user_id, |p| {
            if p.apply_streak(today) {
                tracing::debug!(user_id = %user_id, streak = ?p.streak_days, "Streak updated");
            }
        }))
    }

    async fn add_xp(&self, user_id: Uuid, points: i64) -> Result<Option<UserProfile>, AppError> {
        self.check_rpc()?;
        if !(1..=MAX_XP_AWARD).contains(&points) {
            return Err(AppError::Rpc(format!("invalid xp amount: {}", points)));
        }
        Ok(self.update_profile(user_id, |p| p.add_xp(points)))
    }

    async fn get_vocab_stats(&self, user_id: Uuid) -> Result<Vec<VocabStats>, AppError> {
        self.check_rpc()?;
        let levels: Vec<Value> = self
            .store
            .encounters
            .iter()
            .filter(|e| e.key().0 == user_id)
            .filter_map(|e| {
                self.store
                    .vocab
                    .get(&e.key().1)
                    .and_then(|w| w.jlpt_level.clone())
                    .map(Value::String)
            })
            .collect();
        Ok(VocabStats::aggregate(&levels))
    }

    async fn search_vocab(&self, query: &str) -> Result<Vec<JlptVocab>, AppError> {
        let mut words: Vec<JlptVocab> = self
            .store
            .vocab
            .iter()
            .filter(|w| w.matches(query))
            .map(|w| w.value().clone())
            .collect();
        words.sort_by_key(|w| w.id);
        words.truncate(SEARCH_LIMIT);
        Ok(words)
    }

    async fn list_tracked_words(&self, user_id: Uuid) -> Result<Vec<TrackedWord>, AppError> {
        let mut words: Vec<TrackedWord> = self
            .store
            .encounters
            .iter()
            .filter(|e| e.key().0 == user_id)
            .filter_map(|e| {
                let word = self.store.vocab.get(&e.key().1)?.clone();
                Some(TrackedWord {
                    encounter: e.value().clone(),
                    word,
                })
            })
            .collect();
        sort_tracked(&mut words);
        Ok(words)
    }

    async fn increment_word_frequency(
        &self,
        user_id: Uuid,
        word_id: i64,
        source: EncounterSource,
    ) -> Result<VocabEncounter, AppError> {
        self.check_rpc()?;
        if !self.store.vocab.contains_key(&word_id) {
            return Err(AppError::NotFound(format!("Word {}", word_id)));
        }
        let now = Utc::now();
        let entry = self
            .store
            .encounters
            .entry((user_id, word_id))
            .and_modify(|e| e.record(source, now))
            .or_insert_with(|| VocabEncounter::first(user_id, word_id, source, now));
        Ok(entry.clone())
    }

    async fn create_conversation(
        &self,
        user_id: Uuid,
        new: &NewConversation,
    ) -> Result<Conversation, AppError> {
        self.check_rpc()?;
        if !self.store.personas.contains_key(&new.persona_id) {
            return Err(AppError::Rpc(format!(
                "persona {} does not exist",
                new.persona_id
            )));
        }

        let id = self.store.next_conversation_id.fetch_add(1, Ordering::Relaxed) + 1;
        let conversation = Conversation {
            id,
            user_id,
            persona_id: new.persona_id,
            scenario_id: new.scenario_id,
            title: new.title.clone(),
            phase: Default::default(),
            status: ConversationStatus::Active,
            started_at: Utc::now(),
            completed_at: None,
        };
        self.store.conversations.insert(id, conversation.clone());
        self.store.messages.insert(id, Vec::new());
        Ok(conversation)
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        let mut conversations: Vec<Conversation> = self
            .store
            .conversations
            .iter()
            .filter(|c| c.is_owned_by(user_id))
            .map(|c| c.value().clone())
            .collect();
        conversations.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(conversations)
    }

    async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<Option<Conversation>, AppError> {
        Ok(self
            .store
            .conversations
            .get(&conversation_id)
            .map(|c| c.clone()))
    }

    async fn add_message(
        &self,
        conversation_id: i64,
        new: &NewMessage,
    ) -> Result<Message, AppError> {
        self.check_rpc()?;
        let mut messages = self
            .store
            .messages
            .get_mut(&conversation_id)
            .ok_or_else(|| AppError::Rpc(format!("conversation {} does not exist", conversation_id)))?;

        let message = Message {
            id: self.store.next_message_id.fetch_add(1, Ordering::Relaxed) + 1,
            conversation_id,
            sender: new.sender,
            content: new.content.clone(),
            english: new.english.clone(),
            feedback: new.feedback.clone(),
            suggestions: new.suggestions.clone(),
            vocab_used: new.vocab_used.clone(),
            grammar_used: new.grammar_used.clone(),
            created_at: Utc::now(),
        };
        messages.push(message.clone());
        Ok(message)
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, AppError> {
        self.check_rpc()?;
        Ok(self
            .store
            .messages
            .get(&conversation_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn complete_conversation(&self, conversation_id: i64) -> Result<Conversation, AppError> {
        self.check_rpc()?;
        let mut conversation = self
            .store
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| AppError::NotFound(format!("Conversation {}", conversation_id)))?;

        if !conversation.is_completed() {
            conversation.status = ConversationStatus::Completed;
            conversation.completed_at = Some(Utc::now());
        }
        Ok(conversation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonaType, Sender};

    fn persona(id: i64) -> Persona {
        Persona {
            id,
            name: format!("Persona {}", id),
            persona_type: PersonaType::Tutor,
            avatar_url: None,
            description: None,
            personality: None,
            speaking_style: None,
            jlpt_level: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_personas_sorted_by_id() {
        let db = MemoryDb::new();
        db.insert_persona(persona(3));
        db.insert_persona(persona(1));

        let ids: Vec<i64> = db
            .get_personas()
            .await
            .unwrap()
            .iter()
            .filter_map(|p| p["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_persona_rows_keep_extra_columns() {
        let db = MemoryDb::new();
        db.insert_persona_row(serde_json::json!({
            "id": 5,
            "name": "Sensei",
            "type": "teacher",
            "description": null,
            "system_prompt": "Speak slowly."
        }));

        let rows = db.get_personas().await.unwrap();
        assert_eq!(rows[0]["system_prompt"], "Speak slowly.");
        assert!(rows[0]["description"].is_null());
    }

    #[tokio::test]
    async fn test_rpc_failure_injection() {
        let db = MemoryDb::new();
        db.fail_rpcs(Some("boom"));
        assert!(matches!(db.get_personas().await, Err(AppError::Rpc(m)) if m == "boom"));

        db.fail_rpcs(None);
        assert!(db.get_personas().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streak_counts_once_per_day() {
        let db = MemoryDb::new();
        let id = Uuid::new_v4();
        db.insert_profile(UserProfile::new(id, None, "2026-01-01T00:00:00Z"));

        let first = db.update_streak(id).await.unwrap().unwrap();
        assert_eq!(first.streak_days, Some(1));
        let second = db.update_streak(id).await.unwrap().unwrap();
        assert_eq!(second.streak_days, Some(1));

        assert!(db.update_streak(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_xp_bounds() {
        let db = MemoryDb::new();
        let id = Uuid::new_v4();
        db.insert_profile(UserProfile::new(id, None, "2026-01-01T00:00:00Z"));

        assert_eq!(db.add_xp(id, 15).await.unwrap().unwrap().xp, Some(15));
        assert!(db.add_xp(id, 0).await.is_err());
        assert!(db.add_xp(id, MAX_XP_AWARD + 1).await.is_err());
    }

    #[tokio::test]
    async fn test_conversation_lifecycle() {
        let db = MemoryDb::new();
        db.insert_persona(persona(1));
        let user = Uuid::new_v4();

        let conv = db
            .create_conversation(
                user,
                &NewConversation {
                    persona_id: 1,
                    scenario_id: None,
                    title: "Self introduction".to_string(),
                },
            )
            .await
            .unwrap();

        let new = NewMessage {
            sender: Sender::User,
            content: "はじめまして".to_string(),
            english: None,
            feedback: None,
            suggestions: None,
            vocab_used: None,
            grammar_used: None,
        };
        db.add_message(conv.id, &new).await.unwrap();
        db.add_message(conv.id, &new).await.unwrap();

        let messages = db.get_conversation_messages(conv.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].id < messages[1].id);

        let done = db.complete_conversation(conv.id).await.unwrap();
        assert!(done.is_completed());
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_persona_rejected() {
        let db = MemoryDb::new();
        let result = db
            .create_conversation(
                Uuid::new_v4(),
                &NewConversation {
                    persona_id: 42,
                    scenario_id: None,
                    title: "x".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_vocab_stats_from_encounters() {
        let db = MemoryDb::new();
        let user = Uuid::new_v4();
        for (id, level) in [(1, "N5"), (2, "N5"), (3, "N3")] {
            db.insert_vocab(JlptVocab {
                id,
                kanji: None,
                hiragana: format!("word{}", id),
                romaji: None,
                english_meaning: "meaning".to_string(),
                jlpt_level: Some(level.to_string()),
                word_type: None,
            });
            db.increment_word_frequency(user, id, EncounterSource::User)
                .await
                .unwrap();
        }

        let stats = db.get_vocab_stats(user).await.unwrap();
        let counts: Vec<u64> = stats.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![0, 0, 1, 0, 2]);

        let other = db.get_vocab_stats(Uuid::new_v4()).await.unwrap();
        assert!(other.iter().all(|s| s.count == 0));
    }

    #[tokio::test]
    async fn test_tracked_words_most_frequent_first() {
        let db = MemoryDb::new();
        let user = Uuid::new_v4();
        for (id, hiragana) in [(1, "ねこ"), (2, "いぬ")] {
            db.insert_vocab(JlptVocab {
                id,
                kanji: None,
                hiragana: hiragana.to_string(),
                romaji: None,
                english_meaning: String::new(),
                jlpt_level: Some("N5".to_string()),
                word_type: None,
            });
        }

        db.increment_word_frequency(user, 1, EncounterSource::User).await.unwrap();
        db.increment_word_frequency(user, 2, EncounterSource::Ai).await.unwrap();
        db.increment_word_frequency(user, 2, EncounterSource::Hover).await.unwrap();
        db.increment_word_frequency(Uuid::new_v4(), 1, EncounterSource::User)
            .await
            .unwrap();

        let words = db.list_tracked_words(user).await.unwrap();
        let listed: Vec<(i64, u32)> = words
            .iter()
            .map(|w| (w.word.id, w.encounter.frequency))
            .collect();
        assert_eq!(listed, vec![(2, 2), (1, 1)]);
        assert_eq!(words[0].word.hiragana, "いぬ");
    }
}
