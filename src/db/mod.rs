// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to a [`Backend`]; production uses Supabase, tests and
//! offline development use the in-memory store.

pub mod memory;
pub mod supabase;

pub use memory::MemoryDb;
pub use supabase::SupabaseDb;

use crate::error::AppError;
use crate::models::{
    Conversation, EncounterSource, JlptVocab, Message, NewConversation, NewMessage,
    ProfileUpdate, TrackedWord, UserProfile, VocabEncounter, VocabStats,
};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const JLPT_VOCAB: &str = "jlpt_vocab";
    pub const VOCAB_TRACKER: &str = "vocab_tracker";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
}

/// Remote procedure names.
pub mod rpc {
    pub const GET_PERSONAS: &str = "get_personas";
    pub const GET_VOCAB_STATS: &str = "get_vocab_stats";
    pub const UPDATE_STREAK: &str = "update_streak";
    pub const ADD_XP: &str = "add_xp";
    pub const CREATE_CONVERSATION: &str = "create_conversation";
    pub const ADD_MESSAGE: &str = "add_message";
    pub const GET_CONVERSATION_MESSAGES: &str = "get_conversation_messages";
    pub const COMPLETE_CONVERSATION: &str = "complete_conversation";
    pub const INCREMENT_WORD_FREQUENCY: &str = "increment_word_frequency";
}

/// Data operations used by the HTTP layer.
#[async_trait]
pub trait Backend: Send + Sync {
    // ─── Personas ───────────────────────────────────────────────

    /// All personas (`get_personas` RPC), rows passed through as returned.
    async fn get_personas(&self) -> Result<Vec<Value>, AppError>;

    // ─── User Profiles ──────────────────────────────────────────

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError>;

    /// Insert a profile. Used at signup.
    async fn create_user_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;

    /// Apply a partial update; `None` if the profile does not exist.
    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError>;

    /// Count today's visit towards the streak (`update_streak` RPC).
    async fn update_streak(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;

    /// Award experience points (`add_xp` RPC).
    async fn add_xp(&self, user_id: Uuid, points: i64) -> Result<Option<UserProfile>, AppError>;

    // ─── Vocabulary ─────────────────────────────────────────────

    /// Word counts per JLPT level for a user (`get_vocab_stats` RPC).
    async fn get_vocab_stats(&self, user_id: Uuid) -> Result<Vec<VocabStats>, AppError>;

    /// Words whose hiragana, kanji or meaning contain `query`.
    async fn search_vocab(&self, query: &str) -> Result<Vec<JlptVocab>, AppError>;

    /// Every word a user has encountered, most frequent first.
    async fn list_tracked_words(&self, user_id: Uuid) -> Result<Vec<TrackedWord>, AppError>;

    /// Count one encounter of a word for a user.
    async fn increment_word_frequency(
        &self,
        user_id: Uuid,
        word_id: i64,
        source: EncounterSource,
    ) -> Result<VocabEncounter, AppError>;

    // ─── Conversations ──────────────────────────────────────────

    async fn create_conversation(
        &self,
        user_id: Uuid,
        new: &NewConversation,
    ) -> Result<Conversation, AppError>;

    /// All conversations of a user, newest first.
    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError>;

    async fn get_conversation(&self, conversation_id: i64)
        -> Result<Option<Conversation>, AppError>;

    async fn add_message(
        &self,
        conversation_id: i64,
        new: &NewMessage,
    ) -> Result<Message, AppError>;

    /// Messages of a conversation, oldest first.
    async fn get_conversation_messages(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, AppError>;

    async fn complete_conversation(&self, conversation_id: i64) -> Result<Conversation, AppError>;
}
