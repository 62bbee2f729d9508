// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversations between a learner and a persona, and their messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest message body accepted.
pub const MAX_MESSAGE_LEN: u64 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ConversationPhase {
    #[default]
    Guided,
    Transitioning,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ConversationStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Conversation {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub user_id: Uuid,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub persona_id: i64,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub scenario_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub phase: ConversationPhase,
    #[serde(default)]
    pub status: ConversationStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn is_completed(&self) -> bool {
        self.status == ConversationStatus::Completed
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Message {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub conversation_id: i64,
    pub sender: Sender,
    pub content: String,
    /// English translation of `content`
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number[] | null"))]
    pub vocab_used: Option<Vec<i64>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number[] | null"))]
    pub grammar_used: Option<Vec<i64>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for starting a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewConversation {
    #[validate(range(min = 1))]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub persona_id: i64,
    #[serde(default)]
    #[validate(range(min = 1))]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub scenario_id: Option<i64>,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
}

/// Request body for adding a message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewMessage {
    pub sender: Sender,
    #[validate(
        length(min = 1, max = MAX_MESSAGE_LEN),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = MAX_MESSAGE_LEN))]
    pub english: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number[] | null"))]
    pub vocab_used: Option<Vec<i64>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number[] | null"))]
    pub grammar_used: Option<Vec<i64>>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}
