// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod conversation;
pub mod persona;
pub mod user;
pub mod vocab;

pub use conversation::{Conversation, ConversationStatus, Message, NewConversation, NewMessage, Sender};
pub use persona::{Persona, PersonaType};
pub use user::{ProfileUpdate, UserProfile};
pub use vocab::{EncounterSource, JlptVocab, TrackedWord, VocabEncounter, VocabStats};
