// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Kaiwa Tutor: Japanese conversation practice backed by Supabase
//!
//! This crate provides the HTTP service in front of the Supabase project
//! (profiles, personas, conversations, vocabulary tracking), the guarded
//! page shell, and a typed client with the session and preference state
//! the frontend relies on.

pub mod client;
pub mod config;
pub mod db;
pub mod debounce;
pub mod error;
pub mod middleware;
pub mod models;
pub mod prefs;
pub mod routes;
pub mod services;
pub mod session;
pub mod text;

use config::Config;
use db::Backend;
use services::VocabTracker;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Backend>,
    pub vocab: VocabTracker,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn Backend>) -> Self {
        Self {
            config,
            vocab: VocabTracker::new(db.clone()),
            db,
        }
    }
}
