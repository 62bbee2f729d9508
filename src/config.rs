// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::path::PathBuf;

/// Which data backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    /// Supabase PostgREST/RPC
    Supabase,
    /// Process-local store (tests and offline development)
    Memory,
}

impl std::str::FromStr for DataBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(DataBackend::Supabase),
            "memory" => Ok(DataBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: "DATA_BACKEND",
                reason: format!("unknown backend '{}'", other),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data backend selection
    pub data_backend: DataBackend,
    /// Supabase project URL, e.g. https://xyz.supabase.co
    pub supabase_url: String,
    /// Supabase service role key (server-side only)
    pub supabase_service_key: String,
    /// Secret used by Supabase Auth to sign access tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Directory holding the built SPA (`index.html`)
    pub static_dir: PathBuf,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let data_backend = match env::var("DATA_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => DataBackend::Supabase,
        };

        // Supabase credentials are only required when Supabase is the backend
        let supabase_var = |name: &'static str| -> Result<String, ConfigError> {
            match env::var(name) {
                Ok(v) => Ok(v.trim().to_string()),
                Err(_) if data_backend == DataBackend::Memory => Ok(String::new()),
                Err(_) => Err(ConfigError::Missing(name)),
            }
        };

        let supabase_url = supabase_var("SUPABASE_URL")?
            .trim_end_matches('/')
            .to_string();
        if data_backend == DataBackend::Supabase && !supabase_url.starts_with("http") {
            return Err(ConfigError::Invalid {
                name: "SUPABASE_URL",
                reason: "must be an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            data_backend,
            supabase_url,
            supabase_service_key: supabase_var("SUPABASE_SERVICE_ROLE_KEY")?,
            jwt_signing_key: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dist/public")),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    /// Config for tests: in-memory backend, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            data_backend: DataBackend::Memory,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test_service_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            frontend_url: "http://localhost:5173".to_string(),
            static_dir: PathBuf::from("does-not-exist"),
            port: 8080,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Single test touching the process environment to avoid races
        env::set_var("DATA_BACKEND", "supabase");
        env::set_var("SUPABASE_URL", "https://example.supabase.co/");
        env::set_var("SUPABASE_SERVICE_ROLE_KEY", "service");
        env::set_var("SUPABASE_JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.data_backend, DataBackend::Supabase);
        assert_eq!(config.supabase_url, "https://example.supabase.co");
        assert_eq!(config.port, 8080);

        env::set_var("DATA_BACKEND", "memory");
        env::remove_var("SUPABASE_URL");
        let config = Config::from_env().expect("Memory backend needs no Supabase URL");
        assert_eq!(config.data_backend, DataBackend::Memory);

        env::set_var("DATA_BACKEND", "mongodb");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "DATA_BACKEND", .. })
        ));
        env::remove_var("DATA_BACKEND");
    }
}
