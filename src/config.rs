use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mongo_db_url: String,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_ideas_per_inspiration")]
    pub ideas_per_inspiration: u32,

    /// Key of the pre-seeded `sources` document to pull inspirations from.
    #[serde(default = "default_source_key")]
    pub source_key: String,

    /// Stop generating once this many ideas are already scheduled ahead.
    /// 576 is two days of publications at one every five minutes.
    #[serde(default = "default_safe_future_pub_count")]
    pub safe_future_pub_count: u64,

    #[serde(default = "default_tokens_per_inspiration")]
    pub tokens_per_inspiration: usize,

    #[serde(default = "default_generation_concurrency")]
    pub generation_concurrency: usize,
}

fn default_db_name() -> String {
    "idea-forge".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo-16k".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_ideas_per_inspiration() -> u32 {
    60
}

fn default_source_key() -> String {
    "techcrunch".to_string()
}

fn default_safe_future_pub_count() -> u64 {
    576
}

fn default_tokens_per_inspiration() -> usize {
    1000
}

fn default_generation_concurrency() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_db_url: String::new(),
            db_name: default_db_name(),
            openai_api_key: String::new(),
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            temperature: default_temperature(),
            ideas_per_inspiration: default_ideas_per_inspiration(),
            source_key: default_source_key(),
            safe_future_pub_count: default_safe_future_pub_count(),
            tokens_per_inspiration: default_tokens_per_inspiration(),
            generation_concurrency: default_generation_concurrency(),
        }
    }
}

impl Config {
    /// Load the optional config file, apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        let mut config = Self::from_file(&Self::config_path())?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Environment variables win over the config file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, name: &str| {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };

        set(&mut self.mongo_db_url, "MONGO_DB_URL");
        set(&mut self.db_name, "MONGO_DB_NAME");
        set(&mut self.openai_api_key, "OPENAI_API_KEY");
        set(&mut self.openai_model, "OPENAI_MODEL");
        set(&mut self.source_key, "IDEA_SOURCE_KEY");
    }

    pub fn validate(&self) -> Result<()> {
        if self.mongo_db_url.trim().is_empty() {
            return Err(AppError::Config("MONGO_DB_URL must be set".into()));
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(AppError::Config("OPENAI_API_KEY must be set".into()));
        }
        if self.db_name.trim().is_empty() {
            return Err(AppError::Config("db_name must be non-empty".into()));
        }
        if self.source_key.trim().is_empty() {
            return Err(AppError::Config("source_key must be non-empty".into()));
        }
        if self.ideas_per_inspiration == 0 {
            return Err(AppError::Config("ideas_per_inspiration must be > 0".into()));
        }
        if self.tokens_per_inspiration == 0 {
            return Err(AppError::Config("tokens_per_inspiration must be > 0".into()));
        }
        if self.generation_concurrency == 0 {
            return Err(AppError::Config("generation_concurrency must be > 0".into()));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("idea-forge")
            .join("config.toml")
    }
}
