//! Application configuration

pub mod prompts;
pub mod settings;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use prompts::{Personality, PromptOptions};
pub use settings::{ArcadeSettings, ConfigError, LlmSettings, Settings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = match env::var("HELPFULAT_CONFIG") {
            Ok(path) => Settings::from_file(&PathBuf::from(path))?,
            Err(_) => Settings::default(),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_dir: env::var("HELPFULAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            gemini_api_key: env::var(&settings.llm.api_key_env).ok(),
            settings,
        })
    }
}
