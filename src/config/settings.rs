//! Optional deployment settings loaded from a TOML file
//!
//! Every section is optional; a missing file or section falls back to the
//! built-in defaults.
//!
//! ```toml
//! [llm]
//! model = "gemini-2.5-flash-lite"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! timeout_secs = 120
//!
//! [arcade]
//! opponent_delay_ms = 600
//! tick_interval_ms = 1000
//! best_of = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Model gateway settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Arcade timing and scoring
    #[serde(default)]
    pub arcade: ArcadeSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.arcade.best_of == 0 {
            return Err(ConfigError::Validation(
                "arcade.best_of must be at least 1".to_string(),
            ));
        }
        if self.arcade.tick_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "arcade.tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Model gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Gemini model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Arcade timing and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcadeSettings {
    /// Delay before the tic-tac-toe opponent answers a move
    #[serde(default = "default_opponent_delay_ms")]
    pub opponent_delay_ms: u64,

    /// Math duel countdown tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Rounds in a rock-paper-scissors match
    #[serde(default = "default_best_of")]
    pub best_of: u32,
}

fn default_opponent_delay_ms() -> u64 {
    600
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_best_of() -> u32 {
    3
}

impl ArcadeSettings {
    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for ArcadeSettings {
    fn default() -> Self {
        Self {
            opponent_delay_ms: default_opponent_delay_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            best_of: default_best_of(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SETTINGS: &str = r#"
[llm]
model = "gemini-3-pro-preview"
timeout_secs = 30

[arcade]
opponent_delay_ms = 250
best_of = 5
"#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(SAMPLE_SETTINGS).unwrap();

        assert_eq!(settings.llm.model, "gemini-3-pro-preview");
        assert_eq!(settings.llm.timeout_secs, 30);
        assert_eq!(settings.llm.api_key_env, "GEMINI_API_KEY"); // Default
        assert_eq!(settings.arcade.opponent_delay(), Duration::from_millis(250));
        assert_eq!(settings.arcade.tick_interval(), Duration::from_secs(1));
        assert_eq!(settings.arcade.best_of, 5);
    }

    #[test]
    fn test_empty_settings() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_rejects_zero_best_of() {
        let err = Settings::from_toml("[arcade]\nbest_of = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helpfulat.toml");
        std::fs::write(&path, SAMPLE_SETTINGS).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.arcade.best_of, 5);
    }
}
