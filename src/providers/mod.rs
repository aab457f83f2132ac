//! Language-model gateway
//!
//! The session manager hands the gateway a transcript plus the memory
//! context and gets back answer text and cited sources. Prompt templating and
//! the wire format live behind the [`Gateway`] trait.

mod gemini;
mod sources;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::PromptOptions;
use crate::conversation::{Source, Turn};

pub use gemini::{GeminiConfig, GeminiProvider};
pub use sources::{dedup_sources, scrape_url_sources};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Everything one generation needs
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Transcript so far, ending with the new user turn
    pub turns: Vec<Turn>,
    pub options: PromptOptions,
    /// Rendered memory context for the current user
    pub memory_context: String,
}

/// Answer text and the sources it cites
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub sources: Vec<Source>,
}

/// A hosted model that turns a transcript into an answer
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, ProviderError>;
}
