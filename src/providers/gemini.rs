//! Google Gemini provider
//!
//! Talks to the `generateContent` endpoint of the Generative Language API.
//!
//! # Configuration
//!
//! ```toml
//! [llm]
//! model = "gemini-2.5-flash-lite"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! api_key_env = "GEMINI_API_KEY"
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::prompts::system_instruction;
use crate::config::LlmSettings;
use crate::conversation::{Role, Source, Turn};

use super::sources::{dedup_sources, scrape_url_sources};
use super::{Gateway, GenerationRequest, GenerationResponse, ProviderError};

const EMPTY_ANSWER: &str = "No response text.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Error response from API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Gemini provider configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key; generation fails with `NotConfigured` without one
    pub api_key: Option<String>,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn from_settings(settings: &LlmSettings, api_key: Option<String>) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// Gemini-backed gateway
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        let contents = request.turns.iter().map(Content::from).collect();

        let tools = if request.options.deep_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction(
                        &request.options,
                        &request.memory_context,
                    )),
                }],
            },
            contents,
            tools,
            generation_config: GenerationConfig {
                temperature: request.options.personality.temperature(),
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
            },
        }
    }

    fn parse_response(body: &str) -> Result<GenerationResponse, ProviderError> {
        let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = if text.trim().is_empty() {
            EMPTY_ANSWER.to_string()
        } else {
            text
        };

        let grounded: Vec<Source> = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                let url = web.uri?;
                let title = web.title.unwrap_or_else(|| url.clone());
                Some(Source { url, title })
            })
            .collect();

        let sources = if grounded.is_empty() {
            scrape_url_sources(&text)
        } else {
            dedup_sources(grounded)
        };

        Ok(GenerationResponse { text, sources })
    }

    fn error_from_status(status: StatusCode, body: &str) -> ProviderError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

        if status == StatusCode::TOO_MANY_REQUESTS {
            ProviderError::QuotaExceeded(message)
        } else {
            ProviderError::Api(message)
        }
    }
}

impl From<&Turn> for Content {
    fn from(turn: &Turn) -> Self {
        Self {
            role: Some(
                match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }
                .to_string(),
            ),
            parts: vec![Part {
                text: Some(turn.content.clone()),
            }],
        }
    }
}

#[async_trait]
impl Gateway for GeminiProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("Gemini API key is not set".to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        tracing::debug!(
            "Sending {} turn(s) to {} (deep_search={}, personality={})",
            request.turns.len(),
            self.config.model,
            request.options.deep_search,
            request.options.personality
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::build_request(&request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_from_status(status, &body));
        }

        let answer = Self::parse_response(&body)?;
        tracing::debug!("Response received with {} source(s)", answer.sources.len());
        Ok(answer)
    }
}
