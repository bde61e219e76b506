// src/genai/client.rs
// Gemini generateContent client (non-streaming, text replies)

use crate::config::ClientConfig;
use crate::error::{LexiError, Result};
use crate::genai::types::{GenerateContentRequest, GenerateContentResponse, Generation};
use crate::genai::{DEFAULT_GEMINI_BASE_URL, DEFAULT_MODEL};
use crate::http::create_shared_client;
use crate::user::UserSettings;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything that can turn a request into one model turn
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerateContentRequest) -> Result<Generation>;
}

/// Google Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(api_key, create_shared_client())
    }

    pub fn with_http_client(api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Client for a signed-in user. The key saved in their settings wins over
    /// the one from the environment.
    pub fn for_user(
        settings: &UserSettings,
        config: &ClientConfig,
        http: reqwest::Client,
    ) -> Result<Self> {
        let api_key = if settings.has_api_key() {
            settings.api_key.trim().to_string()
        } else {
            config
                .gemini_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .ok_or(LexiError::MissingApiKey)?
        };

        Ok(Self::with_http_client(api_key, http)
            .with_model(&config.gemini_model)
            .with_base_url(&config.gemini_base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single prompt, no history
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let generation = self.generate(&GenerateContentRequest::prompt(prompt)).await?;
        Ok(generation.text)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(request_id, model = %self.model, turns = request.contents.len()))]
    async fn generate(&self, request: &GenerateContentRequest) -> Result<Generation> {
        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", &request_id);

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(request_id = %request_id, url = %url, "Sending Gemini request");

        // Key goes in a header; reqwest errors carry the URL
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(request_id = %request_id, error = %e, "Gemini request failed to send");
                LexiError::Http(e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LexiError::Http(e.without_url()))?;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        // Error bodies share the response envelope
        let data: GenerateContentResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) if status.is_success() => {
                return Err(LexiError::GenAi(format!("failed to parse Gemini response: {}", e)));
            }
            Err(_) => GenerateContentResponse::default(),
        };

        if let Some(err) = &data.error {
            warn!(
                request_id = %request_id,
                status = status.as_u16(),
                code = ?err.code,
                api_status = ?err.status,
                "Gemini API error"
            );
            return Err(LexiError::GenAi(err.message.clone()));
        }
        if !status.is_success() {
            warn!(request_id = %request_id, status = status.as_u16(), "Gemini request failed");
            return Err(LexiError::GenAi(format!("Gemini returned HTTP {}", status.as_u16())));
        }

        let generation = extract_generation(data)?;

        info!(
            request_id = %request_id,
            duration_ms,
            reply_len = generation.text.len(),
            total_tokens = ?generation.usage.and_then(|u| u.total_token_count),
            "Gemini request complete"
        );
        Ok(generation)
    }
}

/// Text of the first candidate, thought parts dropped
fn extract_generation(data: GenerateContentResponse) -> Result<Generation> {
    let usage = data.usage_metadata;
    let Some(candidate) = data.candidates.into_iter().next() else {
        let reason = data
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {}", r))
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(LexiError::GenAi(reason));
    };

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(LexiError::GenAi(format!(
            "empty reply (finish reason: {})",
            reason
        )));
    }

    Ok(Generation {
        text,
        finish_reason: candidate.finish_reason,
        usage,
    })
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
