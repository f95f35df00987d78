use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::language_utils::{get_language_name, is_auto};
use crate::providers::Translator;

/// Ollama client used as a translation provider
#[derive(Debug)]
pub struct OllamaTranslator {
    /// Full URL of the generate endpoint
    generate_url: Url,
    /// Model name to use for generation
    model: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    pub done: bool,
    /// Total duration of the request in nanoseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
}

/// System prompt shared by every request
const SYSTEM_PROMPT: &str = "You are a subtitle translator. Reply with the translation only. \
Keep every token of the form [[T0]] exactly as written, and keep every line \
containing <<<GSEP_d3e6p>>> unchanged and in place.";

impl GenerationRequest {
    /// Create a new non-streaming, low temperature generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: Some(SYSTEM_PROMPT.to_string()),
            options: Some(GenerationOptions { temperature: Some(0.1) }),
            stream: Some(false),
        }
    }
}

impl OllamaTranslator {
    /// Create a new client from the server base URL (e.g. `http://localhost:11434`)
    pub fn new(endpoint: &str, model: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        let generate_url = base
            .join("api/generate")
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            generate_url,
            model: model.into(),
            client,
        })
    }

    /// URL requests are sent to
    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }

    /// Build the user prompt for one translation
    pub fn build_prompt(source_language: &str, target_language: &str, text: &str) -> String {
        let target = get_language_name(target_language).unwrap_or_else(|_| target_language.to_string());

        if is_auto(source_language) {
            format!("Translate the following text to {}:\n\n{}", target, text)
        } else {
            let source = get_language_name(source_language).unwrap_or_else(|_| source_language.to_string());
            format!("Translate the following text from {} to {}:\n\n{}", source, target, text)
        }
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String, ProviderError> {
        let prompt = Self::build_prompt(source_language, target_language, text);
        let request = GenerationRequest::new(&self.model, prompt);

        let response = self
            .client
            .post(self.generate_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        let generated: GenerationResponse = serde_json::from_str(&response_text).map_err(|e| {
            let preview: String = response_text.chars().take(500).collect();
            error!("Failed to parse Ollama API response: {}. Raw response: {}", e, preview);
            ProviderError::ParseError(e.to_string())
        })?;

        if let Some(total) = generated.total_duration {
            debug!("Ollama {} answered in {}ms", generated.model, total / 1_000_000);
        }

        Ok(generated.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
