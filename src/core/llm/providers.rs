use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::AugmentationConfig;
use crate::error::{ArchflowError, Result};
use super::augmenter::{AugmentRequest, DiagramAugmenter};
use super::failure::AugmentFailure;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

const SYSTEM_PROMPT: &str = "You are a software architect. Redraw the given Mermaid flowchart so it \
explains the architecture more clearly. Keep it a valid Mermaid flowchart. Reply with the flowchart \
text only, without commentary.";

/// Factory function to create the configured augmenter; `None` when augmentation is off
pub fn create_augmenter(config: &AugmentationConfig) -> Result<Option<Box<dyn DiagramAugmenter>>> {
    if !config.enabled {
        return Ok(None);
    }

    let (name, default_base) = match config.provider.as_str() {
        "openai" => ("OpenAI", Some(OPENAI_BASE_URL)),
        "deepseek" => ("DeepSeek", Some(DEEPSEEK_BASE_URL)),
        "openai-compatible" => ("OpenAI-compatible", None),
        other => {
            return Err(ArchflowError::Config(format!(
                "Unsupported augmentation provider: {}",
                other
            )))
        }
    };

    let base_url = config
        .base_url
        .clone()
        .or_else(|| default_base.map(str::to_string))
        .ok_or_else(|| {
            ArchflowError::Config(format!("Provider {} requires augmentation.base_url", config.provider))
        })?;

    Ok(Some(Box::new(ChatCompletionsProvider::new(name, &base_url, config)?)))
}

/// Any service speaking the chat-completions protocol
pub struct ChatCompletionsProvider {
    name: String,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(name: &str, base_url: &str, config: &AugmentationConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ArchflowError::Config(format!("API key required for provider {}", config.provider))
        })?;

        Ok(Self {
            name: name.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens.unwrap_or(2000),
            temperature: config.temperature.unwrap_or(0.2),
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_prompt(request: &AugmentRequest) -> String {
        let mut prompt = String::new();
        prompt.push_str("Analysis summary:\n");
        prompt.push_str(&request.summary);
        prompt.push_str("\n\nCurrent diagram:\n");
        prompt.push_str(&request.diagram);
        prompt
    }
}

#[async_trait]
impl DiagramAugmenter for ChatCompletionsProvider {
    async fn augment(&self, request: &AugmentRequest) -> std::result::Result<String, AugmentFailure> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": Self::build_prompt(request)
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        });

        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AugmentFailure::from_message(format!("{} request failed: {}", self.name, e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AugmentFailure::from_response(status, &error_text));
        }

        let response_data: serde_json::Value = response.json().await.map_err(|e| {
            AugmentFailure::generic(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        response_data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AugmentFailure::generic(format!("{} response had no content", self.name)))
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
