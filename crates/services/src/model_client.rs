use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

//
// ─── COLLABORATOR BOUNDARY ────────────────────────────────────────────────────
//

/// An opaque reference to previously uploaded study material the model can
/// draw on when generating text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRef {
    pub uri: String,
    pub display_name: String,
}

impl ContextRef {
    #[must_use]
    pub fn new(uri: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            display_name: display_name.into(),
        }
    }
}

/// The one capability the learning core needs from a generative model:
/// a prompt plus content references in, raw text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` when the call cannot be made or yields nothing.
    async fn generate(&self, prompt: &str, context: &[ContextRef]) -> Result<String, ModelError>;
}

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ModelConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("STUDY_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

//
// ─── HTTP CLIENT ──────────────────────────────────────────────────────────────
//

/// `TextModel` over an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatModelClient {
    client: Client,
    config: Option<ModelConfig>,
    temperature: f32,
}

impl ChatModelClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ModelConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ModelConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
            temperature: 0.7,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl TextModel for ChatModelClient {
    async fn generate(&self, prompt: &str, context: &[ContextRef]) -> Result<String, ModelError> {
        let config = self.config.as_ref().ok_or(ModelError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        // Content references go in as leading user messages so the model sees
        // the material before the task.
        let mut messages: Vec<ChatMessage> = context
            .iter()
            .map(|file_ref| ChatMessage {
                role: "user",
                content: format!(
                    "Reference material {name}: {uri}",
                    name = file_ref.display_name,
                    uri = file_ref.uri
                ),
            })
            .collect();
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let payload = ChatRequest {
            model: config.model.clone(),
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ModelError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
