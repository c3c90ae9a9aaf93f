//! `mise-agent`: the LLM boundary.
//!
//! Callers hand an [`AiService`] a [`GenerateRequest`] and get back the
//! completion text plus, when the text holds one, the JSON object found in
//! it. Transport, auth, rate-limit and timeout failures all surface as
//! [`AgentError`].

pub mod client;
pub mod error;
pub mod json;

pub use client::{OpenAiClient, OpenAiConfig};
pub use error::{AgentError, Result};

use async_trait::async_trait;
use serde_json::Value;

/// One single-shot completion request.
#[derive(Clone)]
pub struct GenerateRequest {
    pub api_key: String,
    pub system: String,
    pub prompt: String,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl std::fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("api_key", &"<redacted>")
            .field("system_len", &self.system.len())
            .field("prompt_len", &self.prompt.len())
            .field("json_mode", &self.json_mode)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// First JSON object found in `text`, if any.
    pub structured: Option<Value>,
}

impl Generation {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let structured = json::extract_object(&text);
        Self { text, structured }
    }
}

#[async_trait]
pub trait AiService: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<Generation>;
}
