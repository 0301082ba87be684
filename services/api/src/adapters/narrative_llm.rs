//! services/api/src/adapters/narrative_llm.rs
//!
//! This module contains the adapter for the narrative-generating LLM.
//! It implements the `NarrativeService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use life_calendar_core::ports::{NarrativeService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `NarrativeService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiNarrativeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiNarrativeAdapter {
    /// Creates a new `OpenAiNarrativeAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `NarrativeService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NarrativeService for OpenAiNarrativeAdapter {
    /// Sends one prompt and returns the raw model text. A response with no
    /// content comes back as an empty string so the caller can classify it
    /// as a soft failure; only transport problems are hard errors.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(text)
    }
}
