use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_core::{ModelConfig, VigilError};

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use vigil_review::model::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this diff".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use vigil_review::model::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

/// Anything that can answer a single system+user completion request.
///
/// The review pipeline only needs this one operation; abstracting it lets
/// tests substitute a scripted model for the HTTP client.
#[allow(async_fn_in_trait)]
pub trait CompletionModel {
    /// Send one completion request and return the raw text response.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, VigilError>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Ollama, vLLM, LiteLLM, etc. Each request carries the per-call
/// deadline from [`ModelConfig::request_timeout_secs`]; there are no retries,
/// a failed call surfaces to the caller and the ensemble absorbs it.
///
/// # Examples
///
/// ```
/// use vigil_core::ModelConfig;
/// use vigil_review::model::ModelClient;
///
/// let config = ModelConfig {
///     api_key: Some("test-key".into()),
///     ..ModelConfig::default()
/// };
/// let client = ModelClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4o");
/// ```
pub struct ModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    /// Create a new model client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self, VigilError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| VigilError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl CompletionModel for ModelClient {
    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Transport`] on connection or deadline failures,
    /// [`VigilError::Upstream`] when the provider answers with a non-success
    /// status (carrying the status code and response body).
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, VigilError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com");
        let url = format!("{base_url}/v1/chat/completions");

        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: system.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            },
        ];
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| VigilError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(VigilError::Upstream {
                service: "model",
                status: status.as_u16(),
                body: body_text,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| VigilError::Transport(format!("failed to parse response: {e}")))?;

        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_succeeds() {
        let config = ModelConfig::default();
        assert!(ModelClient::new(&config).is_ok());
    }

    #[test]
    fn model_returns_config_model() {
        let config = ModelConfig {
            model: "gpt-4o-mini".into(),
            ..ModelConfig::default()
        };
        let client = ModelClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn chat_response_extracts_content() {
        let raw = r#"{"choices": [{"message": {"content": "hi"}}]}"#;
        let chat: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn chat_response_tolerates_null_content() {
        let raw = r#"{"choices": [{"message": {"content": null}}]}"#;
        let chat: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(chat.choices[0].message.content.is_none());
    }
}
