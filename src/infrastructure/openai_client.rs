// OpenAI-compatible chat completions client
use crate::application::text_generator::{CompletionRequest, TextGenerator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// `request_timeout` is an outer bound only; callers apply their own
    /// shorter limits per call
    pub fn new(base_url: &str, api_key: String, model: String, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build LLM HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system.as_deref() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    messages
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM request failed with status {}: {}", status, body);
        }

        let data = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse LLM response")?;

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .context("LLM response had no content")
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_comes_first() {
        let request = CompletionRequest {
            system: Some("be brief".to_string()),
            prompt: "hello".to_string(),
            max_tokens: 10,
            temperature: 0.5,
        };
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest {
            system: None,
            prompt: "hi".to_string(),
            max_tokens: 64,
            temperature: 0.7,
        };
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: build_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 64);
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":" Water weekly. "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some(" Water weekly. ")
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = OpenAiClient::new(
            "https://api.example.com/v1/",
            "key".to_string(),
            "model".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.completions_url(), "https://api.example.com/v1/chat/completions");
    }
}
