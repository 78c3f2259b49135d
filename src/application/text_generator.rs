// Text generation port and the timeout-bounded renderer built on it
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a single prompt and return the raw model text
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String>;

    fn model_name(&self) -> &str;
}

/// Calls a [`TextGenerator`] under a wall-clock limit.
///
/// On timeout the pending completion future is dropped, which aborts the
/// underlying HTTP request. Errors, timeouts and too-short answers all
/// come back as `None` so callers can fall back to templates.
#[derive(Clone)]
pub struct LlmRenderer {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl LlmRenderer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
            max_tokens: 512,
            temperature: 0.6,
        }
    }

    /// Renderer that never calls a model
    pub fn disabled() -> Self {
        Self {
            generator: None,
            timeout: Duration::ZERO,
            max_tokens: 0,
            temperature: 0.0,
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn render(
        &self,
        system: Option<&str>,
        prompt: &str,
        min_chars: usize,
    ) -> Option<String> {
        self.render_with(system, prompt, min_chars, self.max_tokens, self.temperature)
            .await
    }

    /// Like [`render`](Self::render) with per-call sampling settings
    pub async fn render_with(
        &self,
        system: Option<&str>,
        prompt: &str,
        min_chars: usize,
        max_tokens: u32,
        temperature: f32,
    ) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let request = CompletionRequest {
            system: system.map(str::to_string),
            prompt: prompt.to_string(),
            max_tokens,
            temperature,
        };

        match tokio::time::timeout(self.timeout, generator.complete(request)).await {
            Ok(Ok(text)) => {
                let text = text.trim();
                if text.chars().count() < min_chars.max(1) {
                    tracing::warn!(
                        model = generator.model_name(),
                        chars = text.chars().count(),
                        min_chars,
                        "LLM answer too short, using fallback"
                    );
                    return None;
                }
                tracing::debug!(model = generator.model_name(), chars = text.len(), "LLM answer received");
                Some(text.to_string())
            }
            Ok(Err(e)) => {
                tracing::warn!(model = generator.model_name(), error = %e, "LLM call failed, using fallback");
                None
            }
            Err(_) => {
                tracing::warn!(
                    model = generator.model_name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "LLM call timed out, using fallback"
                );
                None
            }
        }
    }

    /// Always returns text: the model answer or the fallback
    pub async fn render_or<F>(
        &self,
        system: Option<&str>,
        prompt: &str,
        min_chars: usize,
        fallback: F,
    ) -> String
    where
        F: FnOnce() -> String,
    {
        match self.render(system, prompt, min_chars).await {
            Some(text) => text,
            None => fallback(),
        }
    }
}
