//! HTTP Generator - GenerationService over an OpenAI-compatible API.
//!
//! Talks to any chat-completions endpoint that speaks the OpenAI wire
//! format, hosted or local. Streaming uses Server-Sent Events; each
//! `data:` line becomes a `TextChunk` until a finish reason arrives.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpGeneratorConfig::new("https://api.openai.com/v1")
//!     .with_api_key(api_key)
//!     .with_model("gpt-4o-mini");
//!
//! let generator = HttpGenerator::new(config);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    GenerationError, GenerationService, PromptRole, TextChunk, TextChunkStream, TutorPrompt,
};

/// Configuration for the HTTP generator.
#[derive(Debug, Clone)]
pub struct HttpGeneratorConfig {
    /// Base URL of the chat completions API.
    pub endpoint: String,
    /// API key, if the endpoint requires one.
    api_key: Option<Secret<String>>,
    /// Model to request.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl HttpGeneratorConfig {
    /// Creates a configuration pointing at the given base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            max_tokens: 400,
            temperature: 0.3,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    /// Sets the model to request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the completion length cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }
}

/// OpenAI-compatible generation adapter.
pub struct HttpGenerator {
    config: HttpGeneratorConfig,
    client: Client,
}

impl HttpGenerator {
    /// Creates a generator with the given configuration.
    pub fn new(config: HttpGeneratorConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint)
    }

    /// Converts a tutor prompt to the wire format.
    fn to_wire_request(&self, prompt: &TutorPrompt, stream: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(prompt.messages.len() + 1);

        messages.push(ChatMessage {
            role: "system".to_string(),
            content: prompt.system.clone(),
        });

        for msg in &prompt.messages {
            messages.push(ChatMessage {
                role: match msg.role {
                    PromptRole::Student => "user",
                    PromptRole::Tutor => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: if stream { Some(true) } else { None },
        }
    }

    /// Adds the Authorization header when an API key is configured.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key() {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// Sends a request and classifies transport failures.
    async fn send(&self, request: &ChatRequest) -> Result<Response, GenerationError> {
        self.authorize(self.client.post(self.completions_url()))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    GenerationError::network(format!("Connection failed: {}", e))
                } else {
                    GenerationError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto generation errors.
    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, GenerationError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(GenerationError::AuthenticationFailed),
            429 => {
                let retry_after = parse_retry_after(&error_body);
                Err(GenerationError::rate_limited(retry_after))
            }
            400 => Err(GenerationError::InvalidRequest(error_body)),
            500..=599 => Err(GenerationError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(GenerationError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses a non-streaming response down to the reply text.
    async fn parse_reply(&self, response: Response) -> Result<String, GenerationError> {
        let response = self.handle_response_status(response).await?;

        let wire: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::parse("No choices in response"))?;

        Ok(choice.message.content)
    }
}

#[async_trait]
impl GenerationService for HttpGenerator {
    async fn generate(&self, prompt: &TutorPrompt) -> Result<String, GenerationError> {
        let request = self.to_wire_request(prompt, false);
        let mut last_error = GenerationError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send(&request).await {
                Ok(response) => match self.parse_reply(response).await {
                    Ok(reply) => return Ok(reply),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }

    async fn stream_generate(
        &self,
        prompt: &TutorPrompt,
    ) -> Result<TextChunkStream, GenerationError> {
        let request = self.to_wire_request(prompt, true);
        let response = self.send(&request).await?;
        let response = self.handle_response_status(response).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk_result| {
                chunk_result.map_err(|e| GenerationError::network(format!("Stream error: {}", e)))
            })
            .map(|chunk_result| match chunk_result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    parse_sse_chunks(&text)
                }
                Err(e) => vec![Err(e)],
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }
}

/// Parses SSE data lines into text chunks.
///
/// A finish reason produces the terminating chunk; the `[DONE]` marker
/// that follows it is swallowed.
fn parse_sse_chunks(text: &str) -> Vec<Result<TextChunk, GenerationError>> {
    let mut results = Vec::new();

    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            if data == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<StreamChunkWire>(data) {
                Ok(chunk) => {
                    if let Some(choice) = chunk.choices.first() {
                        if let Some(ref content) = choice.delta.content {
                            if !content.is_empty() {
                                results.push(Ok(TextChunk::content(content)));
                            }
                        }

                        if choice.finish_reason.is_some() {
                            results.push(Ok(TextChunk::last()));
                        }
                    }
                }
                Err(e) => {
                    // Only error on non-empty data that fails to parse
                    if !data.trim().is_empty() {
                        results.push(Err(GenerationError::parse(format!(
                            "Failed to parse SSE chunk: {}",
                            e
                        ))));
                    }
                }
            }
        }
    }

    results
}

/// Parses retry-after from an error response, defaulting to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(msg) = parsed.get("error").and_then(|e| e.get("message")) {
            if let Some(s) = msg.as_str() {
                // "try again in Xs" pattern
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                        if let Ok(secs) = rest[..num_end].parse::<u32>() {
                            return secs;
                        }
                    }
                }
            }
        }
    }
    30
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct StreamChunkWire {
    choices: Vec<StreamChoiceWire>,
}

#[derive(Debug, Deserialize)]
struct StreamChoiceWire {
    delta: StreamDeltaWire,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDeltaWire {
    content: Option<String>,
}
