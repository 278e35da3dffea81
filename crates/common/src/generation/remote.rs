//! Remote LLM client (OpenAI-compatible chat completions)
//!
//! Single-turn: a fixed system instruction plus the user question. The
//! first choice's text is returned trimmed. This is the terminal tier, so
//! every failure is folded into a degraded answer instead of an error.

use super::{degraded_answer, RemoteGenerator};
use crate::config::RemoteConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completions client, Groq by default
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    timeout: Duration,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &RemoteConfig, api_key: &str) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            timeout,
        })
    }

    async fn complete(&self, question: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::GeneratorTimeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GeneratorUnavailable {
                message: format!("API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::GeneratorUnavailable {
                message: format!("failed to parse response: {}", e),
            }
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::GeneratorUnavailable {
                message: "empty completion".to_string(),
            })
    }
}

#[async_trait]
impl RemoteGenerator for ChatCompletionsGenerator {
    async fn generate(&self, question: &str) -> String {
        let start = Instant::now();
        let result = self.complete(question).await;
        metrics::record_generator(
            start.elapsed().as_secs_f64(),
            "remote",
            &self.model,
            result.is_ok(),
        );

        match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    model = %self.model,
                    error = %e,
                    "Remote generation failed, returning degraded answer"
                );
                degraded_answer(e)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
