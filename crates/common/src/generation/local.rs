//! Local text-generation client
//!
//! Talks to a text-generation server running next to the gateway and
//! serving a pre-trained model artifact from disk:
//! `POST {endpoint}/generate` with `{model, inputs, parameters}`, answered
//! by a list of `{generated_text}` sequences.

use super::LocalGenerator;
use crate::config::LocalModelConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Request body for the local `/generate` endpoint
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_length: usize,
    num_return_sequences: u32,
}

/// One generated sequence
#[derive(Deserialize)]
struct GeneratedSequence {
    generated_text: String,
}

/// HTTP client for a locally hosted text-generation pipeline
pub struct PipelineGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    max_length: usize,
    prompt_template: String,
    timeout: Duration,
}

impl PipelineGenerator {
    pub fn new(config: &LocalModelConfig, model_path: &Path) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/generate", config.endpoint.trim_end_matches('/')),
            model: model_path.display().to_string(),
            max_length: config.max_length,
            prompt_template: config.prompt_template.clone(),
            timeout,
        })
    }

    fn render_prompt(&self, prompt: &str) -> String {
        self.prompt_template.replace("{question}", prompt)
    }

    async fn request(&self, inputs: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            inputs,
            parameters: GenerateParameters {
                max_length: self.max_length,
                num_return_sequences: 1,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::GeneratorTimeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else if e.is_connect() {
                    AppError::GeneratorUnavailable {
                        message: format!("local inference server unreachable at {}", self.url),
                    }
                } else {
                    AppError::GeneratorUnavailable {
                        message: format!("request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GeneratorUnavailable {
                message: format!("local model error {}: {}", status, body),
            });
        }

        let sequences: Vec<GeneratedSequence> = response.json().await.map_err(|e| {
            AppError::GeneratorUnavailable {
                message: format!("failed to parse local model response: {}", e),
            }
        })?;

        sequences
            .into_iter()
            .next()
            .map(|s| s.generated_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::GeneratorUnavailable {
                message: "local model returned no text".to_string(),
            })
    }
}

#[async_trait]
impl LocalGenerator for PipelineGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let inputs = self.render_prompt(prompt);

        let result = self.request(&inputs).await;
        metrics::record_generator(
            start.elapsed().as_secs_f64(),
            "local",
            &self.model,
            result.is_ok(),
        );

        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
