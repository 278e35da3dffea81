//! Answer generator abstraction
//!
//! Two kinds of generator back the non-FAQ tiers:
//! - [`LocalGenerator`]: a locally hosted text-generation model. Optional,
//!   fallible; failures make the resolver skip the tier.
//! - [`RemoteGenerator`]: a hosted LLM API. Required, and infallible by
//!   signature: transport and API errors come back as a degraded answer.

mod local;
mod mock;
mod remote;

pub use local::PipelineGenerator;
pub use mock::{MockLocalGenerator, MockRemoteGenerator};
pub use remote::ChatCompletionsGenerator;

use crate::config::{LocalModelConfig, RemoteConfig};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Prefix of every degraded remote answer
pub const DEGRADED_ANSWER_PREFIX: &str = "⚠️ Remote API error:";

/// Trait for locally hosted text generation
#[async_trait]
pub trait LocalGenerator: Send + Sync {
    /// Generate a candidate answer. Every call is a fresh generation.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Trait for the remote LLM fallback
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    /// Answer a single-turn question. Never fails: errors are turned into
    /// a user-visible answer built by [`degraded_answer`].
    async fn generate(&self, question: &str) -> String;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// User-visible answer for a failed remote call
pub fn degraded_answer(detail: impl fmt::Display) -> String {
    format!("{} {}", DEGRADED_ANSWER_PREFIX, detail)
}

/// Create the local generator if a model artifact is configured and present.
///
/// A missing artifact is not an error: the local tier is simply disabled.
pub fn create_local_generator(
    config: &LocalModelConfig,
) -> Result<Option<Arc<dyn LocalGenerator>>> {
    let Some(model_path) = config.model_path.as_ref() else {
        tracing::info!("No local model configured, local tier disabled");
        return Ok(None);
    };

    if !model_path.exists() {
        tracing::warn!(
            model_path = %model_path.display(),
            "Local model artifact not found, local tier disabled"
        );
        return Ok(None);
    }

    let generator = PipelineGenerator::new(config, model_path)?;
    tracing::info!(
        model = generator.model_name(),
        endpoint = %config.endpoint,
        max_length = config.max_length,
        "Local tier enabled"
    );
    Ok(Some(Arc::new(generator)))
}

/// Create the remote generator. The API key is mandatory.
pub fn create_remote_generator(config: &RemoteConfig) -> Result<Arc<dyn RemoteGenerator>> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Configuration {
            message: "remote API key is required".to_string(),
        })?;

    let generator = ChatCompletionsGenerator::new(config, api_key)?;
    tracing::info!(
        model = generator.model_name(),
        endpoint = %config.endpoint,
        "Remote tier enabled"
    );
    Ok(Arc::new(generator))
}
