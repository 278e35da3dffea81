//! Configuration management for AnswerForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - A single file named by `APP_CONFIG_FILE`, which replaces the layered files
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable accepted as a fallback for the remote API key
pub const REMOTE_API_KEY_FALLBACK_ENV: &str = "GROQ_API_KEY";

/// Environment variable naming a single config file that replaces the layered lookup
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// FAQ source configuration
    #[serde(default)]
    pub faq: FaqConfig,

    /// Local text-generation model (optional tier)
    #[serde(default)]
    pub local_model: LocalModelConfig,

    /// Remote LLM API (terminal tier)
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Resolution policy
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FaqConfig {
    /// Path to the FAQ CSV file (columns: question, answer)
    #[serde(default = "default_faq_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalModelConfig {
    /// Path to the pre-trained model artifact. The tier is skipped when
    /// unset or when the path does not exist.
    pub model_path: Option<PathBuf>,

    /// Base URL of the local inference server
    #[serde(default = "default_local_endpoint")]
    pub endpoint: String,

    /// Maximum generation length
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Request timeout in seconds
    #[serde(default = "default_local_timeout")]
    pub timeout_secs: u64,

    /// Prompt template, `{question}` is replaced by the user question
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// API key for the remote LLM service
    pub api_key: Option<String>,

    /// Chat completions endpoint (OpenAI-compatible)
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    /// Model to use
    #[serde(default = "default_remote_model")]
    pub model: String,

    /// System instruction sent with every question
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Minimum local-model confidence accepted without escalation
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Apply the popular-character junk heuristic when scoring long answers
    #[serde(default = "default_autojunk")]
    pub autojunk: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_faq_path() -> PathBuf { PathBuf::from("data/faqs.csv") }
fn default_local_endpoint() -> String { "http://127.0.0.1:8000".to_string() }
fn default_max_length() -> usize { 100 }
fn default_local_timeout() -> u64 { 30 }
fn default_prompt_template() -> String { "{question}".to_string() }
fn default_remote_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}
fn default_remote_model() -> String { "compound-beta-mini".to_string() }
fn default_system_prompt() -> String { "You are a helpful chatbot.".to_string() }
fn default_remote_timeout() -> u64 { 30 }
fn default_confidence_threshold() -> f64 { 0.7 }
fn default_autojunk() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self { path: default_faq_path() }
    }
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            endpoint: default_local_endpoint(),
            max_length: default_max_length(),
            timeout_secs: default_local_timeout(),
            prompt_template: default_prompt_template(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_remote_endpoint(),
            model: default_remote_model(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            autojunk: default_autojunk(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RESOLVER__CONFIDENCE_THRESHOLD=0.8
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let mut loaded: Self = config.try_deserialize()?;
        loaded.apply_key_fallback(std::env::var(REMOTE_API_KEY_FALLBACK_ENV).ok());
        Ok(loaded)
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let mut loaded: Self = config.try_deserialize()?;
        loaded.apply_key_fallback(std::env::var(REMOTE_API_KEY_FALLBACK_ENV).ok());
        Ok(loaded)
    }

    fn apply_key_fallback(&mut self, fallback: Option<String>) {
        if self.remote_api_key().is_none() {
            self.remote.api_key = fallback;
        }
    }

    /// Remote API key, ignoring blank values
    pub fn remote_api_key(&self) -> Option<&str> {
        self.remote
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Check startup invariants. Every failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.remote_api_key().is_none() {
            return Err(AppError::Configuration {
                message: format!(
                    "remote API key missing: set APP__REMOTE__API_KEY or {}",
                    REMOTE_API_KEY_FALLBACK_ENV
                ),
            });
        }

        let threshold = self.resolver.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Configuration {
                message: format!(
                    "resolver.confidence_threshold must be within [0, 1], got {}",
                    threshold
                ),
            });
        }

        if self.local_model.max_length == 0 {
            return Err(AppError::Configuration {
                message: "local_model.max_length must be greater than zero".to_string(),
            });
        }

        if self.local_model.timeout_secs == 0 || self.remote.timeout_secs == 0 {
            return Err(AppError::Configuration {
                message: "generator timeouts must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get local generation timeout as Duration
    pub fn local_timeout(&self) -> Duration {
        Duration::from_secs(self.local_model.timeout_secs)
    }

    /// Get remote generation timeout as Duration
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn with_key() -> AppConfig {
        let mut config = AppConfig::default();
        config.remote.api_key = Some("gsk_test".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.resolver.confidence_threshold, 0.7);
        assert_eq!(config.local_model.max_length, 100);
        assert_eq!(config.remote.model, "compound-beta-mini");
        assert!(config.local_model.model_path.is_none());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut config = AppConfig::default();
        config.remote.api_key = Some("   ".to_string());
        assert!(config.remote_api_key().is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_fallback_only_fills_gaps() {
        let mut config = AppConfig::default();
        config.apply_key_fallback(Some("from-env".to_string()));
        assert_eq!(config.remote_api_key(), Some("from-env"));

        let mut config = with_key();
        config.apply_key_fallback(Some("from-env".to_string()));
        assert_eq!(config.remote_api_key(), Some("gsk_test"));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = with_key();
        config.resolver.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        config.resolver.confidence_threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let mut config = with_key();
        config.local_model.max_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            concat!(
                "[resolver]\nconfidence_threshold = 0.55\n\n",
                "[remote]\napi_key = \"gsk_file\"\n\n",
                "[local_model]\nmodel_path = \"models/gpt2-campus\"\nmax_length = 64"
            )
        )
        .unwrap();

        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.resolver.confidence_threshold, 0.55);
        assert_eq!(config.remote_api_key(), Some("gsk_file"));
        assert_eq!(config.local_model.max_length, 64);
        assert_eq!(config.local_model.model_path, Some(PathBuf::from("models/gpt2-campus")));
        // Untouched sections fall back to defaults
        assert_eq!(config.server.port, 8080);
        assert!(config.resolver.autojunk);
    }
}
