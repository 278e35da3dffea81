//! AnswerForge Common Library
//!
//! Core of the AnswerForge chatbot backend:
//! - FAQ store with pluggable question matching
//! - Confidence scoring for generated answers
//! - Local and remote answer generators
//! - The tiered resolver (FAQ -> local model -> remote API)
//! - Error types, configuration and metrics

pub mod config;
pub mod confidence;
pub mod errors;
pub mod faq;
pub mod generation;
pub mod metrics;
pub mod resolver;

// Re-export commonly used types
pub use config::AppConfig;
pub use confidence::ConfidenceScorer;
pub use errors::{AppError, Result};
pub use faq::{FaqRecord, FaqStore};
pub use generation::{LocalGenerator, RemoteGenerator};
pub use resolver::{AnswerResult, Resolver, ResolverPolicy, SourceTag};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
