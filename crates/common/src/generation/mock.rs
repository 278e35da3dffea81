//! Mock generators for testing
//!
//! Both count their calls so tests can check which tiers ran.

use super::{degraded_answer, LocalGenerator, RemoteGenerator};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock local generator returning a fixed text, or failing when unavailable
pub struct MockLocalGenerator {
    response: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLocalGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A generator whose model cannot be used
    pub fn unavailable() -> Self {
        Self {
            response: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalGenerator for MockLocalGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone().ok_or_else(|| AppError::GeneratorUnavailable {
            message: "mock model not loaded".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-local"
    }
}

/// Mock remote generator returning a fixed answer
pub struct MockRemoteGenerator {
    response: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRemoteGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A generator whose transport always fails
    pub fn failing() -> Self {
        Self {
            response: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteGenerator for MockRemoteGenerator {
    async fn generate(&self, _question: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Some(answer) => answer.clone(),
            None => degraded_answer("connection reset by peer"),
        }
    }

    fn model_name(&self) -> &str {
        "mock-remote"
    }
}
