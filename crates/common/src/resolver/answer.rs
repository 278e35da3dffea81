//! Resolved answers and their provenance

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier that produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    Faq,
    LocalModel,
    RemoteApi,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Faq => "FAQ",
            SourceTag::LocalModel => "LOCAL_MODEL",
            SourceTag::RemoteApi => "REMOTE_API",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final answer of a resolution.
///
/// Built only through the per-tier constructors: a local-model answer
/// always carries its confidence, FAQ answers never do, and a remote answer
/// may carry the local score that caused the escalation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    answer: String,
    source: SourceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_confidence: Option<f64>,
}

impl AnswerResult {
    pub fn faq(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: SourceTag::Faq,
            confidence: None,
            local_confidence: None,
        }
    }

    pub fn local(answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            answer: answer.into(),
            source: SourceTag::LocalModel,
            confidence: Some(confidence),
            local_confidence: None,
        }
    }

    pub fn remote(answer: impl Into<String>, local_confidence: Option<f64>) -> Self {
        Self {
            answer: answer.into(),
            source: SourceTag::RemoteApi,
            confidence: None,
            local_confidence,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn source(&self) -> SourceTag {
        self.source
    }

    /// Confidence of a local-model answer
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Score of the rejected local candidate, for remote answers
    pub fn local_confidence(&self) -> Option<f64> {
        self.local_confidence
    }

    pub fn into_answer(self) -> String {
        self.answer
    }

    /// Human-readable provenance, e.g. `Local model (confidence: 0.85)`
    pub fn source_label(&self) -> String {
        match (self.source, self.confidence, self.local_confidence) {
            (SourceTag::Faq, _, _) => "FAQ".to_string(),
            (SourceTag::LocalModel, Some(score), _) => {
                format!("Local model (confidence: {:.2})", score)
            }
            (SourceTag::LocalModel, None, _) => "Local model".to_string(),
            (SourceTag::RemoteApi, _, Some(score)) => {
                format!("Remote API (local confidence: {:.2})", score)
            }
            (SourceTag::RemoteApi, _, None) => "Remote API".to_string(),
        }
    }
}
