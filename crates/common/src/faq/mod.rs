//! FAQ store
//!
//! Curated question/answer pairs loaded once at startup from a CSV file
//! with a `question` and an `answer` column. The store is read-only after
//! load and is scanned in file order; the first matching record wins.

mod matcher;

pub use matcher::{normalize, QuestionMatcher, SubstringMatcher};

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One curated question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,
    pub answer: String,
}

impl FaqRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

struct Entry {
    normalized_question: String,
    record: FaqRecord,
}

/// Ordered, immutable FAQ collection with a pluggable matching strategy
pub struct FaqStore {
    entries: Vec<Entry>,
    matcher: Box<dyn QuestionMatcher>,
}

impl FaqStore {
    /// Build a store from in-memory records, using substring matching
    pub fn from_records(records: Vec<FaqRecord>) -> Self {
        Self::with_matcher(records, Box::new(SubstringMatcher))
    }

    /// Build a store with a custom matching strategy
    pub fn with_matcher(records: Vec<FaqRecord>, matcher: Box<dyn QuestionMatcher>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| Entry {
                normalized_question: normalize(&record.question),
                record,
            })
            .collect();

        Self { entries, matcher }
    }

    /// Load a store from a CSV file.
    ///
    /// The whole file must be valid: an unreadable file, a header without
    /// `question` or `answer`, a malformed row or a row with a blank
    /// question or answer fails the load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| AppError::LoadError {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(|e| load_error(e.to_string()))?;

        let headers = reader.headers().map_err(|e| load_error(e.to_string()))?.clone();
        for required in ["question", "answer"] {
            if !headers.iter().any(|h| h == required) {
                return Err(load_error(format!("missing required column `{}`", required)));
            }
        }

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<FaqRecord>().enumerate() {
            // Header is line 1
            let line = index + 2;
            let record = row.map_err(|e| load_error(format!("line {}: {}", line, e)))?;

            if record.question.trim().is_empty() {
                return Err(load_error(format!("line {}: empty question", line)));
            }
            if record.answer.trim().is_empty() {
                return Err(load_error(format!("line {}: empty answer", line)));
            }

            records.push(record);
        }

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "FAQ store loaded"
        );

        Ok(Self::from_records(records))
    }

    /// Answer of the first record whose question matches, in load order
    pub fn find(&self, question: &str) -> Option<&str> {
        let asked = normalize(question);

        self.entries
            .iter()
            .find(|entry| self.matcher.matches(&entry.normalized_question, &asked))
            .map(|entry| entry.record.answer.as_str())
    }

    /// Loaded records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &FaqRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the active matching strategy
    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }
}

impl fmt::Debug for FaqStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaqStore")
            .field("records", &self.entries.len())
            .field("matcher", &self.matcher.name())
            .finish()
    }
}
