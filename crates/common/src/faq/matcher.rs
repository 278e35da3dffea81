//! Question matching strategies for the FAQ store

/// Decides whether a stored FAQ question answers what the user asked.
///
/// Both arguments are already normalized (trimmed and lowercased).
pub trait QuestionMatcher: Send + Sync {
    fn matches(&self, stored: &str, asked: &str) -> bool;

    /// Strategy name for logs and readiness output
    fn name(&self) -> &'static str;
}

/// Matches when the stored question appears verbatim inside the asked one.
///
/// Recall-biased: "Hi, what are the tuition fees this year?" hits the
/// stored "what are the tuition fees". A short stored question such as
/// "fees" also hits any longer question that mentions fees, relevant or
/// not. The direction is fixed: the asked question being contained in the
/// stored one is not a match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl QuestionMatcher for SubstringMatcher {
    fn matches(&self, stored: &str, asked: &str) -> bool {
        asked.contains(stored)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Normalize text for matching: trim surrounding whitespace and lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
