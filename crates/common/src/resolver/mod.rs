//! Tiered answer resolution
//!
//! Each question walks the tiers in cost order and stops at the first one
//! that satisfies the policy:
//!
//! ```text
//! START -> FAQ_CHECK -> { ANSWERED | LOCAL_CHECK } -> { ANSWERED | REMOTE_CHECK } -> ANSWERED
//! ```
//!
//! 1. FAQ store hit: answered, trusted without scoring.
//! 2. Local model (when configured): the candidate is scored against the
//!    question and accepted when `score >= confidence_threshold`.
//! 3. Remote API: terminal tier, always yields an answer.
//!
//! No tier runs more than once per call and nothing is retried. The
//! resolver holds no mutable state, so one instance serves any number of
//! concurrent requests.

mod answer;

pub use answer::{AnswerResult, SourceTag};

use crate::config::AppConfig;
use crate::confidence::ConfidenceScorer;
use crate::errors::{AppError, Result};
use crate::faq::FaqStore;
use crate::generation::{self, degraded_answer, LocalGenerator, RemoteGenerator};
use crate::metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default confidence gate for local-model answers
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Resolution policy knobs
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Minimum local-model score accepted without escalation
    pub confidence_threshold: f64,

    /// Upper bound on a local generation
    pub local_timeout: Duration,

    /// Upper bound on a remote generation
    pub remote_timeout: Duration,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            local_timeout: Duration::from_secs(30),
            remote_timeout: Duration::from_secs(30),
        }
    }
}

impl ResolverPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            confidence_threshold: config.resolver.confidence_threshold,
            local_timeout: config.local_timeout(),
            remote_timeout: config.remote_timeout(),
        }
    }
}

/// The answer pipeline
pub struct Resolver {
    faq: Arc<FaqStore>,
    local: Option<Arc<dyn LocalGenerator>>,
    remote: Arc<dyn RemoteGenerator>,
    scorer: ConfidenceScorer,
    policy: ResolverPolicy,
}

impl Resolver {
    /// Create a resolver with the FAQ and remote tiers only
    pub fn new(faq: Arc<FaqStore>, remote: Arc<dyn RemoteGenerator>) -> Self {
        Self {
            faq,
            local: None,
            remote,
            scorer: ConfidenceScorer::default(),
            policy: ResolverPolicy::default(),
        }
    }

    /// Enable the local model tier
    pub fn with_local(mut self, local: Arc<dyn LocalGenerator>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_policy(mut self, policy: ResolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Wire every tier from configuration.
    ///
    /// Fails on a missing remote key (`Configuration`) or an unusable FAQ
    /// source (`LoadError`). A missing local model only disables its tier.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let remote = generation::create_remote_generator(&config.remote)?;
        let faq = Arc::new(FaqStore::load(&config.faq.path)?);
        let local = generation::create_local_generator(&config.local_model)?;

        let mut resolver = Resolver::new(faq, remote)
            .with_policy(ResolverPolicy::from_config(config))
            .with_scorer(ConfidenceScorer::new(config.resolver.autojunk));

        if let Some(local) = local {
            resolver = resolver.with_local(local);
        }

        Ok(resolver)
    }

    /// Answer a question, tagging the answer with the tier that produced it.
    ///
    /// Only an empty or whitespace-only question is an error.
    #[tracing::instrument(name = "resolve", skip_all, fields(question_len = question.len()))]
    pub async fn resolve(&self, question: &str) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::invalid_input("Question is required"));
        }

        let start = Instant::now();

        if let Some(answer) = self.faq.find(question) {
            metrics::record_faq_lookup(true);
            return Ok(self.finish(AnswerResult::faq(answer), start));
        }
        metrics::record_faq_lookup(false);

        let mut local_confidence = None;
        if let Some(local) = &self.local {
            match self.generate_local(local.as_ref(), question).await {
                Ok(candidate) => {
                    let score = self.scorer.score(question, &candidate);
                    metrics::record_local_confidence(score);

                    if score >= self.policy.confidence_threshold {
                        return Ok(self.finish(AnswerResult::local(candidate, score), start));
                    }

                    debug!(
                        score,
                        threshold = self.policy.confidence_threshold,
                        "Local candidate below threshold, escalating"
                    );
                    local_confidence = Some(score);
                }
                Err(e) => {
                    warn!(error = %e, model = local.model_name(), "Local tier skipped");
                }
            }
        }

        let answer = self.generate_remote(question).await;
        Ok(self.finish(AnswerResult::remote(answer, local_confidence), start))
    }

    async fn generate_local(&self, local: &dyn LocalGenerator, question: &str) -> Result<String> {
        let timeout = self.policy.local_timeout;
        match tokio::time::timeout(timeout, local.generate(question)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::GeneratorTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn generate_remote(&self, question: &str) -> String {
        let timeout = self.policy.remote_timeout;
        let answer = match tokio::time::timeout(timeout, self.remote.generate(question)).await {
            Ok(answer) => answer,
            Err(_) => {
                let err = AppError::GeneratorTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                };
                warn!(error = %err, model = self.remote.model_name(), "Remote tier timed out");
                degraded_answer(err)
            }
        };

        if answer.trim().is_empty() {
            warn!(model = self.remote.model_name(), "Remote tier returned an empty answer");
            return degraded_answer("empty completion");
        }
        answer
    }

    fn finish(&self, result: AnswerResult, start: Instant) -> AnswerResult {
        let elapsed = start.elapsed();
        metrics::record_resolution(elapsed.as_secs_f64(), result.source().as_str());

        info!(
            source = %result.source(),
            confidence = ?result.confidence(),
            local_confidence = ?result.local_confidence(),
            latency_ms = elapsed.as_millis() as u64,
            "Question resolved"
        );
        result
    }

    /// The loaded FAQ store
    pub fn faq(&self) -> &FaqStore {
        &self.faq
    }

    pub fn local_model(&self) -> Option<&str> {
        self.local.as_ref().map(|l| l.model_name())
    }

    pub fn remote_model(&self) -> &str {
        self.remote.model_name()
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::FaqRecord;
    use crate::config::RemoteConfig;
    use crate::generation::{
        ChatCompletionsGenerator, MockLocalGenerator, MockRemoteGenerator, DEGRADED_ANSWER_PREFIX,
    };
    use std::io::Write;

    const REMOTE_ANSWER: &str = "Norton University is a private university in Phnom Penh.";
    const ECHO: &str = "What is Norton University? Norton University";

    fn tuition_store() -> Arc<FaqStore> {
        Arc::new(FaqStore::from_records(vec![FaqRecord::new(
            "what are the tuition fees",
            "See the finance office.",
        )]))
    }

    fn empty_store() -> Arc<FaqStore> {
        Arc::new(FaqStore::from_records(Vec::new()))
    }

    fn fast_policy() -> ResolverPolicy {
        ResolverPolicy {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            local_timeout: Duration::from_millis(50),
            remote_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_faq_hit_skips_generators() {
        let local = Arc::new(MockLocalGenerator::new(ECHO));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(tuition_store(), remote.clone()).with_local(local.clone());

        let result = resolver
            .resolve("Hi, what are the tuition fees this year?")
            .await
            .unwrap();

        assert_eq!(result.answer(), "See the finance office.");
        assert_eq!(result.source(), SourceTag::Faq);
        assert!(result.confidence().is_none());
        assert_eq!(local.calls(), 0);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_escalates_to_remote() {
        let local = Arc::new(MockLocalGenerator::new("I am a cat"));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(empty_store(), remote.clone()).with_local(local.clone());

        let result = resolver.resolve("What is Norton University?").await.unwrap();

        assert_eq!(result.answer(), REMOTE_ANSWER);
        assert_eq!(result.source(), SourceTag::RemoteApi);
        let local_score = result.local_confidence().unwrap();
        assert!(local_score < DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_confident_local_answer_is_kept() {
        let local = Arc::new(MockLocalGenerator::new(ECHO));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(empty_store(), remote.clone()).with_local(local.clone());

        let result = resolver.resolve("What is Norton University?").await.unwrap();

        assert_eq!(result.source(), SourceTag::LocalModel);
        assert_eq!(result.answer(), ECHO);
        assert!(result.confidence().unwrap() >= DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let question = "Where is the library?";
        let candidate = "The library is next to the main hall.";
        let score = ConfidenceScorer::default().score(question, candidate);

        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let policy = ResolverPolicy {
            confidence_threshold: score,
            ..ResolverPolicy::default()
        };
        let resolver = Resolver::new(empty_store(), remote.clone())
            .with_local(Arc::new(MockLocalGenerator::new(candidate)))
            .with_policy(policy);

        let result = resolver.resolve(question).await.unwrap();
        assert_eq!(result.source(), SourceTag::LocalModel);
        assert_eq!(result.confidence(), Some(score));
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let local = Arc::new(MockLocalGenerator::new(ECHO));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(tuition_store(), remote.clone()).with_local(local.clone());

        for question in ["", "   ", "\n\t"] {
            let err = resolver.resolve(question).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput { .. }));
        }
        assert_eq!(local.calls(), 0);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_local_tier_goes_remote() {
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(empty_store(), remote.clone());

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert!(result.local_confidence().is_none());
        assert_eq!(result.source_label(), "Remote API");
        assert!(resolver.local_model().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_local_is_skipped() {
        let local = Arc::new(MockLocalGenerator::unavailable());
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(empty_store(), remote.clone()).with_local(local.clone());

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert!(result.local_confidence().is_none());
        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_local_times_out() {
        let local = Arc::new(MockLocalGenerator::new(ECHO).with_delay(Duration::from_secs(5)));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Resolver::new(empty_store(), remote.clone())
            .with_local(local)
            .with_policy(fast_policy());

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert_eq!(result.answer(), REMOTE_ANSWER);
    }

    #[tokio::test]
    async fn test_remote_failure_still_answers() {
        let remote = Arc::new(MockRemoteGenerator::failing());
        let resolver = Resolver::new(empty_store(), remote);

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert!(!result.answer().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_remote_endpoint_still_answers() {
        // Reserve a port, then release it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = RemoteConfig {
            endpoint: format!("http://{}/openai/v1/chat/completions", addr),
            timeout_secs: 2,
            ..RemoteConfig::default()
        };
        let remote = Arc::new(ChatCompletionsGenerator::new(&config, "gsk_test").unwrap());
        let resolver = Resolver::new(empty_store(), remote);

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert!(!result.answer().trim().is_empty());
        assert!(result.answer().starts_with(DEGRADED_ANSWER_PREFIX));
        assert_eq!(result.local_confidence(), None);
    }

    #[tokio::test]
    async fn test_slow_remote_degrades() {
        let remote = Arc::new(
            MockRemoteGenerator::new(REMOTE_ANSWER).with_delay(Duration::from_secs(5)),
        );
        let resolver = Resolver::new(empty_store(), remote).with_policy(fast_policy());

        let result = resolver.resolve("What is Norton University?").await.unwrap();
        assert_eq!(result.source(), SourceTag::RemoteApi);
        assert!(result.answer().starts_with(DEGRADED_ANSWER_PREFIX));
    }

    #[tokio::test]
    async fn test_empty_remote_answer_degrades() {
        let resolver = Resolver::new(empty_store(), Arc::new(MockRemoteGenerator::new("  ")));

        let result = resolver.resolve("anything").await.unwrap();
        assert!(result.answer().starts_with(DEGRADED_ANSWER_PREFIX));
    }

    #[tokio::test]
    async fn test_concurrent_resolutions() {
        let local = Arc::new(MockLocalGenerator::new("I am a cat"));
        let remote = Arc::new(MockRemoteGenerator::new(REMOTE_ANSWER));
        let resolver = Arc::new(
            Resolver::new(tuition_store(), remote.clone()).with_local(local.clone()),
        );

        let tasks = (0..32).map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let question = if i % 2 == 0 {
                    "what are the tuition fees?".to_string()
                } else {
                    format!("Tell me something about building {}", i)
                };
                resolver.resolve(&question).await.unwrap()
            })
        });

        let results = futures::future::join_all(tasks).await;
        for (i, result) in results.into_iter().enumerate() {
            let result = result.unwrap();
            let expected = if i % 2 == 0 { SourceTag::Faq } else { SourceTag::RemoteApi };
            assert_eq!(result.source(), expected);
        }
        assert_eq!(local.calls(), 16);
        assert_eq!(remote.calls(), 16);
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = Resolver::from_config(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_from_config_requires_faq_source() {
        let mut config = AppConfig::default();
        config.remote.api_key = Some("gsk_test".to_string());
        config.faq.path = "missing/faqs.csv".into();

        let err = Resolver::from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::LoadError { .. }));
    }

    #[test]
    fn test_from_config_wires_tiers() {
        let mut faqs = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            faqs,
            "question,answer\nwhat are the tuition fees,See the finance office."
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.remote.api_key = Some("gsk_test".to_string());
        config.faq.path = faqs.path().to_path_buf();
        config.resolver.confidence_threshold = 0.8;
        config.local_model.model_path = Some("/nonexistent/model".into());

        let resolver = Resolver::from_config(&config).unwrap();
        assert_eq!(resolver.faq().len(), 1);
        assert!(resolver.local_model().is_none());
        assert_eq!(resolver.remote_model(), "compound-beta-mini");
        assert_eq!(resolver.policy().confidence_threshold, 0.8);
    }
}
