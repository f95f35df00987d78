/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scriptable translator and a fixed language detector:
 * - `MockTranslator::working()` - Always succeeds with tagged text
 * - `MockTranslator::failing()` - Always fails with an error
 * - `MockTranslator::desync_on_batch()` - Loses segments of combined requests
 * - `MockTranslator::fail_on_batch()` - Fails combined requests only
 *
 * Every call is recorded so tests can assert on call counts and concurrency.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{DetectionError, ProviderError};
use crate::language_utils::LanguageDetector;
use crate::providers::Translator;
use crate::translation::orchestrator::GROUP_SEPARATOR;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Combined requests come back with their segments merged into one
    DesyncOnBatch,
    /// Combined requests fail, single requests succeed
    FailOnBatch,
}

/// A call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub source_language: String,
    pub target_language: String,
    pub text: String,
}

impl MockCall {
    /// Whether this was a combined group request
    pub fn is_batch(&self) -> bool {
        self.text.contains(GROUP_SEPARATOR)
    }
}

/// Mock translator for testing orchestration behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Simulated latency per call
    delay: Option<Duration>,
    /// Calls received, in arrival order
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Calls currently in progress
    in_flight: Arc<AtomicUsize>,
    /// Highest number of calls seen in progress at once
    max_in_flight: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock whose combined responses have the wrong segment count
    pub fn desync_on_batch() -> Self {
        Self::new(MockBehavior::DesyncOnBatch)
    }

    /// Create a mock that rejects combined requests
    pub fn fail_on_batch() -> Self {
        Self::new(MockBehavior::FailOnBatch)
    }

    /// Add a simulated latency to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The translation the working mock produces for a text.
    ///
    /// Every non-empty line is prefixed with `[target] `; separator lines are
    /// passed through, so combined and single requests agree per cue.
    pub fn expected_translation(target_language: &str, text: &str) -> String {
        text.split('\n')
            .map(|line| {
                if line.trim().is_empty() || line.contains(GROUP_SEPARATOR) {
                    line.to_string()
                } else {
                    format!("[{}] {}", target_language, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Total number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of combined group requests received
    pub fn batch_call_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_batch()).count()
    }

    /// Number of single-text requests received
    pub fn single_call_count(&self) -> usize {
        self.call_count() - self.batch_call_count()
    }

    /// Highest number of calls that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, call: &MockCall) -> Result<String, ProviderError> {
        match self.behavior {
            MockBehavior::Working => Ok(Self::expected_translation(&call.target_language, &call.text)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::DesyncOnBatch => {
                let translated = Self::expected_translation(&call.target_language, &call.text);
                if call.is_batch() {
                    Ok(translated.replace(GROUP_SEPARATOR, ""))
                } else {
                    Ok(translated)
                }
            }

            MockBehavior::FailOnBatch => {
                if call.is_batch() {
                    Err(ProviderError::ApiError {
                        message: "Simulated batch rejection".to_string(),
                        status_code: 413,
                    })
                } else {
                    Ok(Self::expected_translation(&call.target_language, &call.text))
                }
            }
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String, ProviderError> {
        let call = MockCall {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            text: text.to_string(),
        };
        self.calls.lock().push(call.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.respond(&call);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Language detector with scripted answers
#[derive(Debug, Clone, Default)]
pub struct FixedDetector {
    /// Answer for every text not listed in `by_text`
    default: Option<String>,
    /// Per-text answers (matched on trimmed text)
    by_text: HashMap<String, String>,
}

impl FixedDetector {
    /// Detect every text as the same language
    pub fn always(code: &str) -> Self {
        Self {
            default: Some(code.to_string()),
            by_text: HashMap::new(),
        }
    }

    /// Detector that fails unless a text is scripted
    pub fn scripted() -> Self {
        Self::default()
    }

    /// Script the answer for one text
    pub fn with_text(mut self, text: &str, code: &str) -> Self {
        self.by_text.insert(text.trim().to_string(), code.to_string());
        self
    }
}

impl LanguageDetector for FixedDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        self.by_text
            .get(text.trim())
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| DetectionError::Ambiguous("unscripted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workingTranslator_shouldTagEveryLine() {
        let translator = MockTranslator::working();
        let result = translator.translate("en", "fr", "Hello\nworld").await.unwrap();
        assert_eq!(result, "[fr] Hello\n[fr] world");
        assert_eq!(translator.call_count(), 1);
        assert_eq!(translator.batch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_workingTranslator_withBatch_shouldKeepSeparators() {
        let translator = MockTranslator::working();
        let text = format!("one\n{}\ntwo", GROUP_SEPARATOR);
        let result = translator.translate("en", "fr", &text).await.unwrap();
        assert_eq!(result.split(GROUP_SEPARATOR).count(), 2);
        assert_eq!(translator.batch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_failingTranslator_shouldReturnError() {
        let translator = MockTranslator::failing();
        assert!(translator.translate("en", "fr", "Hello").await.is_err());
        assert_eq!(translator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_desyncTranslator_shouldDropSeparatorsOnBatchOnly() {
        let translator = MockTranslator::desync_on_batch();
        let text = format!("one\n{}\ntwo", GROUP_SEPARATOR);
        let batch = translator.translate("en", "fr", &text).await.unwrap();
        assert!(!batch.contains(GROUP_SEPARATOR));
        assert_eq!(translator.translate("en", "fr", "one").await.unwrap(), "[fr] one");
    }

    #[tokio::test]
    async fn test_failOnBatchTranslator_shouldRejectBatchOnly() {
        let translator = MockTranslator::fail_on_batch();
        let text = format!("one\n{}\ntwo", GROUP_SEPARATOR);
        assert!(translator.translate("en", "fr", &text).await.is_err());
        assert!(translator.translate("en", "fr", "one").await.is_ok());
    }

    #[test]
    fn test_fixedDetector_shouldPreferScriptedText() {
        let detector = FixedDetector::always("en").with_text("Bonjour à tous", "fr");
        assert_eq!(detector.detect("Bonjour à tous").unwrap(), "fr");
        assert_eq!(detector.detect("Anything else").unwrap(), "en");
        assert!(FixedDetector::scripted().detect("x").is_err());
    }
}
