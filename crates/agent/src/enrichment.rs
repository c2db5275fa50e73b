use std::panic::{self, AssertUnwindSafe};

use intake_core::config::AppConfig;
use intake_core::intent::{
    ClassificationResult, Classify, IntentClassifier, IntentRules, IntentSummary, RulesError,
};
use tracing::{debug, info, warn};

pub const CLASSIFIER_ERROR_PREFIX: &str = "classifier_error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Degradation {
    pub kind: &'static str,
    pub detail: String,
}

/// Caller-side wrapper around a classifier.
///
/// Classification is an enrichment signal, so nothing here fails: a table
/// that cannot be loaded or compiled, or a classifier that panics, yields the
/// fallback intent with score 0 and a single `classifier_error:<kind>` reason.
#[derive(Debug)]
pub struct IntentEnricher<C = IntentClassifier> {
    classifier: Result<C, Degradation>,
    fallback: IntentSummary,
}

impl IntentEnricher<IntentClassifier> {
    pub fn new(rules: IntentRules) -> Self {
        Self::from_build(IntentClassifier::new(rules))
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::from_build(config.intent_rules().and_then(IntentClassifier::new))
    }

    fn from_build(build: Result<IntentClassifier, RulesError>) -> Self {
        match build {
            Ok(classifier) => Self::with_classifier(classifier),
            Err(error) => Self::unavailable(&error),
        }
    }
}

impl<C> IntentEnricher<C>
where
    C: Classify,
{
    pub fn with_classifier(classifier: C) -> Self {
        let fallback = classifier.fallback_intent().clone();
        info!(
            event_name = "intake.enrichment.ready",
            fallback_intent = %fallback.id,
            "intent classifier initialized"
        );
        Self { classifier: Ok(classifier), fallback }
    }

    pub fn unavailable(error: &RulesError) -> Self {
        warn!(
            event_name = "intake.enrichment.classifier_unavailable",
            error_kind = error.kind(),
            error = %error,
            "intent classifier could not be built; results will use the fallback intent"
        );
        Self {
            classifier: Err(Degradation { kind: error.kind(), detail: error.to_string() }),
            fallback: built_in_fallback(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.classifier.is_err()
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        self.classifier.as_ref().err()
    }

    pub fn enrich(&self, message: &str) -> ClassificationResult {
        let classifier = match &self.classifier {
            Ok(classifier) => classifier,
            Err(degradation) => return self.contained(degradation.kind),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(message))) {
            Ok(result) => {
                debug!(
                    event_name = "intake.enrichment.classified",
                    intent_id = %result.intent.id,
                    score = result.score,
                    reason_count = result.reasons.len(),
                    "message classified"
                );
                result
            }
            Err(_) => {
                warn!(
                    event_name = "intake.enrichment.classifier_panicked",
                    message_len = message.len(),
                    "intent classifier panicked; substituting fallback result"
                );
                self.contained("panic")
            }
        }
    }

    fn contained(&self, kind: &str) -> ClassificationResult {
        let reason = format!("{CLASSIFIER_ERROR_PREFIX}:{kind}");
        ClassificationResult::fallback(self.fallback.clone(), reason)
    }
}

fn built_in_fallback() -> IntentSummary {
    IntentRules::default()
        .fallback()
        .map(IntentSummary::from)
        .unwrap_or_else(|| IntentSummary { id: "other".to_string(), label: "Other".to_string() })
}
