//! Deterministic intent classification and lead scoring.

pub mod classifier;
pub mod rules;

pub use classifier::{ClassificationResult, Classify, IntentClassifier, IntentSummary};
pub use rules::{IntentDefinition, IntentRules, RulesError, ScopePattern, ScoringWeights};
