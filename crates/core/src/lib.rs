pub mod config;
pub mod intent;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use intent::{
    ClassificationResult, Classify, IntentClassifier, IntentDefinition, IntentRules, IntentSummary,
    RulesError, ScopePattern, ScoringWeights,
};
