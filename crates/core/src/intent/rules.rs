//! Static intent and scoring table.
//!
//! The table is loaded once (built-in or from a TOML file) and handed to
//! [`IntentClassifier::new`](super::IntentClassifier::new). Declaration order
//! of `intents` is the tie-break priority; declaration order of
//! `scope_patterns` is the evaluation order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl IntentDefinition {
    /// The fallback category carries no keywords and is only ever selected by default.
    pub fn is_fallback(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    pub has_budget: i32,
    pub has_urgency: i32,
    pub has_stack: i32,
    pub has_scope: i32,
    pub is_vague_penalty: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { has_budget: 25, has_urgency: 25, has_stack: 20, has_scope: 20, is_vague_penalty: -20 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePattern {
    pub name: String,
    pub pattern: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntentRules {
    pub urgency_keywords: Vec<String>,
    pub vague_keywords: Vec<String>,
    pub stack_keywords: Vec<String>,
    pub budget_pattern: String,
    pub weights: ScoringWeights,
    pub intents: Vec<IntentDefinition>,
    pub scope_patterns: Vec<ScopePattern>,
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("could not read rules file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse rules file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("rules validation failed: {0}")]
    Validation(String),
    #[error("invalid pattern `{name}`: {source}")]
    InvalidPattern { name: String, source: regex::Error },
}

impl RulesError {
    /// Stable short code, safe to embed in reason tags.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "rules_read",
            Self::ParseFile { .. } => "rules_parse",
            Self::Validation(_) => "rules_validation",
            Self::InvalidPattern { .. } => "rules_pattern",
        }
    }
}

pub const DEFAULT_BUDGET_PATTERN: &str =
    r"(?:\b(?:usd|us\$)|\$)\s*\d+|\b\d+\s*(?:usd|dolares|dólares)\b";

impl Default for IntentRules {
    fn default() -> Self {
        Self {
            urgency_keywords: words(&["urgente", "alta", "asap", "ya", "hoy", "mañana", "prioridad"]),
            vague_keywords: words(&["ping", "test", "hola", "prueba"]),
            stack_keywords: words(&[
                "airtable", "slack", "make", "zapier", "n8n", "hubspot", "pipedrive", "braze",
                "segment", "appsflyer", "ga4", "firebase", "supabase", "postgres", "bigquery",
                "s3", "lambda", "webhook", "api",
            ]),
            budget_pattern: DEFAULT_BUDGET_PATTERN.to_string(),
            weights: ScoringWeights::default(),
            intents: vec![
                definition(
                    "lead_automation",
                    "Automatización de leads (CRM/Airtable/Slack)",
                    &["lead", "leads", "airtable", "slack", "crm", "form", "hubspot", "pipedrive"],
                ),
                definition(
                    "customer_support_ai",
                    "Soporte al cliente con IA (tickets/FAQ/chatbot)",
                    &["soporte", "tickets", "zendesk", "intercom", "chatbot", "faq", "helpdesk"],
                ),
                definition(
                    "data_pipelines",
                    "Pipelines/ETL/Integraciones de datos",
                    &["etl", "pipeline", "bigquery", "warehouse", "sync", "db", "postgres", "supabase"],
                ),
                definition(
                    "growth_marketing_automation",
                    "Automatización Growth/Marketing (Ads/CRM/Segmentación)",
                    &[
                        "ads",
                        "meta",
                        "google ads",
                        "braze",
                        "email",
                        "segment",
                        "attribution",
                        "appsflyer",
                    ],
                ),
                definition("other", "Otro / No clasificado", &[]),
            ],
            scope_patterns: vec![
                scope("from_to", r"\b(desde|from)\b.+\b(a|to)\b"),
                scope("integrate", r"\b(integrar|integración|integration|sync)\b"),
                scope("automate", r"\b(automatizar|automation|workflow)\b"),
            ],
        }
    }
}

impl IntentRules {
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RulesError::ReadFile { path: path.to_path_buf(), source })?;
        Self::parse(&raw, path)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RulesError> {
        Self::parse(raw, Path::new("<inline>"))
    }

    fn parse(raw: &str, origin: &Path) -> Result<Self, RulesError> {
        let rules = toml::from_str::<IntentRules>(raw)
            .map_err(|source| RulesError::ParseFile { path: origin.to_path_buf(), source })?
            .normalized();
        rules.validate()?;
        Ok(rules)
    }

    /// Trims and lowercases every keyword. Matching is always done against
    /// lowercased text, so keywords must be lowercase too.
    pub fn normalized(mut self) -> Self {
        for intent in &mut self.intents {
            normalize_keywords(&mut intent.keywords);
        }
        normalize_keywords(&mut self.urgency_keywords);
        normalize_keywords(&mut self.vague_keywords);
        normalize_keywords(&mut self.stack_keywords);
        self
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.intents.is_empty() {
            return Err(RulesError::Validation("intents must not be empty".to_string()));
        }

        let mut seen_ids = HashSet::new();
        for intent in &self.intents {
            if intent.id.trim().is_empty() {
                return Err(RulesError::Validation("intent id must not be blank".to_string()));
            }
            if !seen_ids.insert(intent.id.as_str()) {
                return Err(RulesError::Validation(format!(
                    "intent id `{}` is declared more than once",
                    intent.id
                )));
            }
            ensure_no_blank_keywords(&format!("intents.{}.keywords", intent.id), &intent.keywords)?;
        }

        let fallback_count = self.intents.iter().filter(|intent| intent.is_fallback()).count();
        if fallback_count != 1 {
            return Err(RulesError::Validation(format!(
                "exactly one intent must have an empty keyword list (found {fallback_count})"
            )));
        }

        ensure_no_blank_keywords("urgency_keywords", &self.urgency_keywords)?;
        ensure_no_blank_keywords("vague_keywords", &self.vague_keywords)?;
        ensure_no_blank_keywords("stack_keywords", &self.stack_keywords)?;

        if self.budget_pattern.trim().is_empty() {
            return Err(RulesError::Validation("budget_pattern must not be blank".to_string()));
        }

        let mut seen_patterns = HashSet::new();
        for scope in &self.scope_patterns {
            if scope.name.trim().is_empty() {
                return Err(RulesError::Validation(
                    "scope pattern name must not be blank".to_string(),
                ));
            }
            if !seen_patterns.insert(scope.name.as_str()) {
                return Err(RulesError::Validation(format!(
                    "scope pattern `{}` is declared more than once",
                    scope.name
                )));
            }
        }

        Ok(())
    }

    /// The fallback definition. `None` only for tables that fail [`validate`](Self::validate).
    pub fn fallback(&self) -> Option<&IntentDefinition> {
        self.intents.iter().find(|intent| intent.is_fallback())
    }
}

fn ensure_no_blank_keywords(field: &str, keywords: &[String]) -> Result<(), RulesError> {
    if keywords.iter().any(|keyword| keyword.trim().is_empty()) {
        return Err(RulesError::Validation(format!("{field} must not contain blank entries")));
    }
    Ok(())
}

fn normalize_keywords(keywords: &mut [String]) {
    for keyword in keywords.iter_mut() {
        *keyword = keyword.trim().to_lowercase();
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn definition(id: &str, label: &str, keywords: &[&str]) -> IntentDefinition {
    IntentDefinition { id: id.to_string(), label: label.to_string(), keywords: words(keywords) }
}

fn scope(name: &str, pattern: &str) -> ScopePattern {
    ScopePattern { name: name.to_string(), pattern: pattern.to_string() }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{IntentRules, RulesError};

    #[test]
    fn built_in_table_is_valid_with_single_fallback() {
        let rules = IntentRules::default();
        assert!(rules.validate().is_ok());

        let fallback = rules.fallback().expect("built-in table has a fallback");
        assert_eq!(fallback.id, "other");
        assert_eq!(rules.intents.last().map(|intent| intent.id.as_str()), Some("other"));
    }

    #[test]
    fn missing_fallback_is_rejected() {
        let mut rules = IntentRules::default();
        rules.intents.retain(|intent| !intent.is_fallback());

        let error = rules.validate().expect_err("table without fallback must fail");
        assert!(error.to_string().contains("found 0"));
        assert_eq!(error.kind(), "rules_validation");
    }

    #[test]
    fn second_fallback_is_rejected() {
        let mut rules = IntentRules::default();
        let mut extra = rules.fallback().cloned().expect("fallback");
        extra.id = "misc".to_string();
        rules.intents.insert(0, extra);

        let error = rules.validate().expect_err("two fallbacks must fail");
        assert!(error.to_string().contains("found 2"));
    }

    #[test]
    fn duplicate_intent_ids_are_rejected() {
        let mut rules = IntentRules::default();
        let duplicate = rules.intents[0].clone();
        rules.intents.push(duplicate);

        let error = rules.validate().expect_err("duplicate ids must fail");
        assert!(error.to_string().contains("lead_automation"));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let mut rules = IntentRules::default();
        rules.urgency_keywords.push("  ".to_string());

        let error = rules.validate().expect_err("blank keyword must fail");
        assert!(error.to_string().contains("urgency_keywords"));
    }

    #[test]
    fn partial_file_keeps_built_in_sections_and_lowercases_keywords() {
        let rules = IntentRules::from_toml_str(
            r#"
vague_keywords = ["Hello", " PING "]

[weights]
has_budget = 40
"#,
        )
        .expect("partial rules should parse");

        assert_eq!(rules.vague_keywords, vec!["hello".to_string(), "ping".to_string()]);
        assert_eq!(rules.weights.has_budget, 40);
        assert_eq!(rules.weights.has_urgency, 25);
        assert_eq!(rules.intents, IntentRules::default().intents);
    }

    #[test]
    fn unknown_weight_name_fails_to_parse() {
        let error = IntentRules::from_toml_str(
            r#"
[weights]
has_vibes = 10
"#,
        )
        .expect_err("unknown weight must be rejected");

        assert!(matches!(error, RulesError::ParseFile { .. }));
        assert_eq!(error.kind(), "rules_parse");
    }

    #[test]
    fn load_reads_rules_file_from_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rules.toml");
        fs::write(
            &path,
            r#"
[[intents]]
id = "billing"
label = "Billing"
keywords = ["Invoice", "refund"]

[[intents]]
id = "other"
label = "Other"
keywords = []

[[scope_patterns]]
name = "migrate"
pattern = '\bmigrat'
"#,
        )
        .expect("write rules");

        let rules = IntentRules::load(&path).expect("rules file should load");
        assert_eq!(rules.intents.len(), 2);
        assert_eq!(rules.intents[0].keywords, vec!["invoice".to_string(), "refund".to_string()]);
        assert_eq!(rules.scope_patterns.len(), 1);
        assert_eq!(rules.fallback().map(|intent| intent.id.as_str()), Some("other"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let error = IntentRules::load(&dir.path().join("absent.toml")).expect_err("missing file");

        assert!(matches!(error, RulesError::ReadFile { .. }));
        assert_eq!(error.kind(), "rules_read");
    }
}
