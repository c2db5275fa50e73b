use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::rules::{IntentDefinition, IntentRules, RulesError, ScoringWeights};

pub const INTENT_BOOST_PER_HIT: i32 = 2;
pub const INTENT_BOOST_CAP: i32 = 10;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSummary {
    pub id: String,
    pub label: String,
}

impl From<&IntentDefinition> for IntentSummary {
    fn from(definition: &IntentDefinition) -> Self {
        Self { id: definition.id.clone(), label: definition.label.clone() }
    }
}

/// Outcome of a single classification. Reasons follow evaluation order:
/// vague, budget, urgency, stack, scope, intent boost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: IntentSummary,
    pub score: u8,
    pub reasons: Vec<String>,
}

impl ClassificationResult {
    /// Zero-score result for `intent` carrying a single diagnostic reason.
    pub fn fallback(intent: IntentSummary, reason: impl Into<String>) -> Self {
        Self { intent, score: 0, reasons: vec![reason.into()] }
    }
}

pub trait Classify: Send + Sync {
    fn classify(&self, message: &str) -> ClassificationResult;

    /// Intent reported when nothing matches.
    fn fallback_intent(&self) -> &IntentSummary;
}

#[derive(Clone, Debug)]
struct CompiledScope {
    name: String,
    regex: Regex,
}

/// Deterministic keyword/regex classifier over an immutable [`IntentRules`] table.
///
/// Construction validates the table and compiles its patterns; after that,
/// [`classify`](Self::classify) is total and shares nothing mutable, so one
/// instance can serve any number of concurrent callers.
#[derive(Clone, Debug)]
pub struct IntentClassifier {
    intents: Vec<IntentDefinition>,
    fallback: IntentSummary,
    weights: ScoringWeights,
    urgency_keywords: Vec<String>,
    vague_keywords: Vec<String>,
    stack_keywords: Vec<String>,
    budget: Regex,
    scopes: Vec<CompiledScope>,
}

struct IntentMatch<'a> {
    definition: Option<&'a IntentDefinition>,
    hits: Vec<&'a str>,
}

impl IntentClassifier {
    pub fn new(rules: IntentRules) -> Result<Self, RulesError> {
        let rules = rules.normalized();
        rules.validate()?;

        let fallback = rules.fallback().map(IntentSummary::from).ok_or_else(|| {
            RulesError::Validation("rules table has no fallback intent".to_string())
        })?;
        let budget = compile("budget", &rules.budget_pattern)?;
        let scopes = rules
            .scope_patterns
            .iter()
            .map(|scope| {
                compile(&scope.name, &scope.pattern)
                    .map(|regex| CompiledScope { name: scope.name.clone(), regex })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            intents: rules.intents,
            fallback,
            weights: rules.weights,
            urgency_keywords: rules.urgency_keywords,
            vague_keywords: rules.vague_keywords,
            stack_keywords: rules.stack_keywords,
            budget,
            scopes,
        })
    }

    pub fn classify(&self, message: &str) -> ClassificationResult {
        let text = message.trim().to_lowercase();
        let best = self.select_intent(&text);

        let mut score = 0_i32;
        let mut reasons = Vec::new();

        // Runs first but never short-circuits: a vague opener can still carry detail.
        let vague_hits = keyword_hits(&text, &self.vague_keywords);
        if !vague_hits.is_empty() {
            score = score.saturating_add(self.weights.is_vague_penalty);
            reasons.push(format!("vague_penalty({})", vague_hits.join(", ")));
        }

        if self.budget.is_match(&text) {
            score = score.saturating_add(self.weights.has_budget);
            reasons.push("has_budget".to_string());
        }

        let urgency_hits = keyword_hits(&text, &self.urgency_keywords);
        if !urgency_hits.is_empty() {
            score = score.saturating_add(self.weights.has_urgency);
            reasons.push(format!("has_urgency({})", urgency_hits.join(", ")));
        }

        let stack_hits =
            keyword_hits(&text, &self.stack_keywords).into_iter().collect::<BTreeSet<_>>();
        if !stack_hits.is_empty() {
            score = score.saturating_add(self.weights.has_stack);
            let tools = stack_hits.into_iter().collect::<Vec<_>>();
            reasons.push(format!("has_stack({})", tools.join(", ")));
        }

        if let Some(scope) = self.scopes.iter().find(|scope| scope.regex.is_match(&text)) {
            score = score.saturating_add(self.weights.has_scope);
            reasons.push(format!("has_scope({})", scope.name));
        }

        if best.definition.is_some() && !best.hits.is_empty() {
            score = score.saturating_add(intent_boost(best.hits.len()));
            reasons.push(format!("intent_signal({})", best.hits.join(", ")));
        }

        let intent =
            best.definition.map(IntentSummary::from).unwrap_or_else(|| self.fallback.clone());
        let score = score.clamp(MIN_SCORE, MAX_SCORE) as u8;

        ClassificationResult { intent, score, reasons }
    }

    /// Single pass, replacing the running best only on a strictly greater hit
    /// count so that earlier declarations win ties.
    fn select_intent<'a>(&'a self, text: &str) -> IntentMatch<'a> {
        let mut best = IntentMatch { definition: None, hits: Vec::new() };

        for intent in &self.intents {
            let hits = keyword_hits(text, &intent.keywords);
            if hits.len() > best.hits.len() {
                best = IntentMatch { definition: Some(intent), hits };
            }
        }

        best
    }
}

impl Classify for IntentClassifier {
    fn classify(&self, message: &str) -> ClassificationResult {
        IntentClassifier::classify(self, message)
    }

    fn fallback_intent(&self) -> &IntentSummary {
        &self.fallback
    }
}

fn intent_boost(hit_count: usize) -> i32 {
    let hits = i32::try_from(hit_count).unwrap_or(i32::MAX);
    hits.saturating_mul(INTENT_BOOST_PER_HIT).min(INTENT_BOOST_CAP)
}

fn keyword_hits<'a>(text: &str, keywords: &'a [String]) -> Vec<&'a str> {
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
        .map(String::as_str)
        .collect()
}

fn compile(name: &str, pattern: &str) -> Result<Regex, RulesError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RulesError::InvalidPattern { name: name.to_string(), source })
}
