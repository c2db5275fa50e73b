use intake_core::intent::ClassificationResult;
use serde_json::{json, Value};

pub const HEADER_INTENT_ID: &str = "x-intent-id";
pub const HEADER_INTENT_LABEL: &str = "x-intent-label";
pub const HEADER_INTENT_SCORE: &str = "x-intent-score";
pub const HEADER_INTENT_REASONS: &str = "x-intent-reasons";

/// Read-only view of a classification handed to the downstream agent call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentContext {
    classification: ClassificationResult,
}

impl AgentContext {
    pub fn from_result(result: &ClassificationResult) -> Self {
        Self { classification: result.clone() }
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classification
    }

    pub fn to_metadata(&self) -> Value {
        json!({
            "intent_signal": {
                "intent": {
                    "id": self.classification.intent.id,
                    "label": self.classification.intent.label,
                },
                "score": self.classification.score,
                "reasons": self.classification.reasons,
            }
        })
    }

    /// Name/value pairs for a transport to attach as response headers.
    /// Values are percent-encoded outside printable ASCII.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_INTENT_ID, header_value(&self.classification.intent.id)),
            (HEADER_INTENT_LABEL, header_value(&self.classification.intent.label)),
            (HEADER_INTENT_SCORE, self.classification.score.to_string()),
            (HEADER_INTENT_REASONS, header_value(&self.classification.reasons.join("; "))),
        ]
    }
}

fn header_value(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte == b'%' || !(b' '..=b'~').contains(&byte) {
            encoded.push_str(&format!("%{byte:02X}"));
        } else {
            encoded.push(char::from(byte));
        }
    }
    encoded
}
