use chrono::Utc;
use intake_core::config::{AppConfig, LoadOptions};
use intake_core::intent::{Classify, IntentClassifier, IntentRules};
use serde::Serialize;

const PROBE_MESSAGE: &str = "hola";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checked_at: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match config.intent_rules() {
                Ok(rules) => {
                    checks.push(DoctorCheck {
                        name: "rules_load",
                        status: CheckStatus::Pass,
                        details: rules_source(&config, &rules),
                    });
                    checks.push(check_classifier_probe(rules));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "rules_load",
                        status: CheckStatus::Fail,
                        details: format!("{}: {error}", error.kind()),
                    });
                    checks.push(skipped("classifier_probe", "rule table did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("rules_load", "configuration did not load"));
            checks.push(skipped("classifier_probe", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checked_at: Utc::now().to_rfc3339(), checks }
}

fn rules_source(config: &AppConfig, rules: &IntentRules) -> String {
    let origin = config
        .rules
        .path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "built-in table".to_string());
    format!(
        "{} intents and {} scope patterns from {origin}",
        rules.intents.len(),
        rules.scope_patterns.len()
    )
}

fn check_classifier_probe(rules: IntentRules) -> DoctorCheck {
    let classifier = match IntentClassifier::new(rules) {
        Ok(classifier) => classifier,
        Err(error) => {
            return DoctorCheck {
                name: "classifier_probe",
                status: CheckStatus::Fail,
                details: format!("{}: {error}", error.kind()),
            };
        }
    };

    let fallback_id = classifier.fallback_intent().id.clone();
    let result = classifier.classify(PROBE_MESSAGE);
    let details = format!(
        "`{PROBE_MESSAGE}` classified as `{}` with score {} (expected `{fallback_id}` with score 0)",
        result.intent.id, result.score
    );
    let status = if result.intent.id == fallback_id && result.score == 0 {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };

    DoctorCheck { name: "classifier_probe", status, details }
}

fn skipped(name: &'static str, cause: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {cause}"),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} (checked at {})", report.summary, report.checked_at));

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
