use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use intake_cli::commands::{classify, config, doctor, rules};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn classify_scores_the_reference_message() {
    with_env(&[], || {
        let result = classify::run(
            "Hola, necesito automatizar el envío de leads desde Airtable a Slack, urgente, tengo presupuesto de 500 usd",
            true,
        );
        assert_eq!(result.exit_code, 0, "expected successful classification");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["intent"]["id"], "lead_automation");
        assert_eq!(payload["score"], 78);
        assert_eq!(payload["reasons"][0], "vague_penalty(hola)");
        assert_eq!(payload["reasons"][1], "has_budget");
    });
}

#[test]
fn classify_renders_human_output_by_default() {
    with_env(&[], || {
        let result = classify::run("hola", false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.starts_with("intent: other ("));
        assert!(result.output.contains("score: 0"));
        assert!(result.output.contains("- vague_penalty(hola)"));
    });
}

#[test]
fn classify_degrades_when_rules_file_is_missing() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let missing = missing.to_str().expect("utf-8 path");

    with_env(&[("INTAKE_RULES_PATH", missing)], || {
        let result = classify::run("urgente, 300 usd", true);
        assert_eq!(result.exit_code, 0, "degraded classification still succeeds");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["intent"]["id"], "other");
        assert_eq!(payload["score"], 0);
        assert_eq!(payload["reasons"], serde_json::json!(["classifier_error:rules_read"]));
    });
}

#[test]
fn classify_returns_config_failure_for_bad_log_level() {
    with_env(&[("INTAKE_LOG_LEVEL", "loud")], || {
        let result = classify::run("hola", true);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "classify");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn rules_prints_loadable_toml() {
    with_env(&[], || {
        let result = rules::run(false);
        assert_eq!(result.exit_code, 0, "expected rules dump");

        let parsed = intake_core::intent::IntentRules::from_toml_str(&result.output)
            .expect("dumped table should load back");
        assert_eq!(parsed, intake_core::intent::IntentRules::default().normalized());
    });
}

#[test]
fn rules_json_lists_intents_in_declaration_order() {
    with_env(&[], || {
        let result = rules::run(true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let ids: Vec<&str> = payload["intents"]
            .as_array()
            .expect("intents array")
            .iter()
            .filter_map(|intent| intent["id"].as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "lead_automation",
                "customer_support_ai",
                "data_pipelines",
                "growth_marketing_automation",
                "other",
            ]
        );
    });
}

#[test]
fn rules_reports_invalid_pattern() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("rules.toml");
    fs::write(
        &path,
        r#"
budget_pattern = "("

[[intents]]
id = "other"
label = "Other"
"#,
    )
    .expect("write rules");
    let path = path.to_str().expect("utf-8 path");

    with_env(&[("INTAKE_RULES_PATH", path)], || {
        let result = rules::run(true);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "rules");
        assert_eq!(payload["error_class"], "rules_pattern");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("INTAKE_LOG_LEVEL", "debug")], || {
        let output = config::run();

        assert!(output.contains("- rules.path = <built-in> (source: default)"));
        assert!(output.contains("- logging.level = debug (source: env (INTAKE_LOG_LEVEL))"));
    });
}

#[test]
fn doctor_passes_with_defaults() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "pass");
        assert!(payload["checked_at"].as_str().is_some_and(|value| !value.is_empty()));

        let names: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(names, vec!["config_validation", "rules_load", "classifier_probe"]);
    });
}

#[test]
fn doctor_skips_downstream_checks_when_config_invalid() {
    with_env(&[("INTAKE_LOG_FORMAT", "xml")], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_fails_rules_load_for_missing_file() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let missing = missing.to_str().expect("utf-8 path");

    with_env(&[("INTAKE_RULES_PATH", missing)], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] rules_load: rules_read"));
        assert!(output.contains("- [skip] classifier_probe"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "INTAKE_RULES_PATH",
        "INTAKE_LOGGING_LEVEL",
        "INTAKE_LOGGING_FORMAT",
        "INTAKE_LOG_LEVEL",
        "INTAKE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
