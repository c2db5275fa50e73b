use std::io::{self, IsTerminal, Read};

use anyhow::{bail, Context};
use intake_agent::IntentEnricher;
use intake_core::config::{AppConfig, LoadOptions};
use intake_core::intent::ClassificationResult;
use tracing::info;

use super::CommandResult;

/// Uses the argument when given, otherwise drains stdin.
pub fn read_message(message: Option<String>) -> anyhow::Result<String> {
    if let Some(message) = message {
        return Ok(message);
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("no message given; pass it as an argument or pipe it on stdin");
    }

    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer).context("failed to read message from stdin")?;
    Ok(buffer)
}

pub fn run(message: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "classify",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let enricher = IntentEnricher::from_config(&config);
    let result = enricher.enrich(message);
    info!(
        event_name = "intake.cli.classify",
        intent_id = %result.intent.id,
        score = result.score,
        degraded = enricher.is_degraded(),
        "classification complete"
    );

    let output = if json_output { render_json(&result) } else { render_human(&result) };
    CommandResult::rendered(output)
}

fn render_json(result: &ClassificationResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"classify\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn render_human(result: &ClassificationResult) -> String {
    let mut lines = vec![
        format!("intent: {} ({})", result.intent.id, result.intent.label),
        format!("score: {}", result.score),
    ];

    if result.reasons.is_empty() {
        lines.push("reasons: <none>".to_string());
    } else {
        lines.push("reasons:".to_string());
        lines.extend(result.reasons.iter().map(|reason| format!("- {reason}")));
    }

    lines.join("\n")
}
