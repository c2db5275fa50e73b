use intake_core::config::{AppConfig, LoadOptions};
use intake_core::intent::IntentClassifier;

use super::CommandResult;

/// Prints the rule table the classifier would run with, after normalization.
/// The TOML form can be saved and pointed to with `rules.path`.
pub fn run(json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "rules",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let rules = match config.intent_rules() {
        Ok(rules) => rules.normalized(),
        Err(error) => {
            return CommandResult::failure("rules", error.kind(), error.to_string(), 3);
        }
    };

    if let Err(error) = IntentClassifier::new(rules.clone()) {
        return CommandResult::failure("rules", error.kind(), error.to_string(), 3);
    }

    let rendered = if json_output {
        serde_json::to_string_pretty(&rules).map_err(|error| error.to_string())
    } else {
        toml::to_string_pretty(&rules).map_err(|error| error.to_string())
    };

    match rendered {
        Ok(output) => CommandResult::rendered(output),
        Err(error) => CommandResult::failure("rules", "serialization", error, 1),
    }
}
