pub mod commands;

use clap::{Parser, Subcommand};
use intake_core::config::{AppConfig, LoadOptions};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "intake",
    about = "Intake intent classifier CLI",
    long_about = "Classify inbound messages, inspect the rule table and configuration, and run readiness checks.",
    after_help = "Examples:\n  intake classify \"necesito automatizar leads desde airtable a slack\"\n  echo \"hola\" | intake classify --json\n  intake rules > intake-rules.toml\n  intake doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify a message (argument or stdin) and print intent, score, and reasons")]
    Classify {
        #[arg(help = "Message text; read from stdin when omitted")]
        message: Option<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the effective rule table (TOML by default)")]
    Rules {
        #[arg(long, help = "Emit JSON instead of TOML")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, rule table loading, and a classifier probe")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&AppConfig::load(LoadOptions::default()).unwrap_or_default());

    let result = match cli.command {
        Command::Classify { message, json } => match commands::classify::read_message(message) {
            Ok(message) => commands::classify::run(&message, json),
            Err(error) => {
                commands::CommandResult::failure("classify", "input", format!("{error:#}"), 1)
            }
        },
        Command::Rules { json } => commands::rules::run(json),
        Command::Config => commands::CommandResult::rendered(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::rendered(commands::doctor::run(json)),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(config: &AppConfig) {
    use intake_core::config::LogFormat::*;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // stdout carries command output only
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
