pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tripmate_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tripmate_core::flows::DialogueMode;

#[derive(Debug, Parser)]
#[command(
    name = "tripmate",
    about = "Tripmate booking assistant CLI",
    long_about = "Chat with the booking assistant, inspect parameter inference, list bookings, and check service readiness.",
    after_help = "Examples:\n  tripmate chat --mode agent\n  tripmate parse \"Đà Lạt 2 đêm dưới 1 triệu\"\n  tripmate doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a tripmate.toml file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive booking conversation on stdin/stdout")]
    Chat {
        #[arg(long, help = "Dialogue mode: quiz or agent")]
        mode: Option<DialogueMode>,
        #[arg(long, help = "Booking API base URL")]
        booking_url: Option<String>,
        #[arg(long, help = "Agent service base URL")]
        agent_url: Option<String>,
        #[arg(long, help = "User id used for bookings")]
        user_id: Option<i64>,
    },
    #[command(about = "Infer booking parameters from free text without calling any service")]
    Parse {
        #[arg(help = "Text to analyse")]
        text: String,
    },
    #[command(about = "List bookings of the configured user")]
    Bookings {
        #[arg(long, help = "User id (defaults to assistant.user_id)")]
        user_id: Option<i64>,
    },
    #[command(about = "Fetch agent service statistics")]
    Stats,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and probe the agent service")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config;

    let result = match cli.command {
        Command::Chat { mode, booking_url, agent_url, user_id } => {
            let overrides = ConfigOverrides {
                booking_api_url: booking_url,
                agent_url,
                mode,
                user_id,
                ..ConfigOverrides::default()
            };
            let options = LoadOptions { config_path, overrides, ..LoadOptions::default() };
            init_logging(&options);
            commands::chat::run(options)
        }
        Command::Parse { text } => commands::parse::run(&text),
        Command::Bookings { user_id } => {
            let overrides = ConfigOverrides { user_id, ..ConfigOverrides::default() };
            let options = LoadOptions { config_path, overrides, ..LoadOptions::default() };
            init_logging(&options);
            commands::bookings::run(options)
        }
        Command::Stats => {
            let options = LoadOptions { config_path, ..LoadOptions::default() };
            init_logging(&options);
            commands::stats::run(options)
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(LoadOptions { config_path, ..LoadOptions::default() }),
        },
        Command::Doctor { json } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(
                LoadOptions { config_path, ..LoadOptions::default() },
                json,
            ),
        },
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine readable.
fn init_logging(options: &LoadOptions) {
    use tracing::Level;

    let config = AppConfig::load(options.clone()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
    }
}
