//! SpotIM adapter CLI.
//!
//! This tool provides commands for:
//! - Validating adapter settings
//! - Replaying `build_requests` against an auction fixture
//! - Interpreting recorded vendor responses
//! - Listing user syncs and win notifications for those responses

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spotim_adapter::auction::UserSyncOptions;
use spotim_cli::commands;
use spotim_cli::error::CliError;
use spotim_cli::logging::{init_logger, LogLevel};

#[derive(Parser)]
#[command(name = "spotimcli")]
#[command(about = "Replay SpotIM adapter calls against JSON fixtures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML settings file
    #[arg(long, short, global = true, env = "SPOTIM_ADAPTER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log level for diagnostics written to stderr
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate settings and list registered adapters
    Validate,

    /// Build the outbound request for an auction fixture
    BuildRequest {
        /// JSON file with `bids`, `bidderRequest` and `environment`
        #[arg(long, short)]
        fixture: PathBuf,
    },

    /// Interpret recorded vendor responses into normalized bids
    Interpret {
        /// JSON file with one response or a list of responses
        #[arg(long, short)]
        responses: PathBuf,
    },

    /// List user syncs for recorded vendor responses
    Syncs {
        /// JSON file with one response or a list of responses
        #[arg(long, short)]
        responses: PathBuf,

        /// Host allows iframe syncs
        #[arg(long)]
        iframe: bool,

        /// Host allows image pixel syncs
        #[arg(long)]
        pixel: bool,
    },

    /// List win notifications fired if every bid won
    Win {
        /// JSON file with one response or a list of responses
        #[arg(long, short)]
        responses: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Validate => {
            let file = settings.ok_or_else(|| {
                CliError::Config("--settings is required for validate".to_string())
            })?;
            commands::validate(file)
        }
        Commands::BuildRequest { fixture } => commands::build_request(settings, &fixture),
        Commands::Interpret { responses } => commands::interpret(settings, &responses),
        Commands::Syncs {
            responses,
            iframe,
            pixel,
        } => commands::user_syncs(
            settings,
            &responses,
            UserSyncOptions {
                iframe_enabled: iframe,
                pixel_enabled: pixel,
            },
        ),
        Commands::Win { responses } => commands::win(settings, &responses),
    }
}
