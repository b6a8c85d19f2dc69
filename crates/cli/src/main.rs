// stocklink CLI - reference linkage across stock and procurement records

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "stocklink")]
#[command(about = "Link stock and procurement records across documents by normalized reference")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured link, pairing and inheritance from a TOML config
    #[command(after_help = "\
Examples:
  stocklink run audit.toml
  stocklink run audit.toml --json
  stocklink run audit.toml --output-dir reports/
  stocklink run audit.toml --strict")]
    Run {
        /// Path to the config file
        config: PathBuf,

        /// Output the full result as JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Write report tables to this directory (overrides `[output] dir`)
        #[arg(long, env = "STOCKLINK_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Exit 62 when any unmatched reference remains
        #[arg(long)]
        strict: bool,
    },

    /// Validate a config without loading any source file
    #[command(after_help = "\
Examples:
  stocklink validate audit.toml")]
    Validate {
        /// Path to the config file
        config: PathBuf,
    },

    /// Print the normalized key of each value
    #[command(after_help = "\
Examples:
  stocklink normalize 0001015775 INVI005662 ' pv12 '
  stocklink normalize 0000 --zero-as-missing")]
    Normalize {
        /// Raw reference values
        #[arg(required = true)]
        values: Vec<String>,

        /// Treat all-zero references as missing
        #[arg(long)]
        zero_as_missing: bool,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("STOCKLINK_GIT_HASH"), ")",
        "\nengine:  stocklink-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("STOCKLINK_TARGET"),
    )
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Run { config, json, output_dir, strict } => {
            recon::cmd_run(config, json, output_dir, strict)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Normalize { values, zero_as_missing, json } => {
            recon::cmd_normalize(values, zero_as_missing, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
