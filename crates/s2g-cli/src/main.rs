//! s2g CLI - S3 to Glue table deployment tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use s2g_core::config::LogFormat;
use s2g_core::Config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit codes for CLI operations.
///
/// Following Unix conventions:
/// - 0: Success
/// - 1-127: Application errors
/// - 128+N: Signal N received (e.g., 130 = SIGINT)
#[repr(i32)]
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Configuration error (invalid config file, missing required fields)
    ConfigError = 1,
    /// Manifest error (missing file, malformed row)
    ManifestError = 2,
    /// Schema document error (missing or unparsable definition in S3)
    SchemaError = 3,
    /// Catalog error (Glue permissions, throttling, persistent conflict)
    CatalogError = 4,
    /// General runtime error
    RuntimeError = 10,
    /// Signal interrupt (SIGINT = 2, so 128 + 2 = 130)
    SignalInterrupt = 130,
}

impl ExitCode {
    /// Convert an error to an exit code by inspecting the error message.
    fn from_error(error: &anyhow::Error) -> Self {
        let error_str = error.to_string().to_lowercase();

        if error_str.contains("config") || error_str.contains("toml") {
            ExitCode::ConfigError
        } else if error_str.contains("manifest") {
            ExitCode::ManifestError
        } else if error_str.contains("schema") || error_str.contains("storage") {
            ExitCode::SchemaError
        } else if error_str.contains("catalog") || error_str.contains("glue") {
            ExitCode::CatalogError
        } else {
            ExitCode::RuntimeError
        }
    }
}

mod commands;

#[derive(Parser)]
#[command(name = "s2g")]
#[command(about = "Deploy S3-versioned table definitions to the Glue catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every table in the manifest against the catalog
    Apply {
        /// Override the bucket holding the table definitions
        #[arg(long)]
        bucket: Option<String>,

        /// Override the manifest path
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Override the conflict policy ("replace" or "rename")
        #[arg(long)]
        policy: Option<String>,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let exit_code = run_cli().await;
    std::process::exit(exit_code as i32);
}

/// Main CLI execution logic with proper error handling.
async fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    // Try to load config for log format settings (optional - falls back to JSON)
    let log_format = cli
        .config
        .as_ref()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| toml::from_str::<Config>(&content).ok())
        .map(|config| config.monitoring.log_format)
        .unwrap_or(LogFormat::Json);

    // Initialize logging
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Configure log format based on config
    match log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .init();
        }
    }

    let result = execute_command(cli).await;

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            // Log the error
            tracing::error!(error = %e, "Command failed");

            // Determine appropriate exit code
            ExitCode::from_error(&e)
        }
    }
}

/// Execute the CLI command.
async fn execute_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Apply {
            bucket,
            manifest,
            policy,
        } => {
            let config = load_config(&cli.config)?;
            commands::apply::run(config, bucket, manifest, policy).await?;
        }

        Commands::Validate => {
            let config = load_config(&cli.config)?;
            config.validate()?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

/// Load configuration from the given path, default `config.toml`.
///
/// A missing file is not an error: the bucket can be supplied entirely on
/// the command line, so fall back to a defaulted configuration that
/// `Config::validate` will reject if the bucket never gets set.
fn load_config(path: &Option<PathBuf>) -> Result<Config> {
    let path = path.clone().unwrap_or_else(|| PathBuf::from("config.toml"));

    if !path.exists() {
        return Ok(Config::for_bucket(""));
    }

    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}
