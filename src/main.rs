use anyhow::Result;
use asyncbox::{LogFormat, Settings};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

#[derive(Parser)]
#[command(name = "asyncbox")]
#[command(author, version, about = "Wait for, retry and time external commands")]
struct Cli {
    /// Path to a config file (default: ~/.config/asyncbox/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command until it succeeds or the time budget runs out
    Wait {
        /// Total time budget in milliseconds
        #[arg(long)]
        wait_ms: Option<u64>,

        /// Pause between attempts in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Message to fail with on timeout
        #[arg(long)]
        error: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Command to run, after `--`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Run a command until it succeeds, at most N times
    Retry {
        /// Maximum number of attempts
        #[arg(long)]
        times: Option<u32>,

        /// Pause after each failed attempt in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Command to run, after `--`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Sleep for the given number of milliseconds
    Sleep { ms: u64 },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    settings.validate()?;
    Ok(settings)
}

fn init_logging(settings: &Settings) {
    let default_level = if settings.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match settings.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref())?;
    init_logging(&settings);

    match cli.command {
        Commands::Wait {
            wait_ms,
            interval_ms,
            error,
            json,
            command,
        } => {
            let args = cli::wait::WaitArgs {
                wait_ms,
                interval_ms,
                error,
                json,
                command,
            };
            cli::wait::run(&settings, args).await
        }
        Commands::Retry {
            times,
            interval_ms,
            json,
            command,
        } => {
            let args = cli::retry::RetryArgs {
                times,
                interval_ms,
                json,
                command,
            };
            cli::retry::run(&settings, args).await
        }
        Commands::Sleep { ms } => cli::sleep::run(ms).await,
        Commands::Completions { .. } => Ok(()),
    }
}
