use crate::cli::command::{CommandRun, CommandSpec};
use anyhow::{Context, Result};
use asyncbox::{duration_ms, wait_for_condition, PollConfig, PollError, Settings, TracingLogger};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct WaitArgs {
    pub wait_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub error: Option<String>,
    pub json: bool,
    pub command: Vec<String>,
}

#[derive(Serialize)]
struct WaitOutput {
    command: String,
    attempts: u32,
    elapsed_ms: u64,
    #[serde(flatten)]
    run: CommandRun,
}

pub async fn run(settings: &Settings, args: WaitArgs) -> Result<()> {
    let spec = CommandSpec::from_argv(args.command)?;
    let config = build_config(settings, args.wait_ms, args.interval_ms, args.error)?;

    tracing::info!(
        command = %spec.display(),
        wait_ms = duration_ms(config.wait),
        interval_ms = duration_ms(config.interval),
        "Waiting for command to succeed"
    );

    let attempts = AtomicU32::new(0);
    let start = Instant::now();
    let run = poll_command(&spec, &config, &attempts).await?;
    let elapsed = start.elapsed();
    let attempts = attempts.into_inner();

    tracing::info!(attempts, elapsed_ms = duration_ms(elapsed), "Condition met");

    if args.json {
        let output = WaitOutput {
            command: spec.display(),
            attempts,
            elapsed_ms: duration_ms(elapsed),
            run,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", run.stdout);
    }

    Ok(())
}

fn build_config(
    settings: &Settings,
    wait_ms: Option<u64>,
    interval_ms: Option<u64>,
    error: Option<String>,
) -> Result<PollConfig> {
    let mut config = settings
        .poll_config()
        .logger(Arc::new(TracingLogger));

    if let Some(ms) = wait_ms {
        config = config.wait_ms(ms);
    }
    if let Some(ms) = interval_ms {
        config = config.interval_ms(ms);
    }
    if let Some(message) = error {
        config = config.error(message);
    }

    if config.interval.is_zero() && !config.wait.is_zero() {
        anyhow::bail!("--interval-ms must be greater than 0 when --wait-ms is set");
    }
    Ok(config)
}

async fn poll_command(
    spec: &CommandSpec,
    config: &PollConfig,
    attempts: &AtomicU32,
) -> Result<CommandRun> {
    let polled = wait_for_condition(
        move || {
            attempts.fetch_add(1, Ordering::Relaxed);
            spec.run_once()
        },
        config,
    )
    .await;

    match polled {
        Ok(run) => Ok(run),
        Err(PollError::Timeout(e)) => Err(e.into()),
        Err(PollError::Condition(e)) => {
            Err(e).with_context(|| format!("Failed to run `{}`", spec.display()))
        }
    }
}
