use crate::cli::command::{CommandRun, CommandSpec};
use anyhow::Result;
use asyncbox::{retry_interval, Settings};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct RetryArgs {
    pub times: Option<u32>,
    pub interval_ms: Option<u64>,
    pub json: bool,
    pub command: Vec<String>,
}

#[derive(Serialize)]
struct RetryOutput {
    command: String,
    attempts: u32,
    #[serde(flatten)]
    run: CommandRun,
}

pub async fn run(settings: &Settings, args: RetryArgs) -> Result<()> {
    let spec = CommandSpec::from_argv(args.command)?;
    let times = args.times.unwrap_or(settings.retry.times);
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.retry.interval());

    if times == 0 {
        anyhow::bail!("--times must be at least 1");
    }

    tracing::info!(command = %spec.display(), times, ?interval, "Running command with retries");

    let attempts = AtomicU32::new(0);
    let run = retry_command(&spec, times, interval, &attempts).await?;
    let attempts = attempts.into_inner();

    if args.json {
        let output = RetryOutput {
            command: spec.display(),
            attempts,
            run,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", run.stdout);
    }

    Ok(())
}

async fn retry_command(
    spec: &CommandSpec,
    times: u32,
    interval: Duration,
    attempts: &AtomicU32,
) -> Result<CommandRun> {
    retry_interval(times, interval, move || attempt_once(spec, attempts)).await
}

async fn attempt_once(spec: &CommandSpec, attempts: &AtomicU32) -> Result<CommandRun> {
    let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
    let run = spec.run_once().await?;
    if run.success {
        return Ok(run);
    }

    tracing::warn!(attempt, status = %run.exit_description(), "Command failed");
    anyhow::bail!(
        "`{}` failed with {}: {}",
        spec.display(),
        run.exit_description(),
        run.stderr.trim()
    )
}
