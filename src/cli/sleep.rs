use anyhow::Result;
use std::time::Duration;

pub async fn run(ms: u64) -> Result<()> {
    tracing::debug!(ms, "Sleeping");
    asyncbox::sleep(Duration::from_millis(ms)).await;
    Ok(())
}
