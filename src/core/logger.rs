use std::sync::{Arc, Mutex};

/// Debug-level sink for progress lines emitted while polling.
pub trait PollLogger: Send + Sync {
    fn debug(&self, message: &str);
}

/// Forwards poll progress to `tracing` under the `asyncbox::poll` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PollLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "asyncbox::poll", "{}", message);
    }
}

/// Keeps every line in memory. Handy for asserting on poll progress.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl PollLogger for MemoryLogger {
    fn debug(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}
