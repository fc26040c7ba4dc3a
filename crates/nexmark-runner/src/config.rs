use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::poll::PollPolicy;
use crate::runner::PollTimings;

/// Polling and timeout knobs, loaded from an optional YAML file.
///
/// Every field defaults to the timings the benchmark harness has always used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub settle_delay_secs: u64,
    pub job_id_poll_interval_ms: u64,
    pub job_id_max_attempts: u32,
    pub running_poll_interval_ms: u64,
    pub running_max_attempts: u32,
    pub terminal_poll_interval_ms: u64,
    pub post_terminal_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: 10,
            job_id_poll_interval_ms: 1000,
            job_id_max_attempts: 60,
            running_poll_interval_ms: 1000,
            running_max_attempts: 60,
            terminal_poll_interval_ms: 5000,
            post_terminal_delay_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config {}: {}", path.display(), e))?;
        Self::from_yaml(&raw).map_err(|e| anyhow!("invalid config {}: {}", path.display(), e))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        if config.terminal_poll_interval_ms == 0 {
            return Err(anyhow!("terminal_poll_interval_ms must be > 0"));
        }
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn timings(&self) -> PollTimings {
        PollTimings {
            settle_delay: Duration::from_secs(self.settle_delay_secs),
            job_id: PollPolicy::bounded(
                Duration::from_millis(self.job_id_poll_interval_ms),
                self.job_id_max_attempts,
            ),
            running: PollPolicy::bounded(
                Duration::from_millis(self.running_poll_interval_ms),
                self.running_max_attempts,
            ),
            terminal: PollPolicy::unbounded(Duration::from_millis(self.terminal_poll_interval_ms)),
            post_terminal_delay: Duration::from_secs(self.post_terminal_delay_secs),
        }
    }
}
