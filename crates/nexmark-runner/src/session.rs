use anyhow::{anyhow, Result};
use std::fmt;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::str::FromStr;

const WEB_INTERFACE_MARKER: &str = "Web Interface:";

/// Host and REST port of a Flink JobManager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobManagerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for JobManagerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for JobManagerAddress {
    type Err = anyhow::Error;

    /// Accepts `host:port`, optionally prefixed by a URL scheme.
    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let (host, port) = without_scheme
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("invalid jobmanager address '{}': expected host:port", raw))?;
        if host.is_empty() {
            return Err(anyhow!("invalid jobmanager address '{}': empty host", raw));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| anyhow!("invalid jobmanager port in '{}': {}", raw, e))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Extracts the JobManager address from a `Web Interface: http://host:port` banner line.
pub fn parse_web_interface(line: &str) -> Option<Result<JobManagerAddress>> {
    let (_, url) = line.split_once(WEB_INTERFACE_MARKER)?;
    Some(url.trim().parse())
}

/// Starts a detached YARN session and returns the address its banner reports.
///
/// `command` is the program plus arguments, normally `flink-yarn-session -d`.
/// Output is echoed to the log until the banner line appears, after which the
/// launcher is left to exit on its own.
pub fn start_yarn_session(command: &[String]) -> Result<JobManagerAddress> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("session command is empty"))?;
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| anyhow!("failed to start '{}': {}", program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("session launcher has no stdout"))?;
    let mut address = None;
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        tracing::info!(target: "nexmark::session", "{}", line);
        if let Some(parsed) = parse_web_interface(&line) {
            address = Some(parsed?);
            break;
        }
    }

    let status = child.wait()?;
    if !status.success() {
        tracing::warn!(?status, "session launcher exited unsuccessfully");
    }
    address.ok_or_else(|| anyhow!("could not find Web Interface URL in YARN session output"))
}
