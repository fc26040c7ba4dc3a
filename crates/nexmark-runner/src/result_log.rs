use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MISSING_JOB_ID: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one workload attempt, written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub query: String,
    pub job_id: Option<String>,
    pub status: Status,
    pub output: String,
}

impl OutcomeRecord {
    pub fn success(query: &str, job_id: &str, output: String) -> Self {
        Self {
            query: query.to_string(),
            job_id: Some(job_id.to_string()),
            status: Status::Success,
            output,
        }
    }

    pub fn failed(query: &str, job_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            job_id: job_id.map(str::to_string),
            status: Status::Failed,
            output: reason.into(),
        }
    }

    pub fn job_id_or_na(&self) -> &str {
        self.job_id.as_deref().unwrap_or(MISSING_JOB_ID)
    }

    /// Renders the record as one results-file line, newline included.
    pub fn format_line(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "[{}] QUERY: {} JOB_ID: {} STATUS: {} OUTPUT: {}\n",
            timestamp.format(TIMESTAMP_FORMAT),
            self.query,
            self.job_id_or_na(),
            self.status,
            single_line(&self.output)
        )
    }
}

fn single_line(text: &str) -> String {
    text.trim_end_matches(['\r', '\n'])
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Default results path, `/tmp/results-<timestamp>.txt`.
pub fn default_results_path() -> PathBuf {
    PathBuf::from(format!(
        "/tmp/results-{}.txt",
        Local::now().format("%Y-%m-%d-%H%M%S")
    ))
}

/// Append-only results file. Every append is its own open/write/close so a
/// crash loses at most the record being written.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &OutcomeRecord) -> Result<()> {
        self.append_at(record, Local::now().naive_local())
    }

    pub fn append_at(&self, record: &OutcomeRecord, timestamp: NaiveDateTime) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.format_line(timestamp).as_bytes())?;
        Ok(())
    }
}
