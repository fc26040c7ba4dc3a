//! Queries against the Flink JobManager REST endpoint.
//!
//! The runner only ever cares about the most recently submitted job. A job id
//! is handed out only for a job that has not reached a terminal state, so the
//! finished job of the previous query is never mistaken for the next one.
//! Running and terminal checks follow the `/jobs/overview` entry with the
//! latest `start-time`.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::session::JobManagerAddress;

/// Job states after which no further progress is expected.
pub const TERMINAL_STATES: [&str; 4] = ["CANCELLING", "CANCELED", "FINISHED", "FAILED"];

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("jobmanager request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("jobmanager returned HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("unexpected jobmanager response: {0}")]
    Decode(String),
}

/// Status capabilities the runner needs from a running cluster.
///
/// Every error is treated by the runner as "not yet" for the current poll.
pub trait JobStatusClient {
    /// Identifier of the most recently submitted job that is not yet
    /// cancelling or finished, if one is visible.
    fn current_job_id(&self) -> Result<Option<String>, StatusError>;

    fn is_job_running(&self) -> Result<bool, StatusError>;

    /// True once the current job is cancelling, cancelled, finished or failed.
    fn is_job_cancelling_or_finished(&self) -> Result<bool, StatusError>;

    /// Raw status document for `job_id`, stored as the diagnostic of a finished run.
    fn job_details(&self, job_id: &str) -> Result<String, StatusError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobOverview {
    pub jid: String,
    #[serde(default)]
    pub name: String,
    pub state: String,
    #[serde(rename = "start-time", default)]
    pub start_time: i64,
}

impl JobOverview {
    pub fn is_running(&self) -> bool {
        self.state == "RUNNING"
    }

    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATES.contains(&self.state.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct JobsOverviewResponse {
    #[serde(default)]
    jobs: Vec<JobOverview>,
}

pub struct FlinkRestClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl FlinkRestClient {
    pub fn new(
        address: &JobManagerAddress,
        request_timeout: Duration,
    ) -> Result<Self, StatusError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: format!("http://{}:{}", address.host, address.port),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> Result<reqwest::blocking::Response, StatusError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StatusError::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }

    pub fn jobs_overview(&self) -> Result<Vec<JobOverview>, StatusError> {
        let body = self.get("/jobs/overview")?.text()?;
        let parsed: JobsOverviewResponse =
            serde_json::from_str(&body).map_err(|e| StatusError::Decode(e.to_string()))?;
        Ok(parsed.jobs)
    }

    pub fn latest_job(&self) -> Result<Option<JobOverview>, StatusError> {
        Ok(latest_job(self.jobs_overview()?))
    }

    pub fn latest_active_job(&self) -> Result<Option<JobOverview>, StatusError> {
        let jobs = self.jobs_overview()?;
        Ok(latest_job(jobs.into_iter().filter(|job| !job.is_terminal())))
    }
}

impl JobStatusClient for FlinkRestClient {
    fn current_job_id(&self) -> Result<Option<String>, StatusError> {
        let job = match self.latest_active_job()? {
            Some(job) if !job.jid.is_empty() => job,
            _ => return Ok(None),
        };
        tracing::debug!(
            job_id = %job.jid,
            job_name = %job.name,
            state = %job.state,
            "found current job"
        );
        Ok(Some(job.jid))
    }

    fn is_job_running(&self) -> Result<bool, StatusError> {
        Ok(self.latest_job()?.is_some_and(|job| job.is_running()))
    }

    fn is_job_cancelling_or_finished(&self) -> Result<bool, StatusError> {
        Ok(self.latest_job()?.is_some_and(|job| job.is_terminal()))
    }

    fn job_details(&self, job_id: &str) -> Result<String, StatusError> {
        Ok(self.get(&format!("/jobs/{}", job_id))?.text()?)
    }
}

fn latest_job(jobs: impl IntoIterator<Item = JobOverview>) -> Option<JobOverview> {
    jobs.into_iter().max_by_key(|job| job.start_time)
}
