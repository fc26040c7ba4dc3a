use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::catalogue::Catalogue;
use crate::poll::PollPolicy;
use crate::result_log::{OutcomeRecord, ResultLog};
use crate::status::JobStatusClient;
use crate::submit::Submitter;

/// Reasons a workload stops before its job reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EarlyFailure {
    #[error("SQL file not found")]
    ScriptNotFound,
    #[error("Could not get job ID")]
    NoJobId,
    #[error("Job did not start running")]
    NotRunning,
}

/// Waits applied around one workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
    /// Pause between submission and the first job id poll.
    pub settle_delay: Duration,
    pub job_id: PollPolicy,
    pub running: PollPolicy,
    /// Unbounded: completion time of a query is not known up front.
    pub terminal: PollPolicy,
    /// Pause after the first terminal observation so the cluster settles
    /// before the status snapshot is taken.
    pub post_terminal_delay: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        crate::config::RunnerConfig::default().timings()
    }
}

pub fn script_file_name(query: &str) -> String {
    format!("nexmark-{}.sql", query)
}

/// Runs workloads one at a time and records one outcome per attempt.
pub struct QueryRunner<C, S> {
    sql_dir: PathBuf,
    timings: PollTimings,
    client: C,
    submitter: S,
    results: ResultLog,
}

impl<C: JobStatusClient, S: Submitter> QueryRunner<C, S> {
    pub fn new(
        sql_dir: impl Into<PathBuf>,
        timings: PollTimings,
        client: C,
        submitter: S,
        results: ResultLog,
    ) -> Self {
        Self {
            sql_dir: sql_dir.into(),
            timings,
            client,
            submitter,
            results,
        }
    }

    pub fn results(&self) -> &ResultLog {
        &self.results
    }

    pub fn script_path(&self, query: &str) -> PathBuf {
        self.sql_dir.join(script_file_name(query))
    }

    /// Runs every non-excluded catalogue entry in order. A failed query never
    /// stops the sweep and is never retried.
    pub fn run_all(&self, catalogue: &Catalogue) -> Vec<OutcomeRecord> {
        let mut records = Vec::new();
        for query in catalogue.queries() {
            if catalogue.is_excluded(query) {
                tracing::info!(query = %query, "skipping query");
                continue;
            }
            records.push(self.run_query(query));
        }
        records
    }

    /// Runs one query to a recorded outcome. Never fails: every error becomes
    /// a FAILED record.
    pub fn run_query(&self, query: &str) -> OutcomeRecord {
        let record = match self.attempt(query) {
            Ok(record) => record,
            Err(err) => {
                let message = format!("{:#}", err);
                tracing::error!(query = %query, error = %message, "error running query");
                OutcomeRecord::failed(query, None, message)
            }
        };
        self.record(&record);
        record
    }

    fn record(&self, record: &OutcomeRecord) {
        if let Err(err) = self.results.append(record) {
            tracing::error!(
                query = %record.query,
                path = %self.results.path().display(),
                error = %err,
                "error writing to results file"
            );
        }
    }

    fn attempt(&self, query: &str) -> Result<OutcomeRecord> {
        let script = self.script_path(query);
        if !script.exists() {
            tracing::error!(query = %query, script = %script.display(), "SQL file not found");
            return Ok(early_failure(query, None, EarlyFailure::ScriptNotFound));
        }

        tracing::info!(query = %query, "starting query");
        self.dispatch(query, &script);
        thread::sleep(self.timings.settle_delay);

        let job_id = match self.wait_for_job_id() {
            Some(job_id) => job_id,
            None => {
                tracing::error!(query = %query, "failed to get job ID");
                return Ok(early_failure(query, None, EarlyFailure::NoJobId));
            }
        };
        tracing::info!(query = %query, job_id = %job_id, "job started");

        if !self.wait_for_running() {
            tracing::error!(query = %query, job_id = %job_id, "job failed to start running");
            return Ok(early_failure(query, Some(&job_id), EarlyFailure::NotRunning));
        }

        self.wait_for_completion(query, &job_id);
        thread::sleep(self.timings.post_terminal_delay);

        let snapshot = self
            .client
            .job_details(&job_id)
            .map_err(|e| anyhow!("failed to fetch status for job {}: {}", job_id, e))?;
        tracing::info!(query = %query, job_id = %job_id, "completed query with status SUCCESS");
        Ok(OutcomeRecord::success(query, &job_id, snapshot))
    }

    /// Submission result is logged only; the job id poll decides whether the
    /// cluster actually accepted the query.
    fn dispatch(&self, query: &str, script: &Path) {
        match self.submitter.submit(script) {
            Ok(outcome) if outcome.success() => {
                tracing::debug!(query = %query, "sql client exited cleanly");
            }
            Ok(outcome) => {
                tracing::warn!(
                    query = %query,
                    exit = %outcome.exit_label(),
                    "sql client exited unsuccessfully, polling for job anyway"
                );
            }
            Err(err) => {
                tracing::warn!(
                    query = %query,
                    error = %err,
                    "sql client submission failed, polling for job anyway"
                );
            }
        }
    }

    fn wait_for_job_id(&self) -> Option<String> {
        self.timings.job_id.poll_until(|attempt| {
            match self.client.current_job_id() {
                Ok(Some(id)) if !id.is_empty() => Some(id),
                Ok(_) => None,
                Err(err) => {
                    tracing::trace!(attempt, error = %err, "job id not available yet");
                    None
                }
            }
        })
    }

    fn wait_for_running(&self) -> bool {
        self.timings
            .running
            .poll_until_true(|attempt| match self.client.is_job_running() {
                Ok(running) => running,
                Err(err) => {
                    tracing::trace!(attempt, error = %err, "running state not available yet");
                    false
                }
            })
    }

    fn wait_for_completion(&self, query: &str, job_id: &str) {
        self.timings.terminal.poll_until_true(|attempt| {
            if attempt > 0 {
                tracing::info!(query = %query, job_id = %job_id, "job is still running");
            }
            match self.client.is_job_cancelling_or_finished() {
                Ok(done) => done,
                Err(err) => {
                    tracing::trace!(attempt, error = %err, "terminal state not available yet");
                    false
                }
            }
        });
    }
}

fn early_failure(query: &str, job_id: Option<&str>, reason: EarlyFailure) -> OutcomeRecord {
    OutcomeRecord::failed(query, job_id, reason.to_string())
}
