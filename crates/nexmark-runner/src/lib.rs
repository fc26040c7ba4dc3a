pub mod catalogue;
pub mod config;
pub mod poll;
pub mod render;
pub mod result_log;
pub mod runner;
pub mod session;
pub mod status;
pub mod submit;

use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub use catalogue::{Catalogue, EXCLUDED_QUERIES, NEXMARK_QUERIES};
pub use config::RunnerConfig;
pub use poll::PollPolicy;
pub use render::TemplateRenderer;
pub use result_log::{default_results_path, OutcomeRecord, ResultLog, Status};
pub use runner::{EarlyFailure, PollTimings, QueryRunner};
pub use session::{start_yarn_session, JobManagerAddress};
pub use status::{FlinkRestClient, JobStatusClient, StatusError};
pub use submit::{SqlClientSubmitter, SubmitOutcome, Submitter};

pub const DEFAULT_SESSION_COMMAND: [&str; 2] = ["flink-yarn-session", "-d"];

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub flink_home: PathBuf,
    pub sql_dir: PathBuf,
    /// Run only this query instead of the full sweep.
    pub query: Option<String>,
    /// Use an existing JobManager instead of starting a YARN session.
    pub jobmanager: Option<JobManagerAddress>,
    pub results_path: Option<PathBuf>,
    pub config: RunnerConfig,
    pub session_command: Vec<String>,
}

impl RunOptions {
    pub fn new(flink_home: impl Into<PathBuf>, sql_dir: impl Into<PathBuf>) -> Self {
        Self {
            flink_home: flink_home.into(),
            sql_dir: sql_dir.into(),
            query: None,
            jobmanager: None,
            results_path: None,
            config: RunnerConfig::default(),
            session_command: DEFAULT_SESSION_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct RunResult {
    pub jobmanager: JobManagerAddress,
    pub results_path: PathBuf,
    pub records: Vec<OutcomeRecord>,
}

/// Connects to (or starts) a cluster and runs the requested queries.
///
/// Only cluster bootstrap can fail here; per-query failures end up in the
/// results file and in `RunResult::records`.
pub fn run_benchmark(options: RunOptions) -> Result<RunResult> {
    let jobmanager = match options.jobmanager.clone() {
        Some(address) => address,
        None => start_yarn_session(&options.session_command)
            .map_err(|e| anyhow!("failed to start YARN session: {}", e))?,
    };
    let results_path = options
        .results_path
        .clone()
        .unwrap_or_else(default_results_path);
    tracing::info!(jobmanager = %jobmanager, "using Flink session");
    tracing::info!(path = %results_path.display(), "results will be written to file");

    let client = FlinkRestClient::new(&jobmanager, options.config.request_timeout())?;
    let runner = QueryRunner::new(
        &options.sql_dir,
        options.config.timings(),
        client,
        SqlClientSubmitter::new(&options.flink_home),
        ResultLog::new(&results_path),
    );

    let records = match options.query.as_deref() {
        Some(query) => {
            tracing::info!(query = %query, "running specific query");
            vec![runner.run_query(query)]
        }
        None => {
            tracing::info!("running all queries");
            runner.run_all(&Catalogue::nexmark())
        }
    };

    Ok(RunResult {
        jobmanager,
        results_path,
        records,
    })
}
