use anyhow::Result;
use clap::{Parser, Subcommand};
use nexmark_runner::{
    Catalogue, JobManagerAddress, OutcomeRecord, RunOptions, RunResult, RunnerConfig,
    TemplateRenderer,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nexmark", version = "0.3.0", about = "Sequential Nexmark runner for Flink")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit queries one at a time and append one result line per query.
    Run {
        flink_home: PathBuf,
        sql_dir: PathBuf,
        /// Run only this query. Without it every query except q6 and q9 runs.
        query: Option<String>,
        /// Existing JobManager (host:port); skips starting a YARN session.
        #[arg(long)]
        jobmanager: Option<JobManagerAddress>,
        #[arg(long)]
        results: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// YARN session launcher, e.g. "flink-yarn-session -d".
        #[arg(long, value_delimiter = ' ', allow_hyphen_values = true)]
        session_command: Option<Vec<String>>,
        #[arg(long)]
        json: bool,
    },
    /// Render nexmark-<query>.sql scripts from the query templates.
    Render {
        #[arg(long, default_value = "queries")]
        queries: PathBuf,
        #[arg(long, default_value = "/tmp")]
        out: PathBuf,
        #[arg(long = "set")]
        set_values: Vec<String>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let json_mode = command_json_mode(&cli.command);
    let result = run_command(cli.command);
    match result {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", err.to_string(), json!({})));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn run_command(command: Commands) -> Result<Option<Value>> {
    match command {
        Commands::Run {
            flink_home,
            sql_dir,
            query,
            jobmanager,
            results,
            config,
            session_command,
            json,
        } => {
            let mut options = RunOptions::new(flink_home, sql_dir);
            options.query = query;
            options.jobmanager = jobmanager;
            options.results_path = results;
            options.config = RunnerConfig::load_or_default(config.as_deref())?;
            if let Some(cmd) = session_command {
                options.session_command = cmd;
            }
            let result = nexmark_runner::run_benchmark(options)?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "run",
                    "run": run_result_to_json(&result),
                })));
            }
            print_run_result(&result);
        }
        Commands::Render {
            queries,
            out,
            set_values,
            json,
        } => {
            let mut renderer = TemplateRenderer::new(&queries);
            for (name, value) in parse_set_bindings(&set_values)? {
                renderer = renderer.with_var(name, value);
            }
            let written = renderer.render_all(&Catalogue::nexmark(), &out)?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "render",
                    "queries": queries.display().to_string(),
                    "written": written
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>(),
                })));
            }
            for path in &written {
                println!("wrote: {}", path.display());
            }
        }
    }
    Ok(None)
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\",\"details\":{{}}}}}}"
        ),
    }
}

fn json_error(code: &str, message: String, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::Run { json, .. } | Commands::Render { json, .. } => *json,
    }
}

fn record_to_json(record: &OutcomeRecord) -> Value {
    json!({
        "query": record.query,
        "job_id": record.job_id,
        "status": record.status.as_str(),
        "output": record.output,
    })
}

fn run_result_to_json(result: &RunResult) -> Value {
    json!({
        "jobmanager": result.jobmanager.to_string(),
        "results": result.results_path.display().to_string(),
        "records": result.records.iter().map(record_to_json).collect::<Vec<_>>(),
    })
}

fn print_run_result(result: &RunResult) {
    println!("jobmanager: {}", result.jobmanager);
    println!("results: {}", result.results_path.display());
    for record in &result.records {
        println!(
            "{}: {} (job_id: {})",
            record.query,
            record.status,
            record.job_id_or_na()
        );
    }
}

fn parse_set_bindings(values: &[String]) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for raw in values {
        let (key, val) = raw
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!(format!("invalid --set '{}': expected K=V", raw)))?;
        if key.trim().is_empty() {
            return Err(anyhow::anyhow!(format!(
                "invalid --set '{}': key cannot be empty",
                raw
            )));
        }
        out.insert(key.trim().to_string(), val.to_string());
    }
    Ok(out)
}
