use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Exit information from one submission. `exit_code` is `None` when the
/// client was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub exit_code: Option<i32>,
}

impl SubmitOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn exit_label(&self) -> String {
        self.exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

/// Hands a rendered script to the cluster and blocks until the client exits.
pub trait Submitter {
    fn submit(&self, script: &Path) -> Result<SubmitOutcome>;
}

/// Submits through `<flink-home>/bin/sql-client.sh embedded -f <script>`.
///
/// The embedded SQL client returns once the job is accepted, not once it
/// finishes, so the call is short even for long-running queries.
#[derive(Debug, Clone)]
pub struct SqlClientSubmitter {
    flink_home: PathBuf,
}

impl SqlClientSubmitter {
    pub fn new(flink_home: impl Into<PathBuf>) -> Self {
        Self {
            flink_home: flink_home.into(),
        }
    }

    pub fn sql_client(&self) -> PathBuf {
        self.flink_home.join("bin").join("sql-client.sh")
    }

    fn command(&self, script: &Path) -> Result<Command> {
        let script = absolute(script)?;
        let mut cmd = Command::new(absolute(&self.sql_client())?);
        cmd.arg("embedded").arg("-f").arg(script);
        Ok(cmd)
    }
}

impl Submitter for SqlClientSubmitter {
    fn submit(&self, script: &Path) -> Result<SubmitOutcome> {
        let mut cmd = self.command(script)?;
        let status = cmd
            .status()
            .map_err(|e| anyhow!("failed to run {}: {}", self.sql_client().display(), e))?;
        Ok(SubmitOutcome {
            exit_code: status.code(),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
