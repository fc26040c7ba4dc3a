//! Builds submittable SQL scripts from the Nexmark query templates.
//!
//! A script is a `SET pipeline.name` line, the shared DDL fragments, then the
//! query fragment, with `${NAME}` placeholders replaced throughout.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalogue::Catalogue;
use crate::runner::script_file_name;

pub const DEFAULT_PREAMBLE: [&str; 3] = ["ddl_gen.sql", "ddl_kafka.sql", "ddl_views.sql"];

pub fn default_vars() -> BTreeMap<String, String> {
    [
        ("TPS", "1000000"),
        ("EVENTS_NUM", "100000000"),
        ("PERSON_PROPORTION", "1"),
        ("AUCTION_PROPORTION", "1"),
        ("BID_PROPORTION", "1"),
        ("NEXMARK_TABLE", "datagen"),
        ("BOOTSTRAP_SERVERS", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    query_dir: PathBuf,
    vars: BTreeMap<String, String>,
    preamble: Vec<String>,
}

impl TemplateRenderer {
    pub fn new(query_dir: impl Into<PathBuf>) -> Self {
        Self {
            query_dir: query_dir.into(),
            vars: default_vars(),
            preamble: DEFAULT_PREAMBLE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_preamble<I, P>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.preamble = fragments.into_iter().map(Into::into).collect();
        self
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn substitute(&self, line: &str) -> String {
        let mut out = line.to_string();
        for (name, value) in &self.vars {
            out = out.replace(&format!("${{{}}}", name), value);
        }
        out
    }

    fn fragment_lines(&self, fragment: &str) -> Result<Vec<String>> {
        let path = self.query_dir.join(fragment);
        let raw = fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read template {}: {}", path.display(), e))?;
        Ok(raw.lines().map(|line| self.substitute(line)).collect())
    }

    pub fn render_query(&self, query: &str) -> Result<Vec<String>> {
        let mut lines = vec![format!(
            "SET pipeline.name = 'Nexmark {}';",
            query.to_uppercase()
        )];
        for fragment in &self.preamble {
            lines.extend(self.fragment_lines(fragment)?);
        }
        lines.extend(self.fragment_lines(&format!("{}.sql", query))?);
        Ok(lines)
    }

    pub fn write_query(&self, query: &str, out_dir: &Path) -> Result<PathBuf> {
        let lines = self.render_query(query)?;
        let path = out_dir.join(script_file_name(query));
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Renders every catalogue entry, excluded ones included. A query that
    /// fails to render is logged and skipped.
    pub fn render_all(&self, catalogue: &Catalogue, out_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();
        for query in catalogue.queries() {
            match self.write_query(query, out_dir) {
                Ok(path) => {
                    tracing::info!(query = %query, path = %path.display(), "generated SQL file");
                    written.push(path);
                }
                Err(err) => {
                    tracing::error!(query = %query, error = %err, "error generating SQL file");
                }
            }
        }
        Ok(written)
    }
}
