use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::calculation::RunOutcome;
use crate::config::Config;
use crate::core::TestGenerationResult;

#[derive(Debug, Serialize)]
struct RunLog {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    started_at: String,
    finished_at: String,
    generator: String,
    status: &'static str,
    csv_file: String,
    targets: Vec<RunLogTarget>,
}

#[derive(Debug, Serialize)]
struct RunLogTarget {
    target: String,
    module: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    error_lines: Vec<String>,
}

/// Writes a JSON record of one `run` under [`Config::logs_dir`] and returns
/// its path.
pub fn write_run_log(
    config: &Config,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    outcome: &RunOutcome,
) -> Result<PathBuf> {
    let dir = config.logs_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = finished_at.unix_timestamp_nanos();
    let path = dir.join(format!("run-{pid}-{ts}.json"));

    let targets = outcome
        .results
        .iter()
        .zip(&outcome.generations)
        .map(|(row, generation)| {
            let target = &row.target;
            let mut entry = RunLogTarget {
                target: target.relative_source.display().to_string(),
                module: target.source_module.clone(),
                status: generation.status(),
                test: None,
                reason: None,
                error_lines: vec![],
            };
            match generation {
                TestGenerationResult::Success { .. } => {
                    entry.test = Some(target.test.display().to_string());
                }
                TestGenerationResult::Failure {
                    reason,
                    error_lines,
                } => {
                    entry.reason = Some(reason.clone());
                    entry.error_lines = error_lines.clone();
                }
            }
            entry
        })
        .collect();

    let log = RunLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "run",
        started_at: started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        finished_at: finished_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        generator: config.generator_name.clone(),
        status: if outcome.failures() == 0 {
            "ok"
        } else {
            "partial_failure"
        },
        csv_file: config.csv_file().display().to_string(),
        targets,
    };

    let bytes = serde_json::to_vec_pretty(&log).context("failed to serialize run log")?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write run log: {}", path.display()))?;
    Ok(path)
}
