use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Terminator, Writer, WriterBuilder};

use crate::config::Config;
use crate::core::{Axis, RatioResult, RatioResults, Results};

pub const HEADER: [&str; 13] = [
    "target",
    "successful ratio",
    "files",
    "successful files",
    "line coverage",
    "lines",
    "covered lines",
    "branch coverage",
    "branches",
    "covered branches",
    "mutation score",
    "mutants",
    "killed mutants",
];

pub const TOTAL_LABEL: &str = "total";

/// Writes `results` as CSV to [`Config::csv_file`], one row per target and a
/// trailing `total` row.
pub fn report_csv(results: &Results, config: &Config) -> Result<()> {
    let path = config.csv_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create results directory: {}", parent.display())
        })?;
    }

    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create CSV report: {}", path.display()))?;
    let mut writer = csv_writer(file);
    write_results(&mut writer, results)
        .with_context(|| format!("failed to write CSV report: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write CSV report: {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows = results.len() + 2, "wrote CSV report");
    Ok(())
}

/// The exact text [`report_csv`] writes.
pub fn render_csv(results: &Results) -> Result<String> {
    let mut writer = csv_writer(Vec::new());
    write_results(&mut writer, results).context("failed to render CSV")?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to render CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn csv_writer<W: io::Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(inner)
}

fn write_results<W: io::Write>(writer: &mut Writer<W>, results: &Results) -> csv::Result<()> {
    writer.write_record(HEADER)?;
    for row in results {
        writer.write_record(row_cells(
            &path_label(&row.target.relative_source),
            &row.ratios,
        ))?;
    }
    writer.write_record(row_cells(TOTAL_LABEL, &results.total()))
}

fn path_label(path: &Path) -> String {
    path.display().to_string()
}

fn row_cells(label: &str, ratios: &RatioResults) -> Vec<String> {
    let mut cells = Vec::with_capacity(HEADER.len());
    cells.push(label.to_string());
    for axis in Axis::ALL {
        cells.extend(axis_cells(ratios.get(axis)));
    }
    cells
}

fn axis_cells(value: Option<RatioResult>) -> [String; 3] {
    match value {
        None => [String::new(), String::new(), String::new()],
        Some(r) => [
            r.ratio().map(format_ratio).unwrap_or_default(),
            r.total().to_string(),
            r.successful().to_string(),
        ],
    }
}

/// Plain decimal (never exponent notation), keeping a `.0` on integral values.
pub fn format_ratio(ratio: f64) -> String {
    if ratio.fract() == 0.0 {
        format!("{ratio:.1}")
    } else {
        format!("{ratio}")
    }
}
