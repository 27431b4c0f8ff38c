use anyhow::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use unicode_width::UnicodeWidthChar;

use crate::core::{Axis, RatioResult, RatioResults, Results};
use crate::reporters::format_ratio;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stderr_is_tty: bool,
    pub quiet: bool,
    pub verbose: bool,
}

/// Line-oriented sink for user-facing diagnostics.
#[derive(Debug, Clone, Default)]
pub enum Console {
    #[default]
    Stdout,
    Stderr,
    /// Keeps lines in memory; clones share the same buffer.
    Capture(Arc<Mutex<Vec<String>>>),
    /// Any other destination, e.g. a log file or a pipe.
    Writer(SharedWriter),
}

/// A `Write` handle that can sit inside a cloneable [`Console`].
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<Box<dyn Write + Send>>>);

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedWriter")
    }
}

impl Console {
    pub fn capture() -> Self {
        Console::Capture(Arc::default())
    }

    pub fn writer(inner: impl Write + Send + 'static) -> Self {
        Console::Writer(SharedWriter(Arc::new(Mutex::new(Box::new(inner)))))
    }

    pub fn println(&self, line: &str) -> io::Result<()> {
        match self {
            Console::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Console::Stderr => writeln!(io::stderr().lock(), "{line}"),
            Console::Capture(lines) => {
                lines
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(line.to_string());
                Ok(())
            }
            Console::Writer(SharedWriter(inner)) => {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(inner, "{line}")?;
                inner.flush()
            }
        }
    }

    /// Lines written so far; always empty for the non-capturing variants.
    pub fn captured(&self) -> Vec<String> {
        match self {
            Console::Capture(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            _ => Vec::new(),
        }
    }
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - re-run with `--verbose` for per-target diagnostics"
    );
    let _ = writeln!(
        stderr,
        "  - see `testgen-arena --help` for available commands and options"
    );
}

pub fn print_summary(results: &Results, failures: usize, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    let _ = writeln!(
        out,
        "summary: targets={}  failed={}",
        results.len(),
        failures
    );
    let _ = writeln!(out);
    print_results_table(&mut out, results, cfg.color);
}

const COLUMNS: [&str; 5] = ["target", "generation", "lines", "branches", "mutation"];

fn print_results_table(out: &mut dyn Write, results: &Results, color: bool) {
    let mut rows: Vec<[String; 5]> = results
        .iter()
        .map(|row| table_row(&row.target.relative_source.display().to_string(), &row.ratios, color))
        .collect();
    rows.push(table_row("total", &results.total(), color));

    let mut widths = COLUMNS.map(visible_width_ansi);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(visible_width_ansi(cell));
        }
    }

    let header: Vec<String> = COLUMNS
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (label, w))| {
            if i == 0 {
                pad_end_display(label, w)
            } else {
                pad_start_display(label, w)
            }
        })
        .collect();
    let _ = writeln!(out, "{}", header.join("  "));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 0 {
                    pad_end_display(cell, w)
                } else {
                    pad_start_display(cell, w)
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
}

fn table_row(label: &str, ratios: &RatioResults, color: bool) -> [String; 5] {
    let [generation, lines, branches, mutation] = Axis::ALL.map(|axis| format_cell(ratios.get(axis), color));
    [label.to_string(), generation, lines, branches, mutation]
}

fn format_cell(value: Option<RatioResult>, color: bool) -> String {
    let Some(r) = value else {
        return "-".to_string();
    };
    let ratio = r.ratio().map(format_ratio).unwrap_or_else(|| "n/a".to_string());
    let text = format!("{}/{} ({ratio})", r.successful(), r.total());
    if !color {
        return text;
    }
    let code = match r.ratio() {
        None => "90",
        Some(x) if x >= 1.0 => "32",
        Some(x) if x > 0.0 => "33",
        Some(_) => "31",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_start_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{}{}", " ".repeat(width - w), s)
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Target;
    use std::path::Path;

    #[test]
    fn capture_console_shares_lines_between_clones() {
        let console = Console::capture();
        let clone = console.clone();
        clone.println("first").expect("println");
        console.println("second").expect("println");
        assert_eq!(console.captured(), vec!["first", "second"]);
        assert!(Console::Stdout.captured().is_empty());
    }

    #[test]
    fn writer_console_reports_sink_errors() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = Console::writer(Closed).println("lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(Console::writer(io::sink()).println("kept").is_ok());
    }

    #[test]
    fn visible_width_ignores_ansi_sequences() {
        assert_eq!(visible_width_ansi("\x1b[32m1/1 (1.0)\x1b[0m"), 9);
        assert_eq!(visible_width_ansi("テスト"), 6);
    }

    #[test]
    fn results_table_aligns_columns_and_marks_missing_axes() {
        let target = Target::new(Path::new("/t"), Path::new("/g"), Path::new("a.py")).expect("target");
        let mut results = Results::default();
        results.push(
            target,
            RatioResults {
                generation_results: Some(RatioResult::single(true)),
                ..Default::default()
            },
        );

        let mut buf: Vec<u8> = Vec::new();
        print_results_table(&mut buf, &results, false);
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("target"), "{text}");
        assert!(lines[2].starts_with("a.py "), "{text}");
        assert!(lines[2].contains("1/1 (1.0)"), "{text}");
        assert!(lines[2].ends_with('-'), "{text}");
        assert!(lines[3].starts_with("total"), "{text}");
    }
}
