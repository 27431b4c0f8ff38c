use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use testgen_arena::config::Config;
use testgen_arena::core::{RatioResult, RatioResults, Results, Target};
use testgen_arena::reporters::{HEADER, render_csv, report_csv};

fn make_temp_root() -> PathBuf {
    static ROOT_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = ROOT_SEQ.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "testgen-arena-report-test-{}-{seq}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).expect("create root");
    root
}

fn ratio(total: u64, successful: u64) -> Option<RatioResult> {
    Some(RatioResult::new(total, successful).expect("valid ratio"))
}

fn sample_results(config: &Config) -> Results {
    let target = |p: &str| {
        Target::new(&config.targets_dir, &config.tests_dir, Path::new(p)).expect("target")
    };
    let mut results = Results::default();
    results.push(
        target("a.py"),
        RatioResults {
            generation_results: ratio(1, 1),
            line_coverage: ratio(4, 3),
            branch_coverage: None,
            mutation_analysis: ratio(0, 0),
        },
    );
    results.push(
        target("pkg/b.py"),
        RatioResults {
            generation_results: ratio(1, 1),
            line_coverage: ratio(4, 1),
            branch_coverage: ratio(3, 2),
            mutation_analysis: None,
        },
    );
    results.push(
        target("c.py"),
        RatioResults {
            generation_results: ratio(1, 0),
            ..Default::default()
        },
    );
    results
}

#[test]
fn csv_matches_golden() {
    let config = Config::rooted_at(Path::new("/work"));
    let csv = render_csv(&sample_results(&config)).expect("render");

    let expected = concat!(
        "target,successful ratio,files,successful files,line coverage,lines,covered lines,",
        "branch coverage,branches,covered branches,mutation score,mutants,killed mutants\r\n",
        "a.py,1.0,1,1,0.75,4,3,,,,,0,0\r\n",
        "pkg/b.py,1.0,1,1,0.25,4,1,0.6666666666666666,3,2,,,\r\n",
        "c.py,0.0,1,0,,,,,,,,,\r\n",
        "total,0.6666666666666666,3,2,0.5,8,4,0.6666666666666666,3,2,,0,0\r\n",
    );
    assert_eq!(csv, expected);
}

#[test]
fn csv_has_one_row_per_target_plus_header_and_total() {
    let config = Config::rooted_at(Path::new("/work"));
    let results = sample_results(&config);
    let csv = render_csv(&results).expect("render");

    let rows: Vec<&str> = csv.split_terminator("\r\n").collect();
    assert_eq!(rows.len(), results.len() + 2);
    for row in &rows {
        assert_eq!(row.split(',').count(), HEADER.len(), "{row}");
    }
    assert_eq!(rows.last().map(|r| r.split(',').next()), Some(Some("total")));
}

#[test]
fn target_path_with_comma_is_quoted() {
    let config = Config::rooted_at(Path::new("/work"));
    let mut results = Results::default();
    results.push(
        Target::new(&config.targets_dir, &config.tests_dir, Path::new("odd,name.py"))
            .expect("target"),
        RatioResults {
            generation_results: ratio(1, 1),
            ..Default::default()
        },
    );

    let csv = render_csv(&results).expect("render");
    let rows: Vec<&str> = csv.split_terminator("\r\n").collect();
    assert_eq!(rows[1], "\"odd,name.py\",1.0,1,1,,,,,,,,,");
    assert_eq!(rows[2], "total,1.0,1,1,,,,,,,,,");
}

#[test]
fn report_csv_creates_results_directory() {
    let root = make_temp_root();
    let mut config = Config::rooted_at(&root);
    config.results_dir = root.join("nested/results");
    let results = sample_results(&config);

    report_csv(&results, &config).expect("report");

    let written = std::fs::read_to_string(config.csv_file()).expect("read csv");
    assert_eq!(written, render_csv(&results).expect("render"));
    assert_eq!(config.csv_file(), root.join("nested/results/statistics.csv"));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn report_csv_fails_when_destination_is_unwritable() {
    let root = make_temp_root();
    let mut config = Config::rooted_at(&root);
    // A regular file where the results directory should be.
    let blocker = root.join("results");
    std::fs::write(&blocker, "not a directory").expect("write blocker");
    config.results_dir = blocker;

    let err = report_csv(&Results::default(), &config).unwrap_err();
    assert!(
        err.chain().any(|c| c.is::<std::io::Error>()),
        "expected an I/O error, got {err:?}"
    );

    let _ = std::fs::remove_dir_all(&root);
}
