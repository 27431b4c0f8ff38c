use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;

use crate::calculation::{NotMeasured, calculate_results};
use crate::config::Config;
use crate::core::{RatioResults, Results, Target, TestGenerationResult};
use crate::generators::GeneratorRegistry;
use crate::ui::{Console, UiConfig};

#[derive(Debug, Parser)]
#[command(
    name = "testgen-arena",
    version,
    about = "Run a test generator over source files and report generation, coverage and mutation ratios"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Generators,
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source files, relative to the targets directory or absolute under it.
    pub targets: Vec<PathBuf>,
    #[arg(long)]
    pub generator: Option<String>,
    #[arg(long)]
    pub show_failures: bool,
    #[arg(long)]
    pub targets_dir: Option<PathBuf>,
    #[arg(long)]
    pub tests_dir: Option<PathBuf>,
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    results: &'a Results,
    total: RatioResults,
    generations: &'a [TestGenerationResult],
    csv_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_file: Option<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    init_tracing(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;
    let env_config_path = std::env::var_os("TESTGEN_ARENA_CONFIG").map(PathBuf::from);
    let mut cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &cwd,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let ui_cfg = UiConfig {
        color: stdout_is_tty && !cli.no_color,
        stderr_is_tty,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let registry = GeneratorRegistry::builtin();

    match cli.command {
        Commands::Run(args) => {
            apply_run_overrides(&mut cfg, &args, &cwd);
            if cli.json {
                cfg.console = Console::Stderr;
            }
            run_targets(&registry, &cfg, &args.targets, &ui_cfg, cli.json)?;
        }
        Commands::Generators => {
            if cli.json {
                let names: Vec<&str> = registry.names().collect();
                write_json(&names)?;
            } else {
                for name in registry.names() {
                    println!("{name}");
                }
            }
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "testgen-arena", &mut out);
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    write_json(&cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `testgen-arena config --show`");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn apply_run_overrides(cfg: &mut Config, args: &RunArgs, cwd: &std::path::Path) {
    let resolve = |p: &PathBuf| {
        if p.is_absolute() {
            p.clone()
        } else {
            cwd.join(p)
        }
    };
    if let Some(name) = &args.generator {
        cfg.generator_name = name.clone();
    }
    if args.show_failures {
        cfg.show_failures = true;
    }
    if let Some(p) = &args.targets_dir {
        cfg.targets_dir = resolve(p);
    }
    if let Some(p) = &args.tests_dir {
        cfg.tests_dir = resolve(p);
    }
    if let Some(p) = &args.results_dir {
        cfg.results_dir = resolve(p);
    }
}

fn run_targets(
    registry: &GeneratorRegistry,
    cfg: &Config,
    sources: &[PathBuf],
    ui_cfg: &UiConfig,
    json: bool,
) -> Result<()> {
    // Unknown generators are rejected before any target is touched.
    registry
        .resolve(&cfg.generator_name)
        .map_err(|e| crate::exit::invalid_args_err(e.into()))?;

    if sources.is_empty() {
        return Err(crate::exit::invalid_args(
            "no targets given (pass source files relative to the targets directory)",
        ));
    }
    let targets = sources
        .iter()
        .map(|source| {
            let target = Target::new(&cfg.targets_dir, &cfg.tests_dir, source)?;
            if !target.source.is_file() {
                anyhow::bail!("target does not exist: {}", target.source.display());
            }
            Ok(target)
        })
        .collect::<Result<Vec<_>>>()
        .map_err(crate::exit::invalid_args_err)?;

    let progress_enabled = ui_cfg.stderr_is_tty && !ui_cfg.quiet && !json;
    let pb = if progress_enabled {
        let pb = indicatif::ProgressBar::new(targets.len() as u64);
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let started_at = OffsetDateTime::now_utc();
    let outcome = calculate_results(registry, &targets, cfg, &NotMeasured, |target, _| {
        if let Some(pb) = &pb {
            pb.set_message(target.relative_source.display().to_string());
            pb.inc(1);
        }
    });
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let outcome = outcome?;
    let finished_at = OffsetDateTime::now_utc();

    crate::reporters::report_csv(&outcome.results, cfg).map_err(crate::exit::write_failed_err)?;
    let log_path = crate::logs::write_run_log(cfg, started_at, finished_at, &outcome)
        .map_err(crate::exit::write_failed_err)?;

    if json {
        write_json(&RunSummary {
            results: &outcome.results,
            total: outcome.results.total(),
            generations: &outcome.generations,
            csv_file: cfg.csv_file().display().to_string(),
            log_file: Some(log_path.display().to_string()),
        })?;
    } else {
        crate::ui::print_summary(&outcome.results, outcome.failures(), ui_cfg);
        if ui_cfg.verbose && !ui_cfg.quiet {
            println!();
            println!("csv: {}", cfg.csv_file().display());
            println!("log: {}", log_path.display());
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(value)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish)"
        ))),
    }
}
