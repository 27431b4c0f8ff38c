use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ui::Console;

pub const CONFIG_FILE_NAME: &str = "testgen-arena.toml";
pub const CSV_FILE_NAME: &str = "statistics.csv";

/// Effective configuration of one run. Built once and shared by reference.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub generator_name: String,
    pub show_failures: bool,
    pub targets_dir: PathBuf,
    pub tests_dir: PathBuf,
    pub results_dir: PathBuf,
    #[serde(skip)]
    pub console: Console,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

impl Config {
    /// Defaults with every directory resolved against `base_dir`.
    pub fn rooted_at(base_dir: &Path) -> Self {
        Self {
            generator_name: "dummy".to_string(),
            show_failures: false,
            targets_dir: base_dir.join("targets"),
            tests_dir: base_dir.join("generated_tests"),
            results_dir: base_dir.join("results"),
            console: Console::default(),
            config_path: None,
        }
    }

    pub fn csv_file(&self) -> PathBuf {
        self.results_dir.join(CSV_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.results_dir.join("logs")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    generator: Option<RawGeneratorConfig>,
    output: Option<RawOutputConfig>,
    paths: Option<RawPathsConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGeneratorConfig {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutputConfig {
    show_failures: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPathsConfig {
    targets_dir: Option<PathBuf>,
    tests_dir: Option<PathBuf>,
    results_dir: Option<PathBuf>,
}

pub fn default_config_path(cwd: &Path) -> PathBuf {
    cwd.join(CONFIG_FILE_NAME)
}

/// Defaults, then the TOML file, then `TESTGEN_ARENA_*` environment overrides.
///
/// An explicitly given `config_path` must exist; the default location is
/// optional.
pub fn load(config_path: Option<&Path>, cwd: &Path) -> Result<Config> {
    let mut cfg = Config::rooted_at(cwd);

    let path = match config_path {
        Some(p) => {
            let p = resolve(cwd, p);
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            Some(p)
        }
        None => Some(default_config_path(cwd)).filter(|p| p.exists()),
    };

    if let Some(path) = path {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        let base = path.parent().unwrap_or(cwd).to_path_buf();
        apply_raw_config(&mut cfg, raw, &base);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg, cwd)?;

    Ok(cfg)
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn apply_raw_config(cfg: &mut Config, raw: RawConfig, base: &Path) {
    if let Some(generator) = raw.generator {
        if let Some(name) = generator.name {
            cfg.generator_name = name;
        }
    }

    if let Some(output) = raw.output {
        if let Some(show_failures) = output.show_failures {
            cfg.show_failures = show_failures;
        }
    }

    // Directories default to the config file's location once a file is used.
    cfg.targets_dir = base.join("targets");
    cfg.tests_dir = base.join("generated_tests");
    cfg.results_dir = base.join("results");
    if let Some(paths) = raw.paths {
        if let Some(p) = paths.targets_dir {
            cfg.targets_dir = resolve(base, &p);
        }
        if let Some(p) = paths.tests_dir {
            cfg.tests_dir = resolve(base, &p);
        }
        if let Some(p) = paths.results_dir {
            cfg.results_dir = resolve(base, &p);
        }
    }
}

fn apply_env_overrides(cfg: &mut Config, cwd: &Path) -> Result<()> {
    if let Ok(v) = std::env::var("TESTGEN_ARENA_GENERATOR") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.generator_name = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("TESTGEN_ARENA_SHOW_FAILURES") {
        cfg.show_failures =
            parse_bool(&v).with_context(|| "TESTGEN_ARENA_SHOW_FAILURES")?;
    }
    if let Some(p) = env_path("TESTGEN_ARENA_TARGETS_DIR") {
        cfg.targets_dir = resolve(cwd, &p);
    }
    if let Some(p) = env_path("TESTGEN_ARENA_TESTS_DIR") {
        cfg.tests_dir = resolve(cwd, &p);
    }
    if let Some(p) = env_path("TESTGEN_ARENA_RESULTS_DIR") {
        cfg.results_dir = resolve(cwd, &p);
    }

    Ok(())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
