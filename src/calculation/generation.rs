use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::core::{Target, TestGenerationResult};
use crate::generators::{FileInfo, GeneratorRegistry, TestGenerator};

/// Runs the configured generator from the builtin registry on `target`.
pub fn calculate_generation_result(
    target: &Target,
    config: &Config,
) -> Result<TestGenerationResult> {
    calculate_generation_result_with(&GeneratorRegistry::builtin(), target, config)
}

/// Resolves `config.generator_name` in `registry`, runs it on `target`, and
/// persists a successful body to `target.test`. The result is returned as
/// produced by the generator.
pub fn calculate_generation_result_with(
    registry: &GeneratorRegistry,
    target: &Target,
    config: &Config,
) -> Result<TestGenerationResult> {
    let factory = registry.resolve(&config.generator_name)?;
    let generator = factory();
    generate_with(generator.as_ref(), target, config)
}

pub(crate) fn generate_with(
    generator: &dyn TestGenerator,
    target: &Target,
    config: &Config,
) -> Result<TestGenerationResult> {
    tracing::debug!(
        source = %target.source.display(),
        module = %target.source_module,
        generator = %config.generator_name,
        "generating test"
    );

    let info = FileInfo::from_target(target, config);
    let result = generator.build_test(&info).with_context(|| {
        format!(
            "generator {} failed on {}",
            config.generator_name,
            target.source.display()
        )
    })?;

    match &result {
        TestGenerationResult::Failure {
            reason,
            error_lines,
        } => {
            tracing::debug!(
                source = %target.relative_source.display(),
                %reason,
                "test generation failed"
            );
            if config.show_failures {
                show_failure(target, reason, error_lines, config);
            }
        }
        TestGenerationResult::Success { body } => {
            if body.is_empty() {
                anyhow::bail!(
                    "generator {} returned an empty test body for {}",
                    config.generator_name,
                    target.source.display()
                );
            }
            write_test(&target.test, body)?;
            tracing::debug!(test = %target.test.display(), "wrote generated test");
        }
    }

    Ok(result)
}

/// Diagnostics are best effort: a sink that stops accepting lines does not
/// turn a reported failure into a run error.
fn show_failure(target: &Target, reason: &str, error_lines: &[String], config: &Config) {
    let console = &config.console;
    let header = format!(
        "Target {} failed with {reason}",
        target.relative_source.display()
    );
    let written = std::iter::once(header)
        .chain(error_lines.iter().map(|line| format!("- {line}")))
        .try_for_each(|line| console.println(&line));
    if let Err(err) = written {
        tracing::warn!(
            source = %target.relative_source.display(),
            error = %err,
            "failed to write failure diagnostics"
        );
    }
}

fn write_test(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create test directory: {}", parent.display())
        })?;
    }
    std::fs::write(path, body.as_bytes())
        .with_context(|| format!("failed to write generated test: {}", path.display()))
}
