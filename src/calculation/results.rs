use anyhow::Result;

use crate::calculation::generation::generate_with;
use crate::config::Config;
use crate::core::{RatioResult, RatioResults, Results, Target, TestGenerationResult};
use crate::generators::GeneratorRegistry;

/// Source of coverage and mutation counts for a target whose test was
/// generated. `Ok(None)` means the axis was not analysed.
pub trait Measurements {
    fn line_coverage(&self, _target: &Target, _config: &Config) -> Result<Option<RatioResult>> {
        Ok(None)
    }

    fn branch_coverage(&self, _target: &Target, _config: &Config) -> Result<Option<RatioResult>> {
        Ok(None)
    }

    fn mutation(&self, _target: &Target, _config: &Config) -> Result<Option<RatioResult>> {
        Ok(None)
    }
}

/// Reports every coverage and mutation axis as not analysed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotMeasured;

impl Measurements for NotMeasured {}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: Results,
    /// One entry per target, in the same order as `results`.
    pub generations: Vec<TestGenerationResult>,
}

impl RunOutcome {
    pub fn failures(&self) -> usize {
        self.generations.iter().filter(|g| !g.is_success()).count()
    }
}

/// Generates a test for every target in order and collects per-target
/// ratios. The generator is resolved once, before any target is touched.
/// `observe` is called after each target.
pub fn calculate_results(
    registry: &GeneratorRegistry,
    targets: &[Target],
    config: &Config,
    measurements: &dyn Measurements,
    mut observe: impl FnMut(&Target, &TestGenerationResult),
) -> Result<RunOutcome> {
    let factory = registry.resolve(&config.generator_name)?;
    let generator = factory();

    let mut outcome = RunOutcome::default();
    for target in targets {
        let generation = generate_with(generator.as_ref(), target, config)?;
        let ratios = ratios_for(target, &generation, config, measurements)?;
        observe(target, &generation);
        outcome.results.push(target.clone(), ratios);
        outcome.generations.push(generation);
    }

    tracing::info!(
        targets = targets.len(),
        failures = outcome.failures(),
        "generation finished"
    );
    Ok(outcome)
}

fn ratios_for(
    target: &Target,
    generation: &TestGenerationResult,
    config: &Config,
    measurements: &dyn Measurements,
) -> Result<RatioResults> {
    let mut ratios = RatioResults {
        generation_results: Some(RatioResult::single(generation.is_success())),
        ..Default::default()
    };
    if generation.is_success() {
        ratios.line_coverage = measurements.line_coverage(target, config)?;
        ratios.branch_coverage = measurements.branch_coverage(target, config)?;
        ratios.mutation_analysis = measurements.mutation(target, config)?;
    }
    Ok(ratios)
}
