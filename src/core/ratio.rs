use serde::Serialize;
use thiserror::Error;

use crate::core::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("successful count {successful} exceeds total {total}")]
pub struct RatioError {
    pub total: u64,
    pub successful: u64,
}

/// A single axis measurement: `successful` out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatioResult {
    total: u64,
    successful: u64,
}

impl RatioResult {
    pub fn new(total: u64, successful: u64) -> Result<Self, RatioError> {
        if successful > total {
            return Err(RatioError { total, successful });
        }
        Ok(Self { total, successful })
    }

    /// Generation axis for a single attempt: `1/1` or `0/1`.
    pub const fn single(success: bool) -> Self {
        Self {
            total: 1,
            successful: success as u64,
        }
    }

    pub const fn total(&self) -> u64 {
        self.total
    }

    pub const fn successful(&self) -> u64 {
        self.successful
    }

    /// `None` when nothing was measured (`total == 0`).
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.successful as f64 / self.total as f64)
    }

    fn add(self, other: Self) -> Self {
        Self {
            total: self.total.saturating_add(other.total),
            successful: self.successful.saturating_add(other.successful),
        }
    }
}

/// The four measurement axes, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Generation,
    LineCoverage,
    BranchCoverage,
    Mutation,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::Generation,
        Axis::LineCoverage,
        Axis::BranchCoverage,
        Axis::Mutation,
    ];
}

/// Per-target (or aggregate) bundle of axis measurements. An axis that was
/// not analysed is `None`, which is distinct from `0/0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatioResults {
    pub generation_results: Option<RatioResult>,
    pub line_coverage: Option<RatioResult>,
    pub branch_coverage: Option<RatioResult>,
    pub mutation_analysis: Option<RatioResult>,
}

impl RatioResults {
    pub fn get(&self, axis: Axis) -> Option<RatioResult> {
        match axis {
            Axis::Generation => self.generation_results,
            Axis::LineCoverage => self.line_coverage,
            Axis::BranchCoverage => self.branch_coverage,
            Axis::Mutation => self.mutation_analysis,
        }
    }

    fn slot(&mut self, axis: Axis) -> &mut Option<RatioResult> {
        match axis {
            Axis::Generation => &mut self.generation_results,
            Axis::LineCoverage => &mut self.line_coverage,
            Axis::BranchCoverage => &mut self.branch_coverage,
            Axis::Mutation => &mut self.mutation_analysis,
        }
    }

    /// Axis-wise sum of counts. Ratios are recomputed from the summed counts,
    /// never averaged.
    pub fn sum<'a>(rows: impl IntoIterator<Item = &'a RatioResults>) -> Self {
        let mut total = Self::default();
        for row in rows {
            for axis in Axis::ALL {
                if let Some(value) = row.get(axis) {
                    let slot = total.slot(axis);
                    *slot = Some(match *slot {
                        Some(acc) => acc.add(value),
                        None => value,
                    });
                }
            }
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetResults {
    pub target: Target,
    pub ratios: RatioResults,
}

/// Ordered per-target results of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Results {
    targets: Vec<TargetResults>,
}

impl Results {
    pub fn new(targets: Vec<TargetResults>) -> Self {
        Self { targets }
    }

    pub fn push(&mut self, target: Target, ratios: RatioResults) {
        self.targets.push(TargetResults { target, ratios });
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TargetResults> {
        self.targets.iter()
    }

    pub fn total(&self) -> RatioResults {
        RatioResults::sum(self.targets.iter().map(|t| &t.ratios))
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = &'a TargetResults;
    type IntoIter = std::slice::Iter<'a, TargetResults>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
