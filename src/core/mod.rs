mod generation;
mod ratio;
mod target;

pub use generation::TestGenerationResult;
pub use ratio::{Axis, RatioError, RatioResult, RatioResults, Results, TargetResults};
pub use target::Target;
