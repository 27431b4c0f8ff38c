mod generation;
mod results;

pub use generation::{calculate_generation_result, calculate_generation_result_with};
pub use results::{Measurements, NotMeasured, RunOutcome, calculate_results};
