mod report;
mod stage;

pub use report::{LaunchReport, RunEnd};
pub use stage::{Lifecycle, Stage, StageOutcome, Transition};
