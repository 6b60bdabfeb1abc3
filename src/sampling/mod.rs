pub mod controller;
pub mod loop_worker;
pub mod report;
pub mod sampler;
pub mod stats;

pub use controller::SamplingController;
pub use report::{CityReport, CycleReport, Step};
pub use sampler::Sampler;
pub use stats::{is_alert, next_observation, RunningStats};
