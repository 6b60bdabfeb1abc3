pub mod daily_summary;
pub mod observation;
pub mod sample;

pub use daily_summary::DailySummary;
pub use observation::{Observation, ObservationView};
pub use sample::Sample;
