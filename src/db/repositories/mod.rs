pub mod daily_summaries;
pub mod observations;
pub mod samples;
