/// Event collection and summary statistics for one analysis cycle
pub mod log_aggregator;

pub use log_aggregator::{aggregate, LogAggregator, SeverityCounts};
