//! Request sequencing, concurrent counters, and the tick-driven stats log.
mod reporter;
mod sequence;
mod stats;
mod types;

#[cfg(test)]
mod tests;

pub use reporter::{Reporter, ReporterConfig, ReporterHandle, ReporterState, StopSignal};
pub use sequence::SequenceGenerator;
pub use stats::StatsAggregator;
pub use types::{ErrorCount, ReportSummary, StatsSnapshot};
