pub mod metrics;
pub mod registry;
pub mod report;

pub use metrics::LoopMetrics;
pub use registry::{MetricsRegistry, MetricsSnapshot};
pub use report::StatusReport;
