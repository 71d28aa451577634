use std::collections::BTreeMap;
use std::sync::Arc;
use super::LoopMetrics;

/// Point-in-time copy of one loop's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub loop_name: String,
    pub iterations: u64,
    pub items: u64,
    pub errors: u64,
    pub rejected: u64,
    pub avg_latency_us: u64,
}

/// Named handles to the metrics of every loop in a context
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    metrics: BTreeMap<String, Arc<LoopMetrics>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, metrics: Arc<LoopMetrics>) {
        self.metrics.insert(name.into(), metrics);
    }

    pub fn unregister(&mut self, name: &str) {
        self.metrics.remove(name);
    }

    /// Snapshots ordered by registration name
    pub fn snapshot(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(name, metrics)| {
                (
                    name.clone(),
                    MetricsSnapshot {
                        loop_name: metrics.loop_name().to_string(),
                        iterations: metrics.iterations(),
                        items: metrics.items(),
                        errors: metrics.errors(),
                        rejected: metrics.rejected(),
                        avg_latency_us: metrics.avg_latency_us(),
                    },
                )
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoopMetrics>> {
        self.metrics.get(name).cloned()
    }
}
