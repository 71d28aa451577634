use super::MetricsRegistry;

/// Human-readable summary of loop activity
pub struct StatusReport {
    registry: MetricsRegistry,
}

impl StatusReport {
    pub fn new(registry: MetricsRegistry) -> Self {
        Self { registry }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.registry.snapshot();

        if snapshot.is_empty() {
            return "No loops registered".to_string();
        }

        let mut report = String::from("=== Collection Status ===\n");

        for (name, metrics) in snapshot.iter() {
            report.push_str(&format!(
                "\n[{}]\n  Iterations: {}\n  Items: {}\n  Errors: {}\n  Rejected: {}\n  Avg Latency: {}μs\n",
                name,
                metrics.iterations,
                metrics.items,
                metrics.errors,
                metrics.rejected,
                metrics.avg_latency_us
            ));
        }

        report
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LoopMetrics;
    use std::sync::Arc;

    #[test]
    fn test_empty_report() {
        let report = StatusReport::new(MetricsRegistry::new());
        assert_eq!(report.generate_report(), "No loops registered");
    }

    #[test]
    fn test_report_lists_loops() {
        let metrics = Arc::new(LoopMetrics::new("collector"));
        metrics.record_iteration();
        metrics.record_items(12);

        let mut registry = MetricsRegistry::new();
        registry.register("collector", metrics);

        let text = StatusReport::new(registry).generate_report();
        assert!(text.contains("[collector]"));
        assert!(text.contains("Items: 12"));
    }
}
