//! Sanitization counters

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Process-lifetime correction counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationCounters {
    pub records_sanitized: u64,
    pub subtotal_corrections: u64,
    pub total_corrections: u64,
}

/// Sink for sanitizer corrections, injected into the sanitizer
pub trait SanitizationMetrics: Send + Sync {
    /// Record one corrected record
    fn record(&self, subtotal_corrected: bool, total_corrected: bool);

    fn snapshot(&self) -> SanitizationCounters;
}

/// Mutex-guarded in-memory counters
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<SanitizationCounters>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SanitizationMetrics for InMemoryMetrics {
    fn record(&self, subtotal_corrected: bool, total_corrected: bool) {
        if !subtotal_corrected && !total_corrected {
            return;
        }
        let mut counters = self.counters.lock();
        counters.records_sanitized += 1;
        counters.subtotal_corrections += u64::from(subtotal_corrected);
        counters.total_corrections += u64::from(total_corrected);
    }

    fn snapshot(&self) -> SanitizationCounters {
        *self.counters.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_counts() {
        let metrics = InMemoryMetrics::new();
        metrics.record(true, true);
        metrics.record(false, true);
        metrics.record(false, false);

        assert_eq!(
            metrics.snapshot(),
            SanitizationCounters {
                records_sanitized: 2,
                subtotal_corrections: 1,
                total_corrections: 2,
            }
        );
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record(true, false);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_sanitized, 8000);
        assert_eq!(snapshot.subtotal_corrections, 8000);
        assert_eq!(snapshot.total_corrections, 0);
    }

    #[test]
    fn test_serialize_field_names() {
        let json = serde_json::to_value(SanitizationCounters::default()).unwrap();
        assert_eq!(json["records_sanitized"], 0);
        assert_eq!(json["subtotal_corrections"], 0);
        assert_eq!(json["total_corrections"], 0);
    }
}
