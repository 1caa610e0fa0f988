use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics collector for the application.
///
/// Tracks analysis volume, inference latency, and history persistence
/// outcomes. Thread-safe and shared across handlers.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    // Analysis metrics
    analyses_total: AtomicUsize,
    analyses_success: AtomicUsize,
    analyses_failed: AtomicUsize,
    inference_latency_ms: RwLock<Vec<u64>>,

    // Batch metrics
    batches_processed: AtomicUsize,
    batch_items_total: AtomicUsize,
    batch_items_failed: AtomicUsize,

    // History metrics
    history_appends: AtomicUsize,
    history_append_failures: AtomicUsize,

    // Per-endpoint request counters
    endpoint_counters: DashMap<String, AtomicUsize>,

    // Start time for uptime calculation
    start_time: Instant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub analyses_total: usize,
    pub analyses_success: usize,
    pub analyses_failed: usize,
    pub avg_inference_latency_ms: f64,
    pub batches_processed: usize,
    pub batch_items_total: usize,
    pub batch_items_failed: usize,
    pub history_appends: usize,
    pub history_append_failures: usize,
    pub requests_by_endpoint: std::collections::BTreeMap<String, usize>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                analyses_total: AtomicUsize::new(0),
                analyses_success: AtomicUsize::new(0),
                analyses_failed: AtomicUsize::new(0),
                inference_latency_ms: RwLock::new(Vec::new()),
                batches_processed: AtomicUsize::new(0),
                batch_items_total: AtomicUsize::new(0),
                batch_items_failed: AtomicUsize::new(0),
                history_appends: AtomicUsize::new(0),
                history_append_failures: AtomicUsize::new(0),
                endpoint_counters: DashMap::new(),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.inner
            .endpoint_counters
            .entry(endpoint.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis(&self, success: bool, duration: Duration) {
        self.inner.analyses_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.analyses_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.analyses_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .inference_latency_ms
            .write()
            .push(duration.as_millis() as u64);
    }

    pub fn record_batch(&self, items: usize, failed: usize) {
        self.inner.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.inner.batch_items_total.fetch_add(items, Ordering::Relaxed);
        self.inner.batch_items_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_history_append(&self, success: bool) {
        self.inner.history_appends.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.inner
                .history_append_failures
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self.inner.inference_latency_ms.read();
        let avg_latency = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
        };

        MetricsSnapshot {
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
            analyses_total: self.inner.analyses_total.load(Ordering::Relaxed),
            analyses_success: self.inner.analyses_success.load(Ordering::Relaxed),
            analyses_failed: self.inner.analyses_failed.load(Ordering::Relaxed),
            avg_inference_latency_ms: avg_latency,
            batches_processed: self.inner.batches_processed.load(Ordering::Relaxed),
            batch_items_total: self.inner.batch_items_total.load(Ordering::Relaxed),
            batch_items_failed: self.inner.batch_items_failed.load(Ordering::Relaxed),
            history_appends: self.inner.history_appends.load(Ordering::Relaxed),
            history_append_failures: self.inner.history_append_failures.load(Ordering::Relaxed),
            requests_by_endpoint: self
                .inner
                .endpoint_counters
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }

    /// Prometheus text exposition of the counters.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        out.push_str("# TYPE aquagrade_analyses_total counter\n");
        out.push_str(&format!(
            "aquagrade_analyses_total {}\n",
            snapshot.analyses_total
        ));
        out.push_str("# TYPE aquagrade_analyses_failed counter\n");
        out.push_str(&format!(
            "aquagrade_analyses_failed {}\n",
            snapshot.analyses_failed
        ));
        out.push_str("# TYPE aquagrade_batches_processed counter\n");
        out.push_str(&format!(
            "aquagrade_batches_processed {}\n",
            snapshot.batches_processed
        ));
        out.push_str("# TYPE aquagrade_batch_items_failed counter\n");
        out.push_str(&format!(
            "aquagrade_batch_items_failed {}\n",
            snapshot.batch_items_failed
        ));
        out.push_str("# TYPE aquagrade_history_append_failures counter\n");
        out.push_str(&format!(
            "aquagrade_history_append_failures {}\n",
            snapshot.history_append_failures
        ));
        out.push_str("# TYPE aquagrade_inference_latency_avg_ms gauge\n");
        out.push_str(&format!(
            "aquagrade_inference_latency_avg_ms {:.2}\n",
            snapshot.avg_inference_latency_ms
        ));
        out.push_str("# TYPE aquagrade_uptime_seconds counter\n");
        out.push_str(&format!(
            "aquagrade_uptime_seconds {}\n",
            snapshot.uptime_seconds
        ));

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
