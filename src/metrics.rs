//! Lookup metrics
//!
//! Counters and histograms are recorded through the `metrics` facade. Nothing
//! is exported unless the embedding process installs a recorder.

use std::time::Instant;

use crate::pipeline::processing::scoring::Band;

pub const LOOKUPS_TOTAL: &str = "product_health_lookups_total";
pub const LOOKUP_FAILURES_TOTAL: &str = "product_health_lookup_failures_total";
pub const SCORES_TOTAL: &str = "product_health_scores_total";
pub const SCORE_HISTOGRAM: &str = "product_health_score";
pub const SOURCE_DURATION_SECONDS: &str = "product_health_source_duration_seconds";

/// A timing guard that records its elapsed time when dropped
pub struct TimingGuard {
    start: Instant,
    histogram_name: &'static str,
    source: &'static str,
}

impl TimingGuard {
    pub fn new(histogram_name: &'static str, source: &'static str) -> Self {
        Self {
            start: Instant::now(),
            histogram_name,
            source,
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(self.histogram_name, "source" => self.source).record(duration);
    }
}

pub struct LookupMetrics;

impl LookupMetrics {
    pub fn record_lookup(input_kind: &'static str) {
        ::metrics::counter!(LOOKUPS_TOTAL, "input" => input_kind).increment(1);
    }

    pub fn record_failure(source: &'static str) {
        ::metrics::counter!(LOOKUP_FAILURES_TOTAL, "source" => source).increment(1);
    }

    pub fn record_score(score: u8, band: Band) {
        ::metrics::counter!(SCORES_TOTAL, "band" => band.as_str()).increment(1);
        ::metrics::histogram!(SCORE_HISTOGRAM).record(score as f64);
    }

    pub fn time_source(source: &'static str) -> TimingGuard {
        TimingGuard::new(SOURCE_DURATION_SECONDS, source)
    }
}
