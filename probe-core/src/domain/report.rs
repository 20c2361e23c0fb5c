//! Run report types
//!
//! Aggregated results of a load run: check pass rates, per-request latency
//! distributions and poll outcome counts.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pass/fail counter for one named check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn record(&mut self, passed: bool) {
        if passed {
            self.passes += 1;
        } else {
            self.fails += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of passing evaluations, 1.0 when nothing was recorded
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 1.0,
            total => self.passes as f64 / total as f64,
        }
    }
}

/// Latency distribution of one tagged request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Summarises raw samples, `None` when there are none
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut ms: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64 / 1_000_000.0).collect();
        ms.sort_by(f64::total_cmp);

        let sum: f64 = ms.iter().sum();

        Some(Self {
            count: ms.len(),
            min_ms: ms[0],
            mean_ms: sum / ms.len() as f64,
            p90_ms: percentile(&ms, 0.90),
            p95_ms: percentile(&ms, 0.95),
            max_ms: ms[ms.len() - 1],
        })
    }
}

/// Nearest-rank percentile over sorted samples
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub iterations: u64,
    /// Highest number of concurrently active virtual users
    pub vus_max: u32,
    pub failed_requests: u64,
    pub checks: BTreeMap<String, CheckTally>,
    pub requests: BTreeMap<String, LatencyStats>,
    /// Requests that got no response at all, by name
    pub request_errors: BTreeMap<String, u64>,
    pub poll_outcomes: BTreeMap<String, u64>,
    pub poll_elapsed: Option<LatencyStats>,
}

impl RunSummary {
    /// Whether any check failed at least once
    pub fn has_failed_checks(&self) -> bool {
        self.checks.values().any(|tally| tally.fails > 0)
    }

    /// Pass/fail over all checks combined
    pub fn overall_checks(&self) -> CheckTally {
        self.checks
            .values()
            .fold(CheckTally::default(), |acc, tally| CheckTally {
                passes: acc.passes + tally.passes,
                fails: acc.fails + tally.fails,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tally() {
        let mut tally = CheckTally::default();
        assert_eq!(tally.pass_rate(), 1.0);
        tally.record(true);
        tally.record(true);
        tally.record(true);
        tally.record(false);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.pass_rate(), 0.75);
    }

    #[test]
    fn test_latency_stats() {
        assert!(LatencyStats::from_samples(&[]).is_none());

        let samples: Vec<Duration> = (1..=100).map(Duration::from_millis).collect();
        let stats = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.min_ms, 1.0);
        assert_eq!(stats.max_ms, 100.0);
        assert_eq!(stats.p90_ms, 90.0);
        assert_eq!(stats.p95_ms, 95.0);
        assert!((stats.mean_ms - 50.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let stats = LatencyStats::from_samples(&[Duration::from_millis(12)]).unwrap();
        assert_eq!(stats.p90_ms, 12.0);
        assert_eq!(stats.p95_ms, 12.0);
    }
}
