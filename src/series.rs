use std::collections::VecDeque;

use crate::percentile::percentile_hwm;

/// Latency samples (ms) of one task, in arrival order.
///
/// Unbounded unless a window is set; with a window of `C` only the newest `C`
/// samples are retained, while `observed` keeps counting every sample.
/// Statistics are computed over the retained samples.
#[derive(Debug, Clone, Default)]
pub struct TaskSeries {
    samples: VecDeque<i64>,
    window: Option<usize>,
    observed: u64,
}

impl TaskSeries {
    pub fn new(window: Option<usize>) -> Self {
        Self {
            samples: VecDeque::with_capacity(window.unwrap_or(0).min(4096)),
            window,
            observed: 0,
        }
    }

    pub fn record(&mut self, delay_ms: i64) {
        if let Some(cap) = self.window {
            while self.samples.len() >= cap {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(delay_ms);
        self.observed += 1;
    }

    /// Every sample ever recorded, evicted ones included.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once the window has pushed out at least one sample.
    pub fn has_evicted(&self) -> bool {
        self.observed > self.samples.len() as u64
    }

    /// Retained samples in arrival order.
    pub fn snapshot(&self) -> Vec<i64> {
        self.samples.iter().copied().collect()
    }

    /// WCRT: the largest retained delay.
    pub fn worst_case(&self) -> Option<i64> {
        self.samples.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: i128 = self.samples.iter().map(|&s| i128::from(s)).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    pub fn hwm(&self, q: f64) -> f64 {
        percentile_hwm(&self.snapshot(), q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_series_keeps_everything() {
        let mut series = TaskSeries::new(None);
        for delay in [5, -2, 40, 40] {
            series.record(delay);
        }
        assert_eq!(series.snapshot(), vec![5, -2, 40, 40]);
        assert_eq!(series.observed(), 4);
        assert!(!series.has_evicted());
        assert_eq!(series.worst_case(), Some(40));
        assert_eq!(series.mean(), Some(20.75));
    }

    #[test]
    fn test_window_keeps_newest_samples() {
        let mut series = TaskSeries::new(Some(3));
        for delay in [900, 1, 2, 3, 4] {
            series.record(delay);
        }
        assert_eq!(series.snapshot(), vec![2, 3, 4]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.observed(), 5);
        assert!(series.has_evicted());
        // the 900ms outlier has aged out of the window
        assert_eq!(series.worst_case(), Some(4));
        assert_eq!(series.hwm(1.0), 4.0);
    }

    #[test]
    fn test_empty_series() {
        let series = TaskSeries::new(Some(8));
        assert!(series.is_empty());
        assert_eq!(series.worst_case(), None);
        assert_eq!(series.mean(), None);
        assert!(series.hwm(0.99).is_nan());
    }

    #[test]
    fn test_mean_does_not_overflow() {
        let mut series = TaskSeries::new(None);
        series.record(i64::MAX);
        series.record(i64::MAX);
        assert_eq!(series.mean(), Some(i64::MAX as f64));
    }
}
