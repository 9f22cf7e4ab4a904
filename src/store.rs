use std::collections::HashMap;

use crate::series::TaskSeries;

/// Per-task latency series, keyed by the case-sensitive task name.
///
/// Owned by the ingest loop while it runs and handed back for the final
/// report. Keys are created on first sample and never removed.
#[derive(Debug, Default)]
pub struct AggregationStore {
    series: HashMap<String, TaskSeries>,
    window: Option<usize>,
}

impl AggregationStore {
    pub fn new(window: Option<usize>) -> Self {
        Self {
            series: HashMap::new(),
            window,
        }
    }

    /// Append one sample to `task`'s series and return the updated series.
    pub fn record(&mut self, task: &str, delay_ms: i64) -> &TaskSeries {
        let window = self.window;
        let series = self
            .series
            .entry(task.to_string())
            .or_insert_with(|| TaskSeries::new(window));
        series.record(delay_ms);
        series
    }

    pub fn get(&self, task: &str) -> Option<&TaskSeries> {
        self.series.get(task)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.series.len()
    }

    /// Samples recorded across all tasks.
    pub fn total_observed(&self) -> u64 {
        self.series.values().map(TaskSeries::observed).sum()
    }

    /// Tasks in case-insensitive order; keys differing only in case keep a
    /// stable relative order.
    pub fn tasks_sorted(&self) -> Vec<(&str, &TaskSeries)> {
        let mut tasks: Vec<_> = self
            .series
            .iter()
            .map(|(task, series)| (task.as_str(), series))
            .collect();
        tasks.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));
        tasks
    }
}
