use std::fmt::Write as _;

use crate::config::RUNNING_HWM_QUANTILES;
use crate::percentile::format_hwms;
use crate::series::TaskSeries;
use crate::store::AggregationStore;

pub const NO_SAMPLES_NOTICE: &str = "No samples received.";

/// Running summary printed after each recorded datagram.
pub fn running_line(task: &str, delay_ms: i64, series: &TaskSeries) -> String {
    let wcrt = series.worst_case().unwrap_or(delay_ms);
    format!(
        "   {}: delay={}ms | WCRT={}ms | {} | n={}",
        task,
        delay_ms,
        wcrt,
        format_hwms(&series.snapshot(), &RUNNING_HWM_QUANTILES),
        series.observed()
    )
}

/// Final per-task report: count, WCRT, mean and the configured HWMs.
pub fn render_report(store: &AggregationStore, quantiles: &[f64]) -> String {
    if store.is_empty() {
        return format!("\n{NO_SAMPLES_NOTICE}");
    }

    let mut out = String::from("\nFinal report per task (WCRT and HWMs):");
    for (task, series) in store.tasks_sorted() {
        let (Some(wcrt), Some(avg)) = (series.worst_case(), series.mean()) else {
            continue;
        };
        let window = if series.has_evicted() {
            format!(" (window={})", series.len())
        } else {
            String::new()
        };
        let _ = write!(
            out,
            "\n - {}: n={}{} | WCRT={}ms | avg={:.1}ms | {}",
            task,
            series.observed(),
            window,
            wcrt,
            avg,
            format_hwms(&series.snapshot(), quantiles)
        );
    }
    out
}

pub fn print_report(store: &AggregationStore, quantiles: &[f64]) {
    println!("{}", render_report(store, quantiles));
}
