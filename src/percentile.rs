/// High-water-mark at quantile `q` using the nearest-rank (ceiling) method.
///
/// Sorts a copy of `values` and returns the element at zero-based index
/// `max(1, ceil(q * n)) - 1`, so the result is always an observed sample and
/// `q = 1.0` is the maximum. Returns `f64::NAN` for an empty slice; callers
/// must check before formatting or comparing.
pub fn percentile_hwm(values: &[i64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    hwm_of_sorted(&sorted, q)
}

/// Same as [`percentile_hwm`] over samples already sorted ascending.
fn hwm_of_sorted(sorted: &[i64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let rank = ((q * n as f64).ceil() as usize).max(1);
    sorted[rank.min(n) - 1] as f64
}

/// Quantile as a whole-percent label, truncated: `0.99` -> `99`, `0.29` -> `28`
/// (0.29 * 100 is just below 29 in binary floating point).
pub fn percent_label(q: f64) -> u32 {
    (q * 100.0) as u32
}

/// `HWM(100%)=50ms | HWM(99%)=50ms`; `n/a` where the series is empty.
/// Sorts one copy of `values` for all quantiles.
pub fn format_hwms(values: &[i64], quantiles: &[f64]) -> String {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    quantiles
        .iter()
        .map(|&q| {
            let hwm = hwm_of_sorted(&sorted, q);
            if hwm.is_nan() {
                format!("HWM({}%)=n/a", percent_label(q))
            } else {
                format!("HWM({}%)={:.0}ms", percent_label(q), hwm)
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_quantile_is_maximum() {
        let samples = vec![12, -3, 450, 7, 450, 0, 31];
        assert_eq!(percentile_hwm(&samples, 1.0), 450.0);
        assert_eq!(percentile_hwm(&[-8], 1.0), -8.0);
    }

    #[test]
    fn test_result_is_always_an_observed_sample() {
        let samples: Vec<i64> = (0..37).map(|i| (i * 7919) % 101 - 50).collect();
        for step in 1..=100 {
            let q = step as f64 / 100.0;
            let hwm = percentile_hwm(&samples, q);
            assert!(
                samples.iter().any(|&s| s as f64 == hwm),
                "q={q} gave {hwm}, not a sample"
            );
        }
    }

    #[test]
    fn test_nearest_rank_ceiling_index() {
        // sorted: [10, 20, 30, 40, 50, 60, 70, 80, 90, 100], n=10
        // q=0.95: ceil(9.5) = 10 -> index 9 -> 100
        // q=0.50: ceil(5.0) = 5  -> index 4 -> 50
        // q=0.01: ceil(0.1) = 1  -> index 0 -> 10
        let samples = vec![100, 90, 80, 70, 60, 50, 40, 30, 20, 10];
        assert_eq!(percentile_hwm(&samples, 0.95), 100.0);
        assert_eq!(percentile_hwm(&samples, 0.50), 50.0);
        assert_eq!(percentile_hwm(&samples, 0.01), 10.0);
    }

    #[test]
    fn test_two_samples_at_99_percent() {
        // n=2, ceil(0.99 * 2) = 2 -> index 1 -> 50
        assert_eq!(percentile_hwm(&[10, 50], 0.99), 50.0);
    }

    #[test]
    fn test_single_sample_ignores_quantile() {
        assert_eq!(percentile_hwm(&[5], 0.01), 5.0);
        assert_eq!(percentile_hwm(&[5], 0.5), 5.0);
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(percentile_hwm(&[], 1.0).is_nan());
        assert!(percentile_hwm(&[], 0.5).is_nan());
    }

    #[test]
    fn test_does_not_reorder_input() {
        let samples = vec![3, 1, 2];
        percentile_hwm(&samples, 0.5);
        assert_eq!(samples, vec![3, 1, 2]);
    }

    #[test]
    fn test_format_hwms_agrees_with_percentile_on_unsorted_input() {
        let samples = vec![70, -5, 30, 990, 12, 30, 400];
        let quantiles = [1.0, 0.99, 0.95, 0.5, 0.01];
        let expected = quantiles
            .iter()
            .map(|&q| format!("HWM({}%)={:.0}ms", percent_label(q), percentile_hwm(&samples, q)))
            .collect::<Vec<_>>()
            .join(" | ");
        assert_eq!(format_hwms(&samples, &quantiles), expected);
        assert_eq!(
            format_hwms(&samples, &[1.0, 0.5]),
            "HWM(100%)=990ms | HWM(50%)=30ms"
        );
    }

    #[test]
    fn test_format_hwms() {
        assert_eq!(
            format_hwms(&[10, 50], &[1.0, 0.99]),
            "HWM(100%)=50ms | HWM(99%)=50ms"
        );
        assert_eq!(format_hwms(&[], &[0.95]), "HWM(95%)=n/a");
        assert_eq!(percent_label(0.29), 28);
        assert_eq!(percent_label(0.95), 95);
        assert_eq!(percent_label(1.0), 100);
    }
}
