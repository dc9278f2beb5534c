use serde_json::{json, Map, Value};

/// Percentile labels emitted for every timing-derived metric family.
pub const SUMMARY_SUFFIXES: [&str; 5] = ["p50", "p90", "p95", "p99", "avg"];

/// Linear-interpolated percentile over an ascending slice.
pub fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = quantile * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Summarises samples into `<prefix>_p50 .. <prefix>_avg` entries.
pub fn summarize(prefix: &str, samples: &[f64], out: &mut Map<String, Value>) {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let avg = if sorted.is_empty() {
        f64::NAN
    } else {
        sorted.iter().sum::<f64>() / sorted.len() as f64
    };
    let values = [
        percentile(&sorted, 0.50),
        percentile(&sorted, 0.90),
        percentile(&sorted, 0.95),
        percentile(&sorted, 0.99),
        avg,
    ];
    for (suffix, value) in SUMMARY_SUFFIXES.iter().zip(values) {
        // NaN is not representable in JSON; store null so the cell renders blank.
        let value = if value.is_finite() { json!(value) } else { Value::Null };
        out.insert(format!("{prefix}_{suffix}"), value);
    }
}

/// Converts per-run milliseconds into a rate given the work per run.
pub fn rates(work_per_run: f64, times_ms: &[f64], scale: f64) -> Vec<f64> {
    times_ms
        .iter()
        .map(|ms| {
            let seconds = ms / 1e3;
            if seconds > 0.0 {
                work_per_run / seconds / scale
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.5), 2.5);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 4.0);
    }

    #[test]
    fn summarize_emits_all_suffixes() {
        let mut out = Map::new();
        summarize("bandwidth_gbyte_s", &[2.0, 4.0], &mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(out["bandwidth_gbyte_s_avg"], json!(3.0));
        assert_eq!(out["bandwidth_gbyte_s_p50"], json!(3.0));
    }

    #[test]
    fn zero_duration_runs_do_not_poison_summary() {
        let mut out = Map::new();
        summarize("x", &rates(10.0, &[0.0, 1000.0], 1.0), &mut out);
        assert_eq!(out["x_avg"], json!(10.0));
    }

    #[test]
    fn empty_samples_render_null() {
        let mut out = Map::new();
        summarize("x", &[], &mut out);
        assert_eq!(out["x_p99"], Value::Null);
    }
}
