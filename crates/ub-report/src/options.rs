use serde::{Deserialize, Serialize};
use ub_core::{ErrorInfo, UbError};

/// Percentile summaries of the bus bandwidth tracked by default.
pub const DEFAULT_TRACKED_METRICS: [&str; 5] = [
    "bandwidth_gbyte_s_p50",
    "bandwidth_gbyte_s_p90",
    "bandwidth_gbyte_s_p95",
    "bandwidth_gbyte_s_p99",
    "bandwidth_gbyte_s_avg",
];

/// Row-axis candidates, checked in order before any other field.
pub const DEFAULT_PREFERRED_KEYS: [&str; 8] = [
    "m",
    "n",
    "dim",
    "size",
    "buffer_size",
    "dimension",
    "num_elements",
    "matrix_dim",
];

/// Knobs controlling report synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// One pivot block per metric, in this order.
    pub tracked_metrics: Vec<String>,
    /// Preferred dimension columns in priority order.
    pub preferred_keys: Vec<String>,
    /// Record field holding the device count.
    pub device_field: String,
    /// Column-axis label rendered after the dimension name.
    pub device_label: String,
    /// Device count used for records lacking `device_field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_devices: Option<u64>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            tracked_metrics: DEFAULT_TRACKED_METRICS.iter().map(|m| m.to_string()).collect(),
            preferred_keys: DEFAULT_PREFERRED_KEYS.iter().map(|k| k.to_string()).collect(),
            device_field: "num_devices".to_string(),
            device_label: "devices".to_string(),
            fallback_devices: None,
        }
    }
}

impl ReportOptions {
    /// Sets the fallback device count from a device type such as `v5p-128`.
    pub fn with_device_type(mut self, device_type: &str) -> Result<Self, UbError> {
        let count = device_count_from_type(device_type).ok_or_else(|| {
            UbError::Config(
                ErrorInfo::new(
                    "ub_report.device_type",
                    format!("cannot read a device count from `{device_type}`"),
                )
                .with_hint("expected a trailing `-<count>` suffix, e.g. v5p-128"),
            )
        })?;
        self.fallback_devices = Some(count);
        Ok(self)
    }

    /// Replaces the tracked metric list when `metrics` is non-empty.
    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let metrics: Vec<String> = metrics.into_iter().map(Into::into).collect();
        if !metrics.is_empty() {
            self.tracked_metrics = metrics;
        }
        self
    }
}

/// Parses the trailing `-<digits>` of a device type.
pub fn device_count_from_type(device_type: &str) -> Option<u64> {
    let (_, digits) = device_type.trim().rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_count_comes_from_the_suffix() {
        assert_eq!(device_count_from_type("v5p-128"), Some(128));
        assert_eq!(device_count_from_type("v6e-8"), Some(8));
        assert_eq!(device_count_from_type("v5p"), None);
        assert_eq!(device_count_from_type("v5p-"), None);
        assert_eq!(device_count_from_type("v5p-x8"), None);
    }

    #[test]
    fn bad_device_type_is_a_config_error() {
        let err = ReportOptions::default()
            .with_device_type("cpu")
            .expect_err("no suffix");
        assert_eq!(err.info().code, "ub_report.device_type");
    }

    #[test]
    fn empty_metric_override_keeps_defaults() {
        let opts = ReportOptions::default().with_metrics(Vec::<String>::new());
        assert_eq!(opts.tracked_metrics.len(), DEFAULT_TRACKED_METRICS.len());
        let opts = opts.with_metrics(["time_ms_avg"]);
        assert_eq!(opts.tracked_metrics, vec!["time_ms_avg".to_string()]);
    }
}
