use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ub_core::{ErrorInfo, RunProvenance, UbError};

use crate::axis::{Axis, AxisValue};
use crate::dimension::infer_dimension;
use crate::load::{BenchmarkRecords, LoadStats, RecordLog};
use crate::options::ReportOptions;
use crate::pivot::{build_pivot, Placement, PivotTable};
use crate::sheet::SheetNamer;

/// One sheet: adjacent pivot blocks for a single benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSheet {
    pub benchmark_name: String,
    pub sheet_name: String,
    pub dimension: String,
    pub device_label: String,
    pub tables: Vec<PivotTable>,
    /// Records dropped for lacking a dimension value or device count.
    pub unplaced: usize,
}

impl BenchmarkSheet {
    /// Header label of the row axis, e.g. `size\devices`.
    pub fn axis_label(&self) -> String {
        format!("{}\\{}", self.dimension, self.device_label)
    }

    pub fn table(&self, metric: &str) -> Option<&PivotTable> {
        self.tables.iter().find(|table| table.metric == metric)
    }
}

/// A benchmark that produced no sheet, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSheet {
    pub benchmark_name: String,
    pub reason: UbError,
}

/// The assembled multi-sheet report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotReport {
    pub sheets: Vec<BenchmarkSheet>,
    pub skipped: Vec<SkippedSheet>,
    pub stats: LoadStats,
    pub options: ReportOptions,
    pub provenance: RunProvenance,
}

impl PivotReport {
    pub fn sheet(&self, benchmark: &str) -> Option<&BenchmarkSheet> {
        self.sheets.iter().find(|sheet| sheet.benchmark_name == benchmark)
    }

    /// Total collisions across every table.
    pub fn collisions(&self) -> usize {
        self.sheets
            .iter()
            .flat_map(|sheet| &sheet.tables)
            .map(|table| table.collisions)
            .sum()
    }
}

/// Builds every sheet of the report from a loaded record log.
///
/// Failures are scoped to one benchmark: its sheet is listed as skipped and
/// the remaining sheets are still produced.
pub fn build_report(log: &RecordLog, opts: &ReportOptions) -> PivotReport {
    let mut namer = SheetNamer::new();
    let mut sheets = Vec::new();
    let mut skipped = Vec::new();
    for group in &log.benchmarks {
        match build_sheet(group, opts) {
            Ok(mut sheet) => {
                sheet.sheet_name = namer.assign(&group.benchmark_name);
                tracing::info!(
                    benchmark = %group.benchmark_name,
                    sheet = %sheet.sheet_name,
                    dimension = %sheet.dimension,
                    tables = sheet.tables.len(),
                    "built sheet"
                );
                sheets.push(sheet);
            }
            Err(reason) => {
                tracing::warn!(benchmark = %group.benchmark_name, error = %reason, "skipping sheet");
                skipped.push(SkippedSheet {
                    benchmark_name: group.benchmark_name.clone(),
                    reason,
                });
            }
        }
    }
    PivotReport {
        sheets,
        skipped,
        stats: log.stats.clone(),
        options: opts.clone(),
        provenance: RunProvenance::new(
            log.input_hash.clone(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        ),
    }
}

fn build_sheet(group: &BenchmarkRecords, opts: &ReportOptions) -> Result<BenchmarkSheet, UbError> {
    let scoped = |err: UbError| err.with_context("benchmark", group.benchmark_name.clone());
    let mut excluded: BTreeSet<String> = group.metric_keys.clone();
    excluded.extend(opts.tracked_metrics.iter().cloned());
    excluded.insert(opts.device_field.clone());
    excluded.insert("benchmark_name".to_string());
    let dimension =
        infer_dimension(&group.rows, &opts.preferred_keys, &excluded).map_err(scoped)?;

    let fallback = opts.fallback_devices.map(|count| AxisValue::Number(count as f64));
    let labelled: Vec<_> = group
        .rows
        .iter()
        .map(|row| {
            let dim = row.get(&dimension).and_then(AxisValue::from_value);
            let devices = row
                .get(&opts.device_field)
                .and_then(AxisValue::from_value)
                .or_else(|| fallback.clone());
            (dim, devices, row)
        })
        .collect();
    let rows = Axis::from_observed(labelled.iter().filter_map(|(dim, _, _)| dim.clone()));
    let columns = Axis::from_observed(labelled.iter().filter_map(|(_, dev, _)| dev.clone()));

    let mut placements = Vec::with_capacity(labelled.len());
    let mut unplaced = 0;
    for (index, (dim, devices, fields)) in labelled.iter().enumerate() {
        let row = dim.as_ref().and_then(|value| rows.position(value));
        let column = devices.as_ref().and_then(|value| columns.position(value));
        match (row, column) {
            (Some(row), Some(column)) => placements.push(Placement {
                row,
                column,
                fields: *fields,
            }),
            _ => {
                unplaced += 1;
                tracing::warn!(
                    benchmark = %group.benchmark_name,
                    record = index,
                    field = if row.is_none() { dimension.as_str() } else { opts.device_field.as_str() },
                    "record has no position on the pivot axes"
                );
            }
        }
    }

    let tables: Vec<PivotTable> = opts
        .tracked_metrics
        .iter()
        .filter_map(|metric| {
            let table = build_pivot(&group.benchmark_name, metric, &rows, &columns, &placements);
            if table.is_none() {
                tracing::debug!(benchmark = %group.benchmark_name, metric = %metric, "metric absent");
            }
            table
        })
        .collect();
    if tables.is_empty() {
        return Err(scoped(UbError::Report(
            ErrorInfo::new(
                "ub_report.no_metrics",
                "no tracked metric could be placed for this benchmark",
            )
            .with_context("metrics", opts.tracked_metrics.join(",")),
        )));
    }
    Ok(BenchmarkSheet {
        benchmark_name: group.benchmark_name.clone(),
        sheet_name: String::new(),
        dimension,
        device_label: opts.device_label.clone(),
        tables,
        unplaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn group(name: &str, rows: Vec<Value>) -> BenchmarkRecords {
        BenchmarkRecords {
            benchmark_name: name.to_string(),
            rows: rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(map) => map,
                    _ => unreachable!(),
                })
                .collect(),
            metric_keys: ["bandwidth_gbyte_s_avg".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn fallback_device_count_fills_missing_field() {
        let log = RecordLog {
            benchmarks: vec![group(
                "copy",
                vec![
                    json!({"size": 1, "bandwidth_gbyte_s_avg": 1.0}),
                    json!({"size": 2, "bandwidth_gbyte_s_avg": 2.0}),
                ],
            )],
            ..RecordLog::default()
        };
        let opts = ReportOptions::default().with_device_type("v5p-128").expect("device type");
        let report = build_report(&log, &opts);
        let sheet = report.sheet("copy").expect("sheet");
        let table = sheet.table("bandwidth_gbyte_s_avg").expect("table");
        assert_eq!(table.columns.values, vec![AxisValue::Number(128.0)]);
        assert_eq!(sheet.unplaced, 0);
        assert_eq!(sheet.axis_label(), "size\\devices");
    }

    #[test]
    fn records_without_device_count_are_unplaced() {
        let log = RecordLog {
            benchmarks: vec![group(
                "copy",
                vec![
                    json!({"size": 1, "num_devices": 4, "bandwidth_gbyte_s_avg": 1.0}),
                    json!({"size": 2, "bandwidth_gbyte_s_avg": 2.0}),
                ],
            )],
            ..RecordLog::default()
        };
        let report = build_report(&log, &ReportOptions::default());
        let sheet = report.sheet("copy").expect("sheet");
        assert_eq!(sheet.unplaced, 1);
        let table = sheet.table("bandwidth_gbyte_s_avg").expect("table");
        assert_eq!(table.rows.len(), 2);
        assert!(table.cells[1][0].is_blank());
    }

    #[test]
    fn untracked_benchmarks_are_skipped_not_fatal() {
        let log = RecordLog {
            benchmarks: vec![
                group("flat", vec![json!({"size": 1, "num_devices": 1, "bandwidth_gbyte_s_avg": 1.0})]),
                group("other", vec![
                    json!({"size": 1, "num_devices": 1, "tflops_avg": 1.0}),
                    json!({"size": 2, "num_devices": 1, "tflops_avg": 1.5}),
                ]),
            ],
            ..RecordLog::default()
        };
        let report = build_report(&log, &ReportOptions::default());
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.skipped[0].benchmark_name, "other");
        assert_eq!(report.skipped[0].reason.info().code, "ub_report.no_metrics");
    }
}
