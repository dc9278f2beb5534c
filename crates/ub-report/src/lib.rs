//! Turns ubench record logs into multi-sheet pivot reports.
//!
//! Records are grouped per benchmark, a row-axis column is inferred for each
//! group and every tracked metric becomes one fully materialized block of
//! dimension values by device counts.

mod axis;
mod dimension;
mod load;
mod options;
mod pivot;
mod report;
mod sheet;
mod xlsx;

use std::fs;
use std::path::{Path, PathBuf};

use ub_core::serde::to_canonical_json_bytes;
use ub_core::UbError;

pub use axis::{distinct_count, Axis, AxisOrder, AxisValue};
pub use dimension::infer_dimension;
pub use load::{load_records, name_from_file, parse_line, BenchmarkRecords, LoadStats, ParsedLine, RecordLog};
pub use options::{device_count_from_type, ReportOptions, DEFAULT_PREFERRED_KEYS, DEFAULT_TRACKED_METRICS};
pub use pivot::{build_pivot, Cell, Placement, PivotTable};
pub use report::{build_report, BenchmarkSheet, PivotReport, SkippedSheet};
pub use sheet::{sanitize_sheet_name, SheetNamer, MAX_SHEET_NAME};
pub use xlsx::write_workbook;

/// Files produced by [`generate_report`].
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub workbook: PathBuf,
    pub json: PathBuf,
    pub report: PivotReport,
}

/// Writes the canonical JSON form of a report.
pub fn write_report_json(report: &PivotReport, path: &Path) -> Result<(), UbError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| UbError::io("ub_report.create_dir", parent.display(), err))?;
    }
    let bytes = to_canonical_json_bytes(report)?;
    fs::write(path, bytes).map_err(|err| UbError::io("ub_report.write_json", path.display(), err))
}

/// Loads `input`, builds the report and writes the workbook plus its JSON twin.
///
/// The JSON file sits next to the workbook with a `.json` extension and is
/// written even when no sheet could be built.
pub fn generate_report(
    input: &Path,
    workbook: &Path,
    opts: &ReportOptions,
) -> Result<ReportArtifacts, UbError> {
    let log = load_records(input)?;
    let report = build_report(&log, opts);
    let json = workbook.with_extension("json");
    write_report_json(&report, &json)?;
    write_workbook(&report, workbook)?;
    Ok(ReportArtifacts {
        workbook: workbook.to_path_buf(),
        json,
        report,
    })
}
