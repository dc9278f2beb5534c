use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use ub_core::{ErrorInfo, UbError};

use crate::axis::{AxisOrder, AxisValue};
use crate::pivot::{Cell, PivotTable};
use crate::report::{BenchmarkSheet, PivotReport};

const HEADER_ROWS: u32 = 2;
/// Empty columns between adjacent metric blocks.
const BLOCK_GAP: u16 = 1;
const MIN_WIDTH: usize = 8;

fn sheet_error(sheet: &str, err: XlsxError) -> UbError {
    UbError::Report(
        ErrorInfo::new("ub_report.xlsx", err.to_string()).with_context("sheet", sheet),
    )
}

fn column_index(sheet: &str, col: usize) -> Result<u16, UbError> {
    u16::try_from(col).map_err(|_| {
        UbError::Report(
            ErrorInfo::new("ub_report.too_wide", "sheet exceeds the column limit")
                .with_context("sheet", sheet)
                .with_context("column", col.to_string()),
        )
    })
}

fn row_index(sheet: &str, row: usize) -> Result<u32, UbError> {
    u32::try_from(row).map_err(|_| {
        UbError::Report(
            ErrorInfo::new("ub_report.too_long", "sheet exceeds the row limit")
                .with_context("sheet", sheet),
        )
    })
}

/// Tracks the widest rendered text per column.
#[derive(Default)]
struct Widths(BTreeMap<u16, usize>);

impl Widths {
    fn observe(&mut self, col: u16, text: &str) {
        let entry = self.0.entry(col).or_insert(MIN_WIDTH);
        *entry = (*entry).max(text.chars().count() + 2);
    }
}

fn write_label(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &AxisValue,
    order: AxisOrder,
    widths: &mut Widths,
) -> Result<(), XlsxError> {
    widths.observe(col, &value.to_string());
    match (value, order) {
        (AxisValue::Number(number), AxisOrder::Numeric) => {
            worksheet.write_number(row, col, *number)?;
        }
        _ => {
            worksheet.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}

fn write_block(
    worksheet: &mut Worksheet,
    sheet: &BenchmarkSheet,
    table: &PivotTable,
    first_col: u16,
    header: &Format,
    widths: &mut Widths,
) -> Result<(), UbError> {
    let name = sheet.sheet_name.as_str();
    let last_col = column_index(name, usize::from(first_col) + table.columns.len())?;
    let wrap = |err: XlsxError| sheet_error(name, err);

    worksheet
        .merge_range(0, first_col, 0, last_col, &table.metric, header)
        .map_err(wrap)?;
    let axis_label = sheet.axis_label();
    widths.observe(first_col, &axis_label);
    worksheet
        .write_string_with_format(1, first_col, axis_label, header)
        .map_err(wrap)?;
    for (offset, device) in table.columns.values.iter().enumerate() {
        let col = column_index(name, usize::from(first_col) + 1 + offset)?;
        write_label(worksheet, 1, col, device, table.columns.order, widths).map_err(wrap)?;
    }

    for (offset, (label, cells)) in table.rows.values.iter().zip(&table.cells).enumerate() {
        let row = HEADER_ROWS + row_index(name, offset)?;
        write_label(worksheet, row, first_col, label, table.rows.order, widths).map_err(wrap)?;
        for (index, cell) in cells.iter().enumerate() {
            let col = column_index(name, usize::from(first_col) + 1 + index)?;
            match cell {
                Cell::Blank => {}
                Cell::Number(value) => {
                    widths.observe(col, &value.to_string());
                    worksheet.write_number(row, col, *value).map_err(wrap)?;
                }
                Cell::Text(text) => {
                    widths.observe(col, text);
                    worksheet.write_string(row, col, text).map_err(wrap)?;
                }
            }
        }
    }
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &BenchmarkSheet,
    header: &Format,
) -> Result<(), UbError> {
    let name = sheet.sheet_name.as_str();
    worksheet.set_name(name).map_err(|err| sheet_error(name, err))?;
    let mut widths = Widths::default();
    let mut first_col = 0usize;
    for table in &sheet.tables {
        let col = column_index(name, first_col)?;
        write_block(worksheet, sheet, table, col, header, &mut widths)?;
        first_col += 1 + table.columns.len() + usize::from(BLOCK_GAP);
    }
    for (col, width) in widths.0 {
        worksheet
            .set_column_width(col, width as f64)
            .map_err(|err| sheet_error(name, err))?;
    }
    Ok(())
}

/// Writes one worksheet per built sheet, in report order.
pub fn write_workbook(report: &PivotReport, path: &Path) -> Result<(), UbError> {
    if report.sheets.is_empty() {
        return Err(UbError::Report(
            ErrorInfo::new("ub_report.no_sheets", "no benchmark produced a report sheet")
                .with_context("skipped", report.skipped.len().to_string()),
        ));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| UbError::io("ub_report.create_dir", parent.display(), err))?;
    }
    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    let mut workbook = Workbook::new();
    for sheet in &report.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &header)?;
    }
    workbook
        .save(path)
        .map_err(|err| UbError::io("ub_report.save", path.display(), err))?;
    tracing::info!(path = %path.display(), sheets = report.sheets.len(), "wrote workbook");
    Ok(())
}
