use std::collections::BTreeSet;

use serde_json::Value;
use ub_core::{ErrorInfo, FieldMap, UbError};

use crate::axis::distinct_count;

fn column<'a>(rows: &'a [FieldMap], key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    rows.iter().filter_map(move |row| row.get(key))
}

fn present(rows: &[FieldMap], key: &str) -> bool {
    column(rows, key).any(|value| !value.is_null())
}

fn varies(rows: &[FieldMap], key: &str) -> bool {
    distinct_count(column(rows, key)) > 1
}

/// Picks the row-axis column for one benchmark's records.
///
/// Preferred keys win when they vary; a single-row set accepts the first
/// preferred key present; otherwise the first varying field in sorted key
/// order that is not in `excluded`. Fails when nothing qualifies.
pub fn infer_dimension(
    rows: &[FieldMap],
    preferred: &[String],
    excluded: &BTreeSet<String>,
) -> Result<String, UbError> {
    if let Some(key) = preferred.iter().find(|key| varies(rows, key)) {
        return Ok(key.clone());
    }
    if rows.len() == 1 {
        if let Some(key) = preferred.iter().find(|key| present(rows, key)) {
            return Ok(key.clone());
        }
    }
    let candidates: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .filter(|key| !excluded.contains(*key) && !preferred.iter().any(|p| p.as_str() == *key))
        .collect();
    candidates
        .into_iter()
        .find(|key| varies(rows, key))
        .map(str::to_string)
        .ok_or_else(|| {
            UbError::Report(
                ErrorInfo::new(
                    "ub_report.no_dimension",
                    "no field varies across the records of this benchmark",
                )
                .with_context("records", rows.len().to_string()),
            )
        })
}
