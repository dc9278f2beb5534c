use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use ub_core::{ErrorInfo, FieldMap, UbError};

use crate::recorder::ensure_parent;

const SUFFIX_LEN: usize = 10;

fn wrap_csv(path: &Path, err: impl ToString) -> UbError {
    UbError::io("ub_exp.csv_write", path.display(), err)
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|byte| (byte as char).to_ascii_uppercase())
        .take(SUFFIX_LEN)
        .collect()
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes one `t_<benchmark>_<suffix>.csv` file holding every flattened row.
///
/// The header is the union of row keys in first-seen order; absent fields are
/// written as empty cells.
pub fn write_results_csv(
    dir: &Path,
    benchmark: &str,
    rows: &[FieldMap],
) -> Result<PathBuf, UbError> {
    if rows.is_empty() {
        return Err(UbError::Data(
            ErrorInfo::new("ub_exp.csv_empty", "0 metrics results were collected")
                .with_context("benchmark", benchmark),
        ));
    }
    let path = dir.join(format!("t_{benchmark}_{}.csv", random_suffix()));
    ensure_parent(&path)?;
    let mut header: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }
    let mut writer = WriterBuilder::new()
        .from_path(&path)
        .map_err(|err| wrap_csv(&path, err))?;
    writer.write_record(&header).map_err(|err| wrap_csv(&path, err))?;
    for row in rows {
        let cells: Vec<String> = header.iter().map(|key| render(row.get(*key))).collect();
        writer.write_record(&cells).map_err(|err| wrap_csv(&path, err))?;
    }
    writer.flush().map_err(|err| wrap_csv(&path, err))?;
    tracing::info!(benchmark, path = %path.display(), rows = rows.len(), "metrics written to CSV");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_is_union_in_first_seen_order() {
        let dir = tempfile::tempdir().expect("tmp");
        let rows = vec![
            json!({"size": 1, "bw": 2.5}).as_object().cloned().expect("obj"),
            json!({"size": 2, "dtype": "int32"}).as_object().cloned().expect("obj"),
        ];
        let path = write_results_csv(dir.path(), "memory_copy", &rows).expect("csv");
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("t_memory_copy_") && name.ends_with(".csv"));
        assert_eq!(name.len(), "t_memory_copy_".len() + SUFFIX_LEN + ".csv".len());
        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "size,bw,dtype\n1,2.5,\n2,,int32\n");
    }

    #[test]
    fn empty_results_are_rejected() {
        let dir = tempfile::tempdir().expect("tmp");
        assert!(write_results_csv(dir.path(), "memory_copy", &[]).is_err());
    }
}
