use serde::{Deserialize, Serialize};
use serde_json::Value;
use ub_core::FieldMap;

use crate::axis::{Axis, AxisValue};

/// One pivot cell; `Blank` marks a combination no record produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Blank,
    Number(f64),
    Text(String),
}

impl Cell {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Blank,
            Value::Number(number) => number.as_f64().map_or(Cell::Blank, Cell::Number),
            Value::String(text) => Cell::Text(text.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }
}

/// A record resolved to its position on both axes.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub row: usize,
    pub column: usize,
    pub fields: &'a FieldMap,
}

/// Fully materialized metric grid: dimension values by device counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub metric: String,
    pub rows: Axis,
    pub columns: Axis,
    /// Row-major cells, `rows.len()` by `columns.len()`.
    pub cells: Vec<Vec<Cell>>,
    /// Records that overwrote an already filled cell.
    pub collisions: usize,
}

impl PivotTable {
    /// Looks a cell up by its axis labels.
    pub fn get(&self, row: &AxisValue, column: &AxisValue) -> Option<&Cell> {
        let row = self.rows.position(row)?;
        let column = self.columns.position(column)?;
        self.cells.get(row).and_then(|cells| cells.get(column))
    }

    /// Number of cells holding a value.
    pub fn filled(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_blank())
            .count()
    }
}

/// Builds the grid for `metric`, or `None` when no record carries it.
///
/// Placements are applied in order; a later record landing on a filled cell
/// replaces it and is counted as a collision.
pub fn build_pivot(
    benchmark: &str,
    metric: &str,
    rows: &Axis,
    columns: &Axis,
    placements: &[Placement<'_>],
) -> Option<PivotTable> {
    if !placements
        .iter()
        .any(|placement| placement.fields.get(metric).is_some_and(|value| !value.is_null()))
    {
        return None;
    }
    let mut cells = vec![vec![Cell::Blank; columns.len()]; rows.len()];
    let mut collisions = 0;
    for placement in placements {
        let Some(value) = placement.fields.get(metric) else {
            continue;
        };
        let cell = Cell::from_value(value);
        if cell.is_blank() {
            continue;
        }
        let slot = &mut cells[placement.row][placement.column];
        if !slot.is_blank() {
            collisions += 1;
            tracing::warn!(
                benchmark,
                metric,
                row = %rows.values[placement.row],
                column = %columns.values[placement.column],
                "duplicate pivot cell, keeping the later record"
            );
        }
        *slot = cell;
    }
    Some(PivotTable {
        metric: metric.to_string(),
        rows: rows.clone(),
        columns: columns.clone(),
        cells,
        collisions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn axis(values: &[f64]) -> Axis {
        Axis::from_observed(values.iter().copied().map(AxisValue::Number))
    }

    #[test]
    fn missing_combinations_stay_blank() {
        let rows = axis(&[1.0, 2.0]);
        let columns = axis(&[4.0, 8.0]);
        let a = fields(json!({"bw": 1.5}));
        let b = fields(json!({"bw": 3.0}));
        let placements = [
            Placement { row: 0, column: 0, fields: &a },
            Placement { row: 1, column: 1, fields: &b },
        ];
        let table = build_pivot("copy", "bw", &rows, &columns, &placements).expect("table");
        assert_eq!(table.cells[0], vec![Cell::Number(1.5), Cell::Blank]);
        assert_eq!(table.cells[1], vec![Cell::Blank, Cell::Number(3.0)]);
        assert_eq!(table.filled(), 2);
        assert_eq!(table.collisions, 0);
    }

    #[test]
    fn later_records_win_collisions_and_are_counted() {
        let rows = axis(&[1.0]);
        let columns = axis(&[4.0]);
        let first = fields(json!({"bw": 1.0}));
        let second = fields(json!({"bw": 2.0}));
        let placements = [
            Placement { row: 0, column: 0, fields: &first },
            Placement { row: 0, column: 0, fields: &second },
        ];
        let table = build_pivot("copy", "bw", &rows, &columns, &placements).expect("table");
        assert_eq!(table.cells[0][0], Cell::Number(2.0));
        assert_eq!(table.collisions, 1);
    }

    #[test]
    fn absent_metric_produces_no_table() {
        let rows = axis(&[1.0]);
        let columns = axis(&[4.0]);
        let only = fields(json!({"time_ms_avg": 1.0, "bw": null}));
        let placements = [Placement { row: 0, column: 0, fields: &only }];
        assert!(build_pivot("copy", "bw", &rows, &columns, &placements).is_none());
    }

    #[test]
    fn blank_cells_serialize_as_null() {
        let json = serde_json::to_value(vec![Cell::Blank, Cell::Number(2.0)]).expect("json");
        assert_eq!(json, json!([null, 2.0]));
    }
}
