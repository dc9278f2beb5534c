use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single label on a pivot axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

impl AxisValue {
    /// Reads a stored field; nulls and absent fields have no axis position.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => number.as_f64().map(AxisValue::Number),
            Value::String(text) => Some(AxisValue::Text(text.clone())),
            other => Some(AxisValue::Text(other.to_string())),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            AxisValue::Number(value) => Some(*value),
            AxisValue::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    fn to_text(&self) -> AxisValue {
        match self {
            AxisValue::Text(_) => self.clone(),
            AxisValue::Number(_) => AxisValue::Text(self.to_string()),
        }
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AxisValue::Number(a), AxisValue::Number(b)) => a.total_cmp(b),
            (AxisValue::Text(a), AxisValue::Text(b)) => a.cmp(b),
            (AxisValue::Number(_), AxisValue::Text(_)) => Ordering::Less,
            (AxisValue::Text(_), AxisValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            AxisValue::Number(value) => write!(f, "{value}"),
            AxisValue::Text(text) => f.write_str(text),
        }
    }
}

/// Ordering applied to an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisOrder {
    Numeric,
    Lexical,
}

/// Sorted distinct labels of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub order: AxisOrder,
    pub values: Vec<AxisValue>,
}

impl Axis {
    /// Builds an axis from observed labels.
    ///
    /// Labels sort numerically when every one coerces to a number and as
    /// strings otherwise, so the result never depends on input order.
    pub fn from_observed<I>(observed: I) -> Self
    where
        I: IntoIterator<Item = AxisValue>,
    {
        let observed: Vec<AxisValue> = observed.into_iter().collect();
        let order = if observed.iter().all(|value| value.as_number().is_some()) {
            AxisOrder::Numeric
        } else {
            AxisOrder::Lexical
        };
        let mut values: Vec<AxisValue> = observed
            .iter()
            .filter_map(|value| normalize(order, value))
            .collect();
        values.sort_by(AxisValue::total_cmp);
        values.dedup();
        Self { order, values }
    }

    /// Position of a raw label on this axis.
    pub fn position(&self, value: &AxisValue) -> Option<usize> {
        let key = normalize(self.order, value)?;
        self.values
            .binary_search_by(|probe| probe.total_cmp(&key))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize(order: AxisOrder, value: &AxisValue) -> Option<AxisValue> {
    match order {
        AxisOrder::Numeric => value.as_number().map(AxisValue::Number),
        AxisOrder::Lexical => Some(value.to_text()),
    }
}

/// Number of distinct labels, compared the same way an axis would be.
pub fn distinct_count<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a Value>,
{
    Axis::from_observed(values.into_iter().filter_map(AxisValue::from_value)).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn axis(values: &[Value]) -> Axis {
        Axis::from_observed(values.iter().filter_map(AxisValue::from_value))
    }

    #[test]
    fn numbers_sort_numerically_and_merge_int_float_spellings() {
        let axis = axis(&[json!(512), json!(128.0), json!("256"), json!(128)]);
        assert_eq!(axis.order, AxisOrder::Numeric);
        assert_eq!(
            axis.values,
            vec![AxisValue::Number(128.0), AxisValue::Number(256.0), AxisValue::Number(512.0)]
        );
        assert_eq!(axis.position(&AxisValue::Text("512".into())), Some(2));
    }

    #[test]
    fn mixed_values_fall_back_to_string_order() {
        let axis = axis(&[json!(10), json!("b"), json!(9), json!("a")]);
        assert_eq!(axis.order, AxisOrder::Lexical);
        let labels: Vec<String> = axis.values.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["10", "9", "a", "b"]);
        assert_eq!(axis.position(&AxisValue::Number(9.0)), Some(1));
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(AxisValue::Number(256.0).to_string(), "256");
        assert_eq!(AxisValue::Number(0.5).to_string(), "0.5");
    }

    #[test]
    fn nulls_are_not_labels() {
        assert_eq!(distinct_count([&json!(null), &json!(1), &json!(1.0)]), 1);
    }
}
