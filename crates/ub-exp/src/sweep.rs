use serde_json::{json, Map, Value};
use ub_core::{ErrorInfo, ParameterSet, UbError};

use crate::config::{BenchmarkConfig, SweepSpec};

/// Upper bound on the values a single range may generate.
pub const MAX_RANGE_VALUES: usize = 1 << 20;

const RANGE_SUFFIX: &str = "_range";

fn sweep_error(code: &str, field: &str, message: impl Into<String>) -> UbError {
    UbError::Config(ErrorInfo::new(code, message).with_context("field", field))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn parse(value: &Value) -> Option<Self> {
        value
            .as_i64()
            .map(Num::Int)
            .or_else(|| value.as_f64().map(Num::Float))
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    /// Largest integer not above the value; saturates at the i64 bounds.
    fn floor_i64(self) -> i64 {
        match self {
            Num::Int(v) => v,
            Num::Float(v) => v.floor() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Multiply(Num),
    Add(Num),
}

/// Parsed `{start, end, multiplier | increase_by}` range object.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RangeSpec {
    start: Num,
    end: Num,
    step: Step,
}

impl RangeSpec {
    fn parse(field: &str, map: &Map<String, Value>) -> Result<Self, UbError> {
        if let Some(unknown) = map
            .keys()
            .find(|key| !matches!(key.as_str(), "start" | "end" | "multiplier" | "increase_by"))
        {
            return Err(sweep_error(
                "ub_exp.range_unknown_key",
                field,
                format!("unrecognised range option `{unknown}`"),
            ));
        }
        let number = |key: &str| -> Result<Option<Num>, UbError> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => Num::parse(value).map(Some).ok_or_else(|| {
                    sweep_error(
                        "ub_exp.range_not_numeric",
                        field,
                        format!("range option `{key}` must be a number"),
                    )
                }),
            }
        };
        let start = number("start")?
            .ok_or_else(|| sweep_error("ub_exp.range_bounds", field, "range requires `start`"))?;
        let end = number("end")?
            .ok_or_else(|| sweep_error("ub_exp.range_bounds", field, "range requires `end`"))?;
        let step = match (number("multiplier")?, number("increase_by")?) {
            (Some(factor), None) => Step::Multiply(factor),
            (None, Some(delta)) => Step::Add(delta),
            (Some(_), Some(_)) | (None, None) => {
                return Err(UbError::Config(
                    ErrorInfo::new(
                        "ub_exp.range_step",
                        "range must set exactly one of `multiplier` or `increase_by`",
                    )
                    .with_context("field", field),
                ))
            }
        };
        Ok(Self { start, end, step })
    }

    fn generate(&self, field: &str) -> Result<Vec<Value>, UbError> {
        // integer start and step keep the series integral whatever `end` is
        let values = match (self.start, self.step) {
            (Num::Int(start), Step::Multiply(Num::Int(factor))) => {
                if factor < 2 || start < 1 {
                    return Err(non_terminating(field));
                }
                int_series(field, start, self.end.floor_i64(), |v| v.checked_mul(factor))?
            }
            (Num::Int(start), Step::Add(Num::Int(delta))) => {
                if delta < 1 {
                    return Err(non_terminating(field));
                }
                int_series(field, start, self.end.floor_i64(), |v| v.checked_add(delta))?
            }
            (start, step) => {
                let (start, end) = (start.as_f64(), self.end.as_f64());
                let advance: Box<dyn Fn(f64) -> f64> = match step {
                    Step::Multiply(factor) => {
                        let factor = factor.as_f64();
                        if factor <= 1.0 || start <= 0.0 {
                            return Err(non_terminating(field));
                        }
                        Box::new(move |v| v * factor)
                    }
                    Step::Add(delta) => {
                        let delta = delta.as_f64();
                        if delta <= 0.0 {
                            return Err(non_terminating(field));
                        }
                        Box::new(move |v| v + delta)
                    }
                };
                float_series(field, start, end, advance)?
            }
        };
        if values.is_empty() {
            return Err(UbError::Config(
                ErrorInfo::new("ub_exp.empty_range", "range produces no values (start > end)")
                    .with_context("field", field),
            ));
        }
        Ok(values)
    }
}

fn non_terminating(field: &str) -> UbError {
    UbError::Config(
        ErrorInfo::new("ub_exp.range_step", "range step does not strictly increase the value")
            .with_context("field", field)
            .with_hint("use multiplier > 1 with a positive start, or increase_by > 0"),
    )
}

fn too_long(field: &str) -> UbError {
    sweep_error(
        "ub_exp.range_too_long",
        field,
        format!("range generates more than {MAX_RANGE_VALUES} values"),
    )
}

fn int_series(
    field: &str,
    start: i64,
    end: i64,
    advance: impl Fn(i64) -> Option<i64>,
) -> Result<Vec<Value>, UbError> {
    let mut values = Vec::new();
    let mut current = Some(start);
    while let Some(value) = current.filter(|v| *v <= end) {
        if values.len() == MAX_RANGE_VALUES {
            return Err(too_long(field));
        }
        values.push(json!(value));
        current = advance(value);
    }
    Ok(values)
}

fn float_series(
    field: &str,
    start: f64,
    end: f64,
    advance: impl Fn(f64) -> f64,
) -> Result<Vec<Value>, UbError> {
    let mut values = Vec::new();
    let mut current = start;
    while current <= end {
        if values.len() == MAX_RANGE_VALUES {
            return Err(too_long(field));
        }
        values.push(json!(current));
        let next = advance(current);
        if next <= current {
            return Err(non_terminating(field));
        }
        current = next;
    }
    Ok(values)
}

/// Values one sweep key contributes to the Cartesian product.
fn axis_values(field: &str, value: &Value) -> Result<Vec<Value>, UbError> {
    match value {
        Value::Object(map) => RangeSpec::parse(field, map)?.generate(field),
        Value::Array(values) if values.is_empty() => Err(sweep_error(
            "ub_exp.empty_list",
            field,
            "explicit value list is empty",
        )),
        Value::Array(values) => Ok(values.clone()),
        scalar => Ok(vec![scalar.clone()]),
    }
}

/// Expands a single sweep declaration into the Cartesian product of its axes.
///
/// Axes are combined in declared key order with the last axis varying fastest.
pub fn expand_sweep(spec: &SweepSpec) -> Result<Vec<ParameterSet>, UbError> {
    let mut axes: Vec<(String, Vec<Value>)> = Vec::with_capacity(spec.len());
    for (key, value) in spec {
        let name = key
            .strip_suffix(RANGE_SUFFIX)
            .filter(|stripped| !stripped.is_empty())
            .unwrap_or(key);
        if axes.iter().any(|(existing, _)| existing == name) {
            return Err(sweep_error(
                "ub_exp.duplicate_parameter",
                name,
                format!("parameter `{name}` is declared more than once"),
            ));
        }
        axes.push((name.to_string(), axis_values(name, value)?));
    }
    let mut outputs = Vec::new();
    expand_grid(&axes, 0, ParameterSet::new(), &mut outputs);
    Ok(outputs)
}

fn expand_grid(
    axes: &[(String, Vec<Value>)],
    idx: usize,
    current: ParameterSet,
    outputs: &mut Vec<ParameterSet>,
) {
    if idx == axes.len() {
        outputs.push(current);
        return;
    }
    let (name, values) = &axes[idx];
    for value in values {
        let mut next = current.clone();
        next.insert(name.clone(), value.clone());
        expand_grid(axes, idx + 1, next, outputs);
    }
}

/// All parameter sets for one benchmark: explicit sets first, then every sweep.
pub fn expand_benchmark(config: &BenchmarkConfig) -> Result<Vec<ParameterSet>, UbError> {
    let mut params = config.benchmark_params.clone();
    for (index, spec) in config.benchmark_sweep_params.iter().enumerate() {
        let expanded = expand_sweep(spec).map_err(|err| {
            err.with_context("benchmark", config.benchmark_name.clone())
                .with_context("sweep", index.to_string())
        })?;
        params.extend(expanded);
    }
    Ok(params)
}
