use std::path::Path;

use serde_json::Value;
use ub_core::{ErrorInfo, ParameterSet, UbError};
use ub_kern::DType;

/// Prefix marking a parameter that copies another parameter's value.
pub const SAME_AS_PREFIX: &str = "SAME_AS_";

fn reference(value: &Value) -> Option<&str> {
    value.as_str().and_then(|raw| raw.strip_prefix(SAME_AS_PREFIX))
}

/// Resolves every `SAME_AS_<key>` value from the same parameter set.
///
/// Chains are followed to their first concrete value, so applying the
/// substitution to an already resolved set changes nothing.
pub fn resolve_same_as(params: &mut ParameterSet) -> Result<(), UbError> {
    let mut resolved = Vec::new();
    for (name, value) in params.iter() {
        let Some(mut target) = reference(value) else {
            continue;
        };
        let mut visited = vec![name.as_str()];
        let concrete = loop {
            if visited.contains(&target) {
                return Err(UbError::Config(
                    ErrorInfo::new("ub_exp.same_as_cycle", "SAME_AS_ references form a cycle")
                        .with_context("field", name.clone())
                        .with_context("target", target),
                ));
            }
            let next = params.get(target).ok_or_else(|| {
                UbError::Config(
                    ErrorInfo::new(
                        "ub_exp.same_as_unresolved",
                        format!("parameter {target} not found for SAME_AS_ reference"),
                    )
                    .with_context("field", name.clone())
                    .with_context("target", target),
                )
            })?;
            visited.push(target);
            match reference(next) {
                Some(further) => target = further,
                None => break next.clone(),
            }
        };
        resolved.push((name.clone(), concrete));
    }
    for (name, value) in resolved {
        params.insert(name, value);
    }
    Ok(())
}

/// Prepares a parameter set for dispatch.
///
/// Resolves `SAME_AS_` references, validates `dtype` and injects `trace_dir`.
pub fn preprocess(
    mut params: ParameterSet,
    trace_dir: Option<&Path>,
) -> Result<ParameterSet, UbError> {
    resolve_same_as(&mut params)?;
    match params.get("dtype") {
        None => {}
        Some(Value::String(raw)) => {
            raw.parse::<DType>()?;
        }
        Some(other) => {
            return Err(UbError::Config(
                ErrorInfo::new("ub_exp.dtype_type", format!("dtype must be a string, got {other}"))
                    .with_context("field", "dtype"),
            ))
        }
    }
    if let Some(dir) = trace_dir {
        params.insert("trace_dir", Value::String(dir.display().to_string()));
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> ParameterSet {
        match value {
            Value::Object(map) => ParameterSet::from(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn same_as_copies_the_referenced_value() {
        let mut params = set(json!({"m": 512, "n": "SAME_AS_m"}));
        resolve_same_as(&mut params).expect("resolve");
        assert_eq!(params.get("n"), Some(&json!(512)));
    }

    #[test]
    fn chains_resolve_regardless_of_declaration_order() {
        let mut params = set(json!({"a": "SAME_AS_b", "b": "SAME_AS_c", "c": 7}));
        resolve_same_as(&mut params).expect("resolve");
        assert_eq!(params.get("a"), Some(&json!(7)));
        assert_eq!(params.get("b"), Some(&json!(7)));
    }

    #[test]
    fn unresolved_reference_is_a_config_error() {
        let mut params = set(json!({"n": "SAME_AS_k"}));
        let err = resolve_same_as(&mut params).expect_err("missing");
        assert_eq!(err.info().code, "ub_exp.same_as_unresolved");
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("n"));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut params = set(json!({"n": "SAME_AS_n"}));
        let err = resolve_same_as(&mut params).expect_err("cycle");
        assert_eq!(err.info().code, "ub_exp.same_as_cycle");
    }

    #[test]
    fn preprocess_injects_trace_dir_and_checks_dtype() {
        let params = preprocess(
            set(json!({"dtype": "bfloat16", "size": 4})),
            Some(Path::new("/tmp/traces")),
        )
        .expect("preprocess");
        assert_eq!(params.get_str("trace_dir"), Some("/tmp/traces"));
        assert!(preprocess(set(json!({"dtype": "float8"})), None).is_err());
    }
}
