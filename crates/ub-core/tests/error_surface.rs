use ub_core::errors::{ErrorInfo, UbError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("benchmark", "memory_copy")
        .with_context("line", "3")
}

#[test]
fn config_error_surface() {
    let err = UbError::Config(sample_info("ub_exp.unknown_benchmark", "not registered"));
    assert_eq!(err.info().code, "ub_exp.unknown_benchmark");
    assert!(err.info().context.contains_key("benchmark"));
    assert!(err.is_fatal());
}

#[test]
fn data_error_is_recoverable() {
    let err = UbError::Data(sample_info("ub_report.bad_line", "expected value"));
    assert_eq!(err.info().context.get("line").map(String::as_str), Some("3"));
    assert!(!err.is_fatal());
}

#[test]
fn display_includes_context_and_hint() {
    let err = UbError::config("ub_exp.range_step", "range needs one stepping mode")
        .with_context("field", "size");
    let err = match err {
        UbError::Config(info) => UbError::Config(info.with_hint("set multiplier or increase_by")),
        other => other,
    };
    let rendered = err.to_string();
    assert!(rendered.starts_with("configuration error: range needs one stepping mode"));
    assert!(rendered.contains("field=size"));
    assert!(rendered.contains("hint: set multiplier or increase_by"));
}

#[test]
fn errors_roundtrip_through_json() {
    let err = UbError::Report(sample_info("ub_report.no_dimension", "no varying column"));
    let bytes = serde_json::to_vec(&err).expect("encode");
    let decoded: UbError = serde_json::from_slice(&bytes).expect("decode");
    assert_eq!(decoded, err);
}
