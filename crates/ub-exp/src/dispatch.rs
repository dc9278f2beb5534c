use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use ub_core::{
    Benchmark, ErrorInfo, Metadata, Metrics, MetricsCalculator, ParameterSet, RawResult, UbError,
};
use ub_kern::BuiltinBenchmark;

/// Registered capability pair; the calculator may be absent until validation.
#[derive(Clone)]
struct Registration {
    benchmark: Arc<dyn Benchmark>,
    calculator: Option<Arc<dyn MetricsCalculator>>,
}

/// Resolved capability pair ready for invocation.
#[derive(Clone, Copy)]
pub struct Capability<'a> {
    pub name: &'a str,
    pub benchmark: &'a dyn Benchmark,
    pub calculator: &'a dyn MetricsCalculator,
}

/// Static name to capability registry, validated before any invocation.
#[derive(Clone, Default)]
pub struct BenchmarkRegistry {
    entries: BTreeMap<String, Registration>,
}

impl BenchmarkRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every [`BuiltinBenchmark`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in BuiltinBenchmark::ALL {
            let shared = Arc::new(kind);
            registry.register(
                kind.as_str(),
                shared.clone(),
                Some(shared as Arc<dyn MetricsCalculator>),
            );
        }
        registry
    }

    /// Registers (or replaces) a capability under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        benchmark: Arc<dyn Benchmark>,
        calculator: Option<Arc<dyn MetricsCalculator>>,
    ) {
        self.entries.insert(
            name.into(),
            Registration {
                benchmark,
                calculator,
            },
        );
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolves a name to its capability pair.
    pub fn resolve(&self, name: &str) -> Result<Capability<'_>, UbError> {
        let (key, entry) = self.entries.get_key_value(name).ok_or_else(|| {
            UbError::Config(
                ErrorInfo::new(
                    "ub_exp.unknown_benchmark",
                    format!("benchmark {name} is not registered"),
                )
                .with_context("benchmark", name)
                .with_hint(format!(
                    "known benchmarks: {}",
                    self.names().collect::<Vec<_>>().join(", ")
                )),
            )
        })?;
        let calculator = entry.calculator.as_deref().ok_or_else(|| {
            UbError::Config(
                ErrorInfo::new(
                    "ub_exp.missing_metrics",
                    format!("metrics calculator for {name} not found"),
                )
                .with_context("benchmark", name),
            )
        })?;
        Ok(Capability {
            name: key.as_str(),
            benchmark: entry.benchmark.as_ref(),
            calculator,
        })
    }

    /// Fails on the first name that does not resolve to a complete pair.
    pub fn validate<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), UbError> {
        for name in names {
            self.resolve(name)?;
        }
        Ok(())
    }
}

/// Keeps only the merged entries `compute_metrics` accepts.
///
/// Parameters are merged first and raw results second, so a raw field shadows
/// a parameter of the same name.
pub fn filter_args(params: &ParameterSet, raw: &RawResult, accepted: &[&str]) -> ParameterSet {
    let mut args = ParameterSet::new();
    for (key, value) in params.iter().chain(raw.iter()) {
        if accepted.contains(&key.as_str()) {
            args.insert(key.clone(), value.clone());
        }
    }
    args
}

/// Output of one dispatched invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub metadata: Metadata,
    pub metrics: Metrics,
    pub start_time: String,
    pub end_time: String,
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Runs the benchmark body then its metrics calculator on filtered arguments.
pub fn invoke(capability: Capability<'_>, params: &ParameterSet) -> Result<Invocation, UbError> {
    let start_time = timestamp();
    let raw = capability
        .benchmark
        .run(params)
        .map_err(|err| err.with_context("benchmark", capability.name))?;
    let end_time = timestamp();
    let args = filter_args(params, &raw, capability.calculator.accepted_args());
    let (metadata, metrics) = capability
        .calculator
        .compute_metrics(&args)
        .map_err(|err| err.with_context("benchmark", capability.name))?;
    Ok(Invocation {
        metadata,
        metrics,
        start_time,
        end_time,
    })
}
