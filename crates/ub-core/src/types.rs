use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered, string keyed map used for metadata, metrics and raw results.
pub type FieldMap = Map<String, Value>;

/// Metadata describing a single invocation (problem sizes, dtype, devices).
pub type Metadata = FieldMap;

/// Measured values produced by a metrics calculator.
pub type Metrics = FieldMap;

/// Opaque key-value output of a benchmark body.
pub type RawResult = FieldMap;

/// One concrete assignment of values to every parameter of an invocation.
///
/// Keys are unique by construction; insertion order is the declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(FieldMap);

impl ParameterSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts or replaces a parameter, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of parameters in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no parameters are assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over parameters in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Parameter names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Borrows the underlying ordered map.
    pub fn as_map(&self) -> &FieldMap {
        &self.0
    }

    /// Reads a non-negative integer parameter.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }

    /// Reads a string parameter.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

impl From<FieldMap> for ParameterSet {
    fn from(map: FieldMap) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalised result of one benchmark invocation, persisted as one log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Registered name of the benchmark that produced the record.
    pub benchmark_name: String,
    /// Invocation metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Invocation metrics.
    #[serde(default)]
    pub metrics: Metrics,
    /// RFC 3339 timestamp taken before the benchmark body ran.
    pub start_time: String,
    /// RFC 3339 timestamp taken after the benchmark body returned.
    pub end_time: String,
}

impl BenchmarkRecord {
    /// Flattens metadata and metrics into one map; metrics win on key clashes.
    pub fn flatten(&self) -> FieldMap {
        flatten_fields(&self.metadata, &self.metrics)
    }
}

/// Merges metadata then metrics into a single ordered map.
pub fn flatten_fields(metadata: &Metadata, metrics: &Metrics) -> FieldMap {
    let mut flat = metadata.clone();
    for (key, value) in metrics {
        flat.insert(key.clone(), value.clone());
    }
    flat
}
