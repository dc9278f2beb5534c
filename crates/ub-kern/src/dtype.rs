use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ub_core::{ErrorInfo, UbError};

/// Element types accepted by the `dtype` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bfloat16,
    Float32,
    Int32,
}

impl DType {
    pub const ALL: [DType; 3] = [DType::Bfloat16, DType::Float32, DType::Int32];

    pub fn as_str(self) -> &'static str {
        match self {
            DType::Bfloat16 => "bfloat16",
            DType::Float32 => "float32",
            DType::Int32 => "int32",
        }
    }

    /// Width of one element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::Bfloat16 => 2,
            DType::Float32 | DType::Int32 => 4,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = UbError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.as_str() == raw)
            .ok_or_else(|| {
                UbError::Config(
                    ErrorInfo::new("ub_kern.unsupported_dtype", format!("unsupported dtype: {raw}"))
                        .with_context("field", "dtype")
                        .with_hint("expected one of bfloat16, float32, int32"),
                )
            })
    }
}
