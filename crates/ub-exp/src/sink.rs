use std::fs;
use std::path::{Path, PathBuf};

use ub_core::UbError;

use crate::recorder::ensure_parent;

/// Destination for finished artefacts (record log, report).
///
/// Remote object stores plug in behind this trait.
pub trait ArtifactSink {
    /// Publishes `local` under `name`, returning where it landed.
    fn publish(&self, local: &Path, name: &str) -> Result<PathBuf, UbError>;
}

/// Copies artefacts into a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn publish(&self, local: &Path, name: &str) -> Result<PathBuf, UbError> {
        let dest = self.root.join(name);
        ensure_parent(&dest)?;
        fs::copy(local, &dest).map_err(|err| {
            UbError::io("ub_exp.publish", dest.display(), err)
                .with_context("source", local.display().to_string())
        })?;
        tracing::info!(source = %local.display(), dest = %dest.display(), "artefact published");
        Ok(dest)
    }
}
