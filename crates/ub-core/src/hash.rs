//! SHA-256 digests identifying the inputs a report was built from.

use sha2::{Digest, Sha256};

/// Streaming digest over several input files, fed in read order.
#[derive(Clone, Default)]
pub struct InputDigest {
    hasher: Sha256,
}

impl InputDigest {
    /// Starts an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the raw bytes of one input.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Hex encoded SHA-256 of everything fed so far.
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}
