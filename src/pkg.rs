//! Package manifest reader
//!
//! Reads package.json for dependency enumeration. Only the keys are
//! consumed; key order is preserved so vendor membership follows the
//! manifest's declaration order.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Package manifest errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The subset of package.json the composer consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,

    /// Runtime dependencies; values (version ranges) are kept opaque.
    #[serde(default)]
    pub dependencies: Map<String, Value>,

    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: Map<String, Value>,
}

impl PackageManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self, PackageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a file, returning the manifest and the SHA-256
    /// digest of the raw file bytes.
    pub fn from_file(path: &Path) -> Result<(Self, String), PackageError> {
        let bytes = fs::read(path)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let manifest: PackageManifest = serde_json::from_slice(&bytes)?;

        debug!(
            path = %path.display(),
            dependencies = manifest.dependencies.len(),
            "loaded package manifest"
        );

        Ok((manifest, digest))
    }

    /// Dependency names in declaration order.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }
}
