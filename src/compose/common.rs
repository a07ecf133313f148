//! Common-layer seam
//!
//! The common configuration comes from an external builder. [`CommonSource`]
//! is the seam: the composer calls it once for the outer merge and once more
//! (without a platform) for the DLL compiler's nested configuration.

use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::LayerContext;
use crate::project::ProjectRoot;
use crate::settings::Settings;

/// Common-layer errors
#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("common layer builder error: {0}")]
    Builder(String),
}

/// Produces the common configuration layer for a given context.
pub trait CommonSource {
    fn layer(
        &self,
        ctx: &LayerContext,
        root: &ProjectRoot,
        settings: &Settings,
    ) -> Result<Value, CommonError>;

    /// File path and digest for provenance, when file-backed.
    fn provenance(&self) -> (Option<String>, Option<String>) {
        (None, None)
    }
}

/// Common layer loaded from a JSON file under the project root.
///
/// The file is read once at open time; the digest of the raw bytes is
/// recorded for provenance.
#[derive(Debug, Clone)]
pub struct JsonFileCommon {
    path: String,
    digest: String,
    value: Value,
}

impl JsonFileCommon {
    pub fn open(root: &ProjectRoot, rel: impl AsRef<Path>) -> Result<Self, CommonError> {
        let path = root.resolve(rel);
        let bytes = fs::read(&path)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let value = serde_json::from_slice(&bytes)?;

        Ok(Self {
            path: path.to_string_lossy().to_string(),
            digest,
            value,
        })
    }
}

impl CommonSource for JsonFileCommon {
    fn layer(
        &self,
        _ctx: &LayerContext,
        _root: &ProjectRoot,
        _settings: &Settings,
    ) -> Result<Value, CommonError> {
        Ok(self.value.clone())
    }

    fn provenance(&self) -> (Option<String>, Option<String>) {
        (Some(self.path.clone()), Some(self.digest.clone()))
    }
}

/// Fixed in-memory common layer.
#[derive(Debug, Clone)]
pub struct StaticCommon {
    value: Value,
}

impl StaticCommon {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// An empty common layer, for projects whose common configuration lives
    /// entirely with the bundler.
    pub fn empty() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl CommonSource for StaticCommon {
    fn layer(
        &self,
        _ctx: &LayerContext,
        _root: &ProjectRoot,
        _settings: &Settings,
    ) -> Result<Value, CommonError> {
        Ok(self.value.clone())
    }
}

impl<F> CommonSource for F
where
    F: Fn(&LayerContext, &ProjectRoot, &Settings) -> Result<Value, CommonError>,
{
    fn layer(
        &self,
        ctx: &LayerContext,
        root: &ProjectRoot,
        settings: &Settings,
    ) -> Result<Value, CommonError> {
        self(ctx, root, settings)
    }
}
