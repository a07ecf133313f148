//! Bundler settings model
//!
//! Typed input settings for the composer, loaded from devpack.toml (or built
//! in code). Settings name the development devtool and the bundle groups the
//! browser overlay plans around.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Debug-symbol generation mode per build flavor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevtoolSettings {
    /// Devtool used for development builds (default: "cheap-module-source-map")
    #[serde(default = "default_dev_devtool")]
    pub dev: String,
}

fn default_dev_devtool() -> String {
    "cheap-module-source-map".to_string()
}

impl Default for DevtoolSettings {
    fn default() -> Self {
        Self {
            dev: default_dev_devtool(),
        }
    }
}

/// Named bundle groups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleSettings {
    /// Polyfill bundle entries, in load order
    #[serde(default)]
    pub polyfills: Vec<BundleDescriptor>,

    /// Server-only bundle names
    #[serde(default)]
    pub server: Vec<String>,
}

/// A bundle entry: a plain name, or a detailed form carrying a name and an
/// optional module path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleDescriptor {
    Name(String),
    Detailed {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

impl BundleDescriptor {
    /// The bundle name, whichever form the entry uses.
    pub fn name(&self) -> &str {
        match self {
            BundleDescriptor::Name(name) => name,
            BundleDescriptor::Detailed { name, .. } => name,
        }
    }
}

impl From<&str> for BundleDescriptor {
    fn from(name: &str) -> Self {
        BundleDescriptor::Name(name.to_string())
    }
}

/// Composer input settings (devpack.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Devtool configuration
    #[serde(default)]
    pub devtool: DevtoolSettings,

    /// Bundle groups
    #[serde(default)]
    pub bundles: BundleSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(s)?;
        Ok(settings)
    }

    /// Load settings from a TOML file, returning the settings and the
    /// SHA-256 digest of the raw file bytes.
    pub fn from_file(path: &Path) -> Result<(Self, String), SettingsError> {
        let bytes = fs::read(path)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8_lossy(&bytes);
        let settings = Self::from_str(&contents)?;

        debug!(
            path = %path.display(),
            polyfills = settings.bundles.polyfills.len(),
            server = settings.bundles.server.len(),
            "loaded settings"
        );

        Ok((settings, digest))
    }
}
