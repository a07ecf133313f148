//! Configuration composer
//!
//! Merges the common layer, the development defaults, and (for browser
//! targets) the browser overlay into one configuration object. Composition
//! is pure: identical inputs produce a deep-equal config value, so the
//! result carries no timestamps or generated identifiers, only
//! deterministic provenance.

mod browser;
mod common;
mod dev;

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;

pub use browser::{exclusion_set, vendor_bundles};
pub use common::{CommonError, CommonSource, JsonFileCommon, StaticCommon};

use crate::merge::merge_layers;
use crate::pkg::PackageError;
use crate::project::ProjectRoot;
use crate::settings::{Settings, SettingsError};

/// Schema version for the composed config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "devpack/composed_config@1";

/// Build target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Browser,
    Server,
}

impl Platform {
    /// Anything other than `"server"` composes for the browser.
    pub fn from_name(name: &str) -> Self {
        if name == "server" {
            Platform::Server
        } else {
            Platform::Browser
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Browser => "browser",
            Platform::Server => "server",
        }
    }
}

/// Build environment tag passed to the common layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// `"production"` maps to production; everything else composes for
    /// development, the only mode this composer builds.
    pub fn from_name(name: &str) -> Self {
        if name == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Composer options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeOptions {
    pub platform: Option<Platform>,
    pub env: Environment,
}

impl ComposeOptions {
    fn platform(&self) -> Platform {
        self.platform.unwrap_or(Platform::Browser)
    }
}

/// Context handed to the common-layer builder.
///
/// The DLL compiler's nested configuration is built without a platform.
#[derive(Debug, Clone, Copy)]
pub struct LayerContext {
    pub env: Environment,
    pub platform: Option<Platform>,
}

/// Origin of a contributing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerOrigin {
    Common,
    DevDefaults,
    Browser,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSource {
    /// Origin of this layer
    pub origin: LayerOrigin,

    /// File path (None for built-in layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for built-in layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// The composed configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// The merged configuration object
    pub config: Value,

    /// Contributing layers in precedence order
    pub sources: Vec<LayerSource>,
}

impl ComposedConfig {
    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    /// Get a config value as bool
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    /// The plugin declarations of the merged config
    pub fn plugins(&self) -> &[Value] {
        self.config
            .get("plugins")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Compute the config digest using RFC 8785 JSON Canonicalization (JCS)
    ///
    /// digest = SHA-256 hex digest of JCS(config)
    pub fn digest(&self) -> Result<String, ComposeError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(&self.config)
            .map_err(|e| ComposeError::Canonical(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Serialize to JSON (pretty printed)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}

/// Composer errors
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("package manifest error: {0}")]
    Package(#[from] PackageError),

    #[error("common layer error: {0}")]
    Common(#[from] CommonError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("canonicalization error: {0}")]
    Canonical(String),
}

impl ComposeError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ComposeError::Settings(_) => 10,
            ComposeError::Package(_) => 20,
            ComposeError::Common(_) => 30,
            ComposeError::Io(_) => 1,
            ComposeError::Serialization(_) => 1,
            ComposeError::Canonical(_) => 1,
        }
    }
}

/// Compose the development configuration for the given platform.
///
/// Layer order is semantic: common, then development defaults, then (for
/// browser targets) the browser overlay. Plugin lists concatenate in that
/// order; overlapping scalars resolve to the later layer.
pub fn compose(
    options: &ComposeOptions,
    root: &ProjectRoot,
    settings: &Settings,
    common: &dyn CommonSource,
) -> Result<ComposedConfig, ComposeError> {
    let platform = options.platform();

    let mut layers = Vec::new();
    let mut sources = Vec::new();

    // Layer 1: common configuration
    let ctx = LayerContext {
        env: options.env,
        platform: Some(platform),
    };
    layers.push(common.layer(&ctx, root, settings)?);
    let (path, digest) = common.provenance();
    sources.push(LayerSource {
        origin: LayerOrigin::Common,
        path,
        digest,
    });

    // Layer 2: development defaults
    layers.push(dev::dev_defaults(settings)?);
    sources.push(LayerSource {
        origin: LayerOrigin::DevDefaults,
        path: None,
        digest: None,
    });

    // Layer 3: browser overlay (server builds stop at the defaults)
    if platform != Platform::Server {
        let browser = browser::browser_layer(options.env, root, settings, common)?;
        layers.push(browser.value);
        sources.push(LayerSource {
            origin: LayerOrigin::Browser,
            path: Some(browser.manifest_path),
            digest: Some(browser.manifest_digest),
        });
    }

    let config = merge_layers(layers);

    let composed = ComposedConfig {
        schema_version: SCHEMA_VERSION,
        schema_id: SCHEMA_ID.to_string(),
        config,
        sources,
    };

    info!(
        platform = platform.as_str(),
        env = options.env.as_str(),
        plugins = composed.plugins().len(),
        "composed configuration"
    );

    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_from_name() {
        assert_eq!(Platform::from_name("server"), Platform::Server);
        assert_eq!(Platform::from_name("browser"), Platform::Browser);
        // Anything that is not "server" targets the browser
        assert_eq!(Platform::from_name("electron"), Platform::Browser);
        assert_eq!(Platform::from_name(""), Platform::Browser);
    }

    #[test]
    fn test_environment_from_name() {
        assert_eq!(
            Environment::from_name("production"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_name("development"),
            Environment::Development
        );
        assert_eq!(Environment::from_name("staging"), Environment::Development);
    }

    #[test]
    fn test_get_by_dot_path() {
        let composed = ComposedConfig {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            config: json!({
                "output": {"library": "_awc"},
                "devtool": "eval"
            }),
            sources: vec![],
        };

        assert_eq!(composed.get_str("output.library"), Some("_awc"));
        assert_eq!(composed.get_str("devtool"), Some("eval"));
        assert!(composed.get("output.filename").is_none());
    }

    #[test]
    fn test_plugins_accessor_empty_when_absent() {
        let composed = ComposedConfig {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            config: json!({}),
            sources: vec![],
        };

        assert!(composed.plugins().is_empty());
    }

    #[test]
    fn test_digest_is_stable() {
        let composed = ComposedConfig {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            config: json!({"devtool": "eval", "plugins": []}),
            sources: vec![],
        };

        let first = composed.digest().unwrap();
        let second = composed.digest().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_layer_origin_serialization() {
        let source = LayerSource {
            origin: LayerOrigin::DevDefaults,
            path: None,
            digest: None,
        };

        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"origin":"dev-defaults"}"#);
    }
}
