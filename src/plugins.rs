//! Plugin descriptor schema
//!
//! Typed descriptors for the compiler plugins the development configuration
//! declares. Descriptors serialize into the config tree as internally tagged
//! objects; declaration order within a plugin list is the injection order.

use std::path::PathBuf;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::BundleDescriptor;

/// File name of the emitted DLL for a bundle.
pub fn resolve_dll_file(bundle: &str) -> String {
    format!("{}.dll.js", bundle)
}

/// A plugin declaration in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Precompiles rarely-changing dependency groups as DLL bundles.
    DllBundles(DllBundlesOptions),

    /// Intermediate module cache between compiler runs.
    ModuleCache,

    /// Extracts shared modules into a named chunk.
    CommonsChunk(CommonsChunkOptions),

    /// Injects already-built assets into the generated HTML.
    AddAssetHtml(AddAssetHtmlOptions),

    /// Loader-layer options.
    LoaderOptions(LoaderOptionsSpec),
}

/// Options for the DLL-bundling plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DllBundlesOptions {
    /// Bundle groups to precompile
    pub bundles: DllBundleGroups,

    /// Directory the DLL files are written to and linked from
    pub dll_dir: PathBuf,

    /// Compiler configuration for the DLL build itself
    pub config: Value,
}

/// The two precompiled bundle groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DllBundleGroups {
    pub polyfills: Vec<BundleDescriptor>,
    pub vendor: Vec<String>,
}

/// Options for a commons-chunk extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonsChunkOptions {
    /// Chunk name; the list form declares injected script order
    pub name: ChunkName,

    /// Source chunks to extract from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,

    /// Module membership test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_chunks: Option<MinChunks>,
}

/// A single chunk name or an ordered name list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkName {
    Single(String),
    Ordered(Vec<String>),
}

/// Module membership test for chunk extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinChunks {
    /// Minimum number of chunks a module must appear in
    Count(u32),
    /// Modules whose resource path matches a pattern
    Resource(ResourceMatcher),
}

/// Matches a module's resource path against a regex pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMatcher {
    pub resource_match: String,
}

impl ResourceMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            resource_match: pattern.into(),
        }
    }

    /// True when the module's resource path matches the pattern.
    /// An invalid pattern matches nothing.
    pub fn matches(&self, resource: &str) -> bool {
        Regex::new(&self.resource_match)
            .map(|re| re.is_match(resource))
            .unwrap_or(false)
    }
}

/// Options for the HTML asset-injection plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAssetHtmlOptions {
    /// Assets to add, in injection order
    pub assets: Vec<AddedAsset>,
}

/// A single injected asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedAsset {
    pub filepath: PathBuf,
}

/// Options for the loader-options plugin
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoaderOptionsSpec {
    /// Switch loaders to debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    /// Options forwarded to the loader layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<LoaderContext>,
}

/// Loader-layer options payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderContext {
    /// Build context directory
    pub context: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_dll_file() {
        assert_eq!(resolve_dll_file("polyfills"), "polyfills.dll.js");
        assert_eq!(resolve_dll_file("vendor"), "vendor.dll.js");
    }

    #[test]
    fn test_module_cache_tag() {
        let json = serde_json::to_value(PluginSpec::ModuleCache).unwrap();
        assert_eq!(json, json!({"plugin": "module-cache"}));
    }

    #[test]
    fn test_commons_chunk_single_name() {
        let spec = PluginSpec::CommonsChunk(CommonsChunkOptions {
            name: ChunkName::Single("polyfills".to_string()),
            chunks: Some(vec!["polyfills".to_string()]),
            min_chunks: None,
        });

        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["plugin"], "commons-chunk");
        assert_eq!(json["name"], "polyfills");
        assert_eq!(json["chunks"], json!(["polyfills"]));
        assert!(json.get("min_chunks").is_none());
    }

    #[test]
    fn test_commons_chunk_ordered_names() {
        let spec = CommonsChunkOptions {
            name: ChunkName::Ordered(vec!["vendor".to_string(), "polyfills".to_string()]),
            chunks: None,
            min_chunks: None,
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], json!(["vendor", "polyfills"]));
    }

    #[test]
    fn test_resource_matcher() {
        let matcher = ResourceMatcher::new("node_modules");

        assert!(matcher.matches("/work/app/node_modules/rxjs/index.js"));
        assert!(!matcher.matches("/work/app/src/main.ts"));
    }

    #[test]
    fn test_resource_matcher_invalid_pattern_matches_nothing() {
        let matcher = ResourceMatcher::new("(unclosed");
        assert!(!matcher.matches("anything"));
    }

    #[test]
    fn test_min_chunks_forms() {
        let count = serde_json::to_value(MinChunks::Count(2)).unwrap();
        assert_eq!(count, json!(2));

        let resource =
            serde_json::to_value(MinChunks::Resource(ResourceMatcher::new("node_modules")))
                .unwrap();
        assert_eq!(resource, json!({"resource_match": "node_modules"}));
    }

    #[test]
    fn test_dll_bundles_round_trip() {
        let spec = PluginSpec::DllBundles(DllBundlesOptions {
            bundles: DllBundleGroups {
                polyfills: vec!["core-js".into()],
                vendor: vec!["rxjs".to_string()],
            },
            dll_dir: PathBuf::from("/work/app/node_modules/.cache/dll"),
            config: json!({"devtool": "cheap-module-source-map", "plugins": []}),
        });

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["plugin"], "dll-bundles");
        assert_eq!(json["bundles"]["vendor"], json!(["rxjs"]));

        let parsed: PluginSpec = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_loader_options_omits_empty_fields() {
        let spec = PluginSpec::LoaderOptions(LoaderOptionsSpec {
            debug: Some(true),
            options: None,
        });

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, json!({"plugin": "loader-options", "debug": true}));
    }
}
