//! Browser-target overlay
//!
//! Output naming, DLL bundle planning, chunk extraction and HTML asset
//! injection for browser builds. Server builds skip this layer entirely.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::debug;

use super::common::CommonSource;
use super::{ComposeError, Environment, LayerContext};
use crate::merge::{deep_merge_with, ArrayMerge, MergeRules};
use crate::pkg::PackageManifest;
use crate::plugins::{
    resolve_dll_file, AddAssetHtmlOptions, AddedAsset, ChunkName, CommonsChunkOptions,
    DllBundleGroups, DllBundlesOptions, LoaderContext, LoaderOptionsSpec, MinChunks, PluginSpec,
    ResourceMatcher,
};
use crate::project::ProjectRoot;
use crate::settings::{BundleSettings, Settings};

const PACKAGE_MANIFEST: &str = "package.json";
const DLL_CACHE_DIR: &str = "node_modules/.cache/dll";

const OUTPUT_FILENAME: &str = "[name].bundle.js";
const SOURCE_MAP_FILENAME: &str = "[name].map";
const CHUNK_FILENAME: &str = "[id].chunk.js";
const LIBRARY_TARGET: &str = "var";
const LIBRARY_NAME: &str = "_awc";

const POLYFILLS_CHUNK: &str = "polyfills";
const VENDOR_CHUNK: &str = "vendor";
const APP_CHUNK: &str = "app";
const NODE_MODULES_PATTERN: &str = "node_modules";

/// Ordered, de-duplicated union of polyfill bundle names and server bundle
/// names. A name appearing in both lists is kept once, at its first position.
pub fn exclusion_set(bundles: &BundleSettings) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut exclusions = Vec::new();

    let names = bundles
        .polyfills
        .iter()
        .map(|bundle| bundle.name())
        .chain(bundles.server.iter().map(String::as_str));

    for name in names {
        if seen.insert(name.to_string()) {
            exclusions.push(name.to_string());
        }
    }

    exclusions
}

/// Vendor bundle membership: dependency names not claimed by a polyfill or
/// server bundle, in manifest declaration order.
pub fn vendor_bundles(manifest: &PackageManifest, exclusions: &[String]) -> Vec<String> {
    manifest
        .dependency_names()
        .filter(|name| !exclusions.iter().any(|excluded| excluded == name))
        .map(str::to_string)
        .collect()
}

pub(crate) struct BrowserLayer {
    pub value: Value,
    pub manifest_path: String,
    pub manifest_digest: String,
}

pub(crate) fn browser_layer(
    env: Environment,
    root: &ProjectRoot,
    settings: &Settings,
    common: &dyn CommonSource,
) -> Result<BrowserLayer, ComposeError> {
    let manifest_path = root.resolve(PACKAGE_MANIFEST);
    let (manifest, manifest_digest) = PackageManifest::from_file(&manifest_path)?;

    let exclusions = exclusion_set(&settings.bundles);
    let vendor = vendor_bundles(&manifest, &exclusions);

    debug!(
        excluded = exclusions.len(),
        vendor = vendor.len(),
        "planned DLL bundle membership"
    );

    let dll_dir = root.resolve(DLL_CACHE_DIR);

    // Compiler config for the DLL build: the common layer without a platform,
    // with the plugin list replaced instead of extended.
    let dll_ctx = LayerContext {
        env,
        platform: None,
    };
    let dll_common = common.layer(&dll_ctx, root, settings)?;
    let dll_overlay = json!({
        "devtool": settings.devtool.dev,
        "plugins": [],
    });
    let dll_rules = MergeRules::new().array("plugins", ArrayMerge::Replace);
    let dll_config = deep_merge_with(dll_common, dll_overlay, &dll_rules);

    // The list form declares injected script order.
    let mut injection_order = vec![POLYFILLS_CHUNK.to_string(), VENDOR_CHUNK.to_string()];
    injection_order.reverse();

    let plugins = vec![
        PluginSpec::DllBundles(DllBundlesOptions {
            bundles: DllBundleGroups {
                polyfills: settings.bundles.polyfills.clone(),
                vendor,
            },
            dll_dir: dll_dir.clone(),
            config: dll_config,
        }),
        PluginSpec::ModuleCache,
        PluginSpec::CommonsChunk(CommonsChunkOptions {
            name: ChunkName::Single(POLYFILLS_CHUNK.to_string()),
            chunks: Some(vec![POLYFILLS_CHUNK.to_string()]),
            min_chunks: None,
        }),
        // Pulls node_modules imports out of the app chunk
        PluginSpec::CommonsChunk(CommonsChunkOptions {
            name: ChunkName::Single(VENDOR_CHUNK.to_string()),
            chunks: Some(vec![APP_CHUNK.to_string()]),
            min_chunks: Some(MinChunks::Resource(ResourceMatcher::new(
                NODE_MODULES_PATTERN,
            ))),
        }),
        PluginSpec::CommonsChunk(CommonsChunkOptions {
            name: ChunkName::Ordered(injection_order),
            chunks: None,
            min_chunks: None,
        }),
        PluginSpec::AddAssetHtml(AddAssetHtmlOptions {
            assets: vec![
                AddedAsset {
                    filepath: dll_dir.join(resolve_dll_file(POLYFILLS_CHUNK)),
                },
                AddedAsset {
                    filepath: dll_dir.join(resolve_dll_file(VENDOR_CHUNK)),
                },
            ],
        }),
        PluginSpec::LoaderOptions(LoaderOptionsSpec {
            debug: None,
            options: Some(LoaderContext {
                context: root.path().to_path_buf(),
            }),
        }),
    ];

    let value = json!({
        "output": {
            "filename": OUTPUT_FILENAME,
            "source_map_filename": SOURCE_MAP_FILENAME,
            "chunk_filename": CHUNK_FILENAME,
            "library_target": LIBRARY_TARGET,
            "library": LIBRARY_NAME,
        },
        "plugins": serde_json::to_value(&plugins)?,
    });

    Ok(BrowserLayer {
        value,
        manifest_path: manifest_path.to_string_lossy().to_string(),
        manifest_digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BundleDescriptor;

    fn bundles(polyfills: &[&str], server: &[&str]) -> BundleSettings {
        BundleSettings {
            polyfills: polyfills.iter().map(|n| (*n).into()).collect(),
            server: server.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_exclusion_set_union() {
        let bundles = bundles(&["core-js", "zone.js"], &["domino"]);
        assert_eq!(exclusion_set(&bundles), vec!["core-js", "zone.js", "domino"]);
    }

    #[test]
    fn test_exclusion_set_dedupes_across_lists() {
        let bundles = bundles(&["core-js", "core-js"], &["core-js", "domino"]);
        assert_eq!(exclusion_set(&bundles), vec!["core-js", "domino"]);
    }

    #[test]
    fn test_exclusion_set_uses_detailed_names() {
        let bundles = BundleSettings {
            polyfills: vec![
                BundleDescriptor::Detailed {
                    name: "zone.js".to_string(),
                    path: Some("dist/zone.js".to_string()),
                },
                "core-js".into(),
            ],
            server: vec![],
        };
        assert_eq!(exclusion_set(&bundles), vec!["zone.js", "core-js"]);
    }

    #[test]
    fn test_vendor_membership() {
        let manifest = PackageManifest::from_json(
            r#"{"dependencies": {"a": "1", "b": "1", "c": "1", "d": "1"}}"#,
        )
        .unwrap();
        let exclusions = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        assert_eq!(vendor_bundles(&manifest, &exclusions), vec!["d"]);
    }

    #[test]
    fn test_vendor_preserves_manifest_order() {
        let manifest = PackageManifest::from_json(
            r#"{"dependencies": {"zeta": "1", "alpha": "1", "mid": "1"}}"#,
        )
        .unwrap();

        assert_eq!(
            vendor_bundles(&manifest, &[]),
            vec!["zeta", "alpha", "mid"]
        );
    }
}
