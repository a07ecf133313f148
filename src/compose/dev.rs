//! Development-defaults layer
//!
//! Sets the development devtool and switches loaders into debug mode. This
//! layer applies to every platform.

use serde_json::{json, Value};

use crate::plugins::{LoaderOptionsSpec, PluginSpec};
use crate::settings::Settings;

pub(crate) fn dev_defaults(settings: &Settings) -> Result<Value, serde_json::Error> {
    let plugins = vec![PluginSpec::LoaderOptions(LoaderOptionsSpec {
        debug: Some(true),
        options: None,
    })];

    Ok(json!({
        "devtool": settings.devtool.dev,
        "plugins": serde_json::to_value(&plugins)?,
    }))
}
