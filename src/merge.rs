//! Configuration merge logic
//!
//! Implements the layered merge with:
//! - Objects: deep-merge by key
//! - Arrays: APPEND (base entries first, overlay entries after)
//! - Scalars: override (last wins)
//!
//! The array strategy can be changed per object key through [`MergeRules`].
//! The only non-default rule the composer ships is `plugins -> Replace`,
//! applied to the DLL compiler's nested configuration so its plugin list is
//! replaced rather than extended.

use std::collections::HashMap;

use serde_json::Value;

/// Array merge strategy for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMerge {
    /// Concatenate: base entries, then overlay entries.
    #[default]
    Append,
    /// Overlay wins entirely.
    Replace,
}

/// Per-key merge rules.
///
/// A rule is keyed by the plain object key name and applies at every object
/// level where that key appears. Keys without a rule use [`ArrayMerge::Append`].
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    array_rules: HashMap<String, ArrayMerge>,
}

impl MergeRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the array strategy for a key.
    pub fn array(mut self, key: &str, strategy: ArrayMerge) -> Self {
        self.array_rules.insert(key.to_string(), strategy);
        self
    }

    fn array_strategy(&self, key: Option<&str>) -> ArrayMerge {
        key.and_then(|k| self.array_rules.get(k).copied())
            .unwrap_or_default()
    }
}

/// Deep merge two JSON values under the default rules.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: append (base first, overlay after)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    deep_merge_with(base, overlay, &MergeRules::default())
}

/// Deep merge two JSON values under explicit rules.
pub fn deep_merge_with(base: Value, overlay: Value, rules: &MergeRules) -> Value {
    merge_value(base, overlay, rules, None)
}

fn merge_value(base: Value, overlay: Value, rules: &MergeRules, key: Option<&str>) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    merge_value(base_value, overlay_value, rules, Some(&key))
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays: append unless the key declares Replace
        (Value::Array(mut base_arr), Value::Array(overlay_arr)) => {
            match rules.array_strategy(key) {
                ArrayMerge::Append => {
                    base_arr.extend(overlay_arr);
                    Value::Array(base_arr)
                }
                ArrayMerge::Replace => Value::Array(overlay_arr),
            }
        }

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
