//! Layering of settings files.
//!
//! `dbtdefs.local.yml` overlays `dbtdefs.yml`:
//!
//! - mappings merge key by key
//! - anything else in the overlay replaces the base value
//! - an explicit `null` in the overlay removes the key

use serde_yaml::Value;

/// Overlay `overlay` onto `base`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();
            for (key, value) in overlay_map {
                if value.is_null() {
                    result.remove(key);
                } else {
                    let merged = match base_map.get(key) {
                        Some(existing) => deep_merge(existing, value),
                        None => value.clone(),
                    };
                    result.insert(key.clone(), merged);
                }
            }
            Value::Mapping(result)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fold layers left to right; the last layer wins.
pub fn merge_layers(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}
