//! Recursive table merge.

use super::{ConfigLayer, FieldSources};

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Tables merge key by key. Scalars and arrays from the overlay replace
/// the base value wholesale.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    merge_into(base, overlay, "", ConfigLayer::Defaults, None);
}

/// [`deep_merge`], recording `layer` as the source of every leaf the
/// overlay sets.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    merge_into(base, overlay, "", layer, Some(sources));
}

fn merge_into(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    mut sources: Option<&mut FieldSources>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    merge_into(base_val, overlay_val, &path, layer, sources.as_deref_mut());
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    if let Some(sources) = sources.as_deref_mut() {
                        record_leaves(overlay_val, &path, layer, sources);
                    }
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            if let Some(sources) = sources {
                record_leaves(overlay, prefix, layer, sources);
            }
        },
    }
}

/// Record `layer` as the source of every leaf under `prefix`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match val {
        toml::Value::Table(table) => {
            for (key, child) in table {
                record_leaves(child, &join(prefix, key), layer, sources);
            }
        },
        _ => {
            sources.insert(prefix.to_owned(), layer);
        },
    }
}
