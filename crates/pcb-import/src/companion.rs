//! JSON companion normalization (spec.md §9: "avoid hard-coding a single
//! companion schema; normalize multiple historical shapes into one
//! internal representation"). The external applicator has produced at
//! least three generations of `pcb_info.json` over its life — grounded on
//! `adapters/altium/importer.py`'s `x_mm`/`location.x_mm`/`location.x`
//! fallback chains — so every accessor here tries several key spellings
//! before giving up.
//!
//! Untyped `serde_json::Value` is used deliberately: a rigid struct would
//! reject exactly the older-generation documents this layer exists to
//! tolerate.

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct CompanionData {
    pub pcb_info: Option<Value>,
    pub design_rules: Option<Value>,
    pub copper_regions: Option<Value>,
}

pub fn get_f64(obj: &Value, keys: &[&str], default: f64) -> f64 {
    for key in keys {
        if let Some(v) = obj.get(key).and_then(Value::as_f64) {
            return v;
        }
    }
    default
}

pub fn get_str<'a>(obj: &'a Value, keys: &[&str], default: &'a str) -> &'a str {
    for key in keys {
        if let Some(v) = obj.get(key).and_then(Value::as_str) {
            return v;
        }
    }
    default
}

pub fn get_bool(obj: &Value, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn get_array<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    obj.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// `location.x_mm` / `location.x`, falling back to a top-level `x_mm`.
pub fn get_position(obj: &Value, flat_keys: (&str, &str), nested_key: &str) -> (f64, f64) {
    if obj.get(flat_keys.0).is_some() {
        return (
            get_f64(obj, &[flat_keys.0], 0.0),
            get_f64(obj, &[flat_keys.1], 0.0),
        );
    }
    let nested = obj.get(nested_key).cloned().unwrap_or(Value::Null);
    (
        get_f64(&nested, &["x_mm", "x"], 0.0),
        get_f64(&nested, &["y_mm", "y"], 0.0),
    )
}
