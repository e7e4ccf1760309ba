//! Rule-stream decoding (spec.md §4.2 "Rule-stream specifics"). Splits
//! `Rules6/Data` on `|RULEKIND=`, decodes `OBJECTCLEARANCES` overrides, and
//! extracts `InNamedPolygon('X')` scope targets. Classification of the
//! `RULEKIND` tag into one of the ~20 [`pcb_rules`]-level kinds happens in
//! `pcb-import`, which is the layer that knows the full taxonomy — this
//! crate only decodes the stream's own vocabulary.

use std::collections::HashMap;

use crate::text::{latin1_to_string, split_records_on_sentinel};
use crate::Warning;

/// One track/pad/via-to-poly clearance override, in mm.
#[derive(Debug, Clone)]
pub struct ObjectClearanceOverride {
    pub object_a: String,
    pub object_b: String,
    pub clearance_mm: f64,
}

#[derive(Debug, Clone)]
pub struct RawRuleRecord {
    pub rule_kind_tag: String,
    pub fields: HashMap<String, String>,
    pub object_clearances: Vec<ObjectClearanceOverride>,
    /// Extracted from a `InNamedPolygon('X')` scope expression, if any.
    pub in_named_polygon: Option<String>,
}

pub fn decode_rules(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<RawRuleRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let text = latin1_to_string(bytes);
    let raw = split_records_on_sentinel(&text, "|RULEKIND=");
    if raw.is_empty() {
        warnings.push(Warning {
            stream: "Rules6/Data".into(),
            message: "no rule records recovered".into(),
        });
        return Vec::new();
    }

    raw.into_iter()
        .map(|fields| {
            let rule_kind_tag = fields.get("RULEKIND").cloned().unwrap_or_default();
            let object_clearances = fields
                .get("OBJECTCLEARANCES")
                .map(|raw| parse_object_clearances(raw))
                .unwrap_or_default();
            let in_named_polygon = fields
                .get("SCOPE1EXPRESSION")
                .and_then(|s| extract_named_polygon(s))
                .or_else(|| {
                    fields
                        .get("SCOPE2EXPRESSION")
                        .and_then(|s| extract_named_polygon(s))
                });
            RawRuleRecord {
                rule_kind_tag,
                fields,
                object_clearances,
                in_named_polygon,
            }
        })
        .collect()
}

/// Parses `ClearanceObj_Track-ClearanceObj_Poly:600000;...` into
/// per-pair mm overrides, converting the internal-units value via the
/// same inference rule as other numeric fields.
fn parse_object_clearances(raw: &str) -> Vec<ObjectClearanceOverride> {
    raw.split(';')
        .filter_map(|entry| {
            let (pair, value) = entry.split_once(':')?;
            let (a, b) = pair.split_once('-')?;
            let mm = crate::units::parse_to_mm(value.trim())?;
            Some(ObjectClearanceOverride {
                object_a: strip_clearance_obj_prefix(a),
                object_b: strip_clearance_obj_prefix(b),
                clearance_mm: mm,
            })
        })
        .collect()
}

fn strip_clearance_obj_prefix(tag: &str) -> String {
    tag.trim()
        .strip_prefix("ClearanceObj_")
        .unwrap_or(tag.trim())
        .to_ascii_lowercase()
}

/// Extracts `X` from a scope expression of the form `InNamedPolygon('X')`.
fn extract_named_polygon(expr: &str) -> Option<String> {
    let start = expr.find("InNamedPolygon(")?;
    let rest = &expr[start + "InNamedPolygon(".len()..];
    let quote = rest.find(['\'', '"'])?;
    let quote_char = rest.as_bytes()[quote] as char;
    let rest = &rest[quote + 1..];
    let end = rest.find(quote_char)?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_clearance_overrides() {
        let overrides = parse_object_clearances(
            "ClearanceObj_Track-ClearanceObj_Poly:600000;ClearanceObj_Pad-ClearanceObj_Poly:500000",
        );
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].object_a, "track");
        assert_eq!(overrides[0].object_b, "poly");
        assert!((overrides[0].clearance_mm - (600000.0 * crate::units::MM_PER_INTERNAL_UNIT)).abs() < 1e-9);
    }

    #[test]
    fn extracts_named_polygon_scope() {
        assert_eq!(
            extract_named_polygon("InNamedPolygon('GND_POUR')"),
            Some("GND_POUR".to_string())
        );
        assert_eq!(extract_named_polygon("InComponentClass('U1')"), None);
    }

    #[test]
    fn decode_rules_splits_on_rulekind() {
        let text = "|RULEKIND=Clearance|NAME=Clearance|GENERICCLEARANCE=200|\
                     |RULEKIND=Width|NAME=Width|MINLIMIT=254|";
        let mut warnings = Vec::new();
        let records = decode_rules(text.as_bytes(), &mut warnings);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rule_kind_tag, "Clearance");
        assert_eq!(records[1].rule_kind_tag, "Width");
    }
}
