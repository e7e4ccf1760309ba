//! Constraint-IR builder: classifies raw `RULEKIND` tags (pcb-reader's
//! `RawRuleRecord`) into the ~20 typed [`RuleKind`] variants, merges in a
//! JSON-companion `design_rules.json` when present, and falls back to
//! [`pcb_rules::default_ruleset`] when neither source yields a rule
//! (spec.md §4.3 "Defaults" — the one case this importer may invent data).
//!
//! Grounded on `adapters/altium/importer.py`'s `import_design_rules*`
//! functions: same `enabled` skip, same scope-from-expression extraction,
//! same "skip non-positive/missing numeric thresholds" guards.

use pcb_ir::cir::{
    ClearanceParams, ConstraintIr, HeightParams, HoleToHoleParams, Netclass, NetclassDefaults,
    Rule, RuleKind, RuleScope, ShapeKind, ShortCircuitParams, SilkClearanceParams,
    SolderMaskSliverParams, UnroutedNetParams, ViaParams, WidthParams,
};
use pcb_reader::rules::RawRuleRecord;
use regex::Regex;
use serde_json::Value;

use crate::companion::{self, CompanionData};

fn field_f64(fields: &std::collections::HashMap<String, String>, key: &str) -> Option<f64> {
    fields.get(key).and_then(|v| pcb_reader::units::parse_to_mm(v))
}

fn scope_from_record(record: &RawRuleRecord) -> RuleScope {
    let mut scope = RuleScope::default();
    if let Some(polygon) = &record.in_named_polygon {
        scope.in_named_polygon = Some(polygon.clone());
        return scope;
    }
    let expr = record
        .fields
        .get("SCOPE1EXPRESSION")
        .or_else(|| record.fields.get("SCOPE2EXPRESSION"));
    if let Some(expr) = expr {
        if let Ok(re) = Regex::new(r"NetClass\(([^)]+)\)") {
            if let Some(caps) = re.captures(expr) {
                scope.netclass = Some(caps[1].trim_matches(|c| c == '\'' || c == '"').to_string());
                return scope;
            }
        }
    }
    scope.all = true;
    scope
}

fn object_clearance_overrides(record: &RawRuleRecord) -> Vec<((ShapeKind, ShapeKind), f64)> {
    record
        .object_clearances
        .iter()
        .filter_map(|o| Some(((shape_kind(&o.object_a)?, shape_kind(&o.object_b)?), o.clearance_mm)))
        .collect()
}

fn shape_kind(tag: &str) -> Option<ShapeKind> {
    match tag {
        "track" => Some(ShapeKind::Track),
        "pad" => Some(ShapeKind::Pad),
        "via" => Some(ShapeKind::Via),
        "poly" | "region" => Some(ShapeKind::Poly),
        _ => None,
    }
}

/// One classified rule, or `None` when the tag is unrecognized or the
/// record lacks the minimum data to build a valid rule (mirrors the
/// source's per-kind "skip invalid rules" guards).
fn classify(record: &RawRuleRecord, priority: i32) -> Option<Rule> {
    let scope = scope_from_record(record);
    let enabled = record
        .fields
        .get("ENABLED")
        .map(|v| v != "FALSE" && v != "0")
        .unwrap_or(true);
    let name = record
        .fields
        .get("NAME")
        .cloned()
        .unwrap_or_else(|| record.rule_kind_tag.clone());
    let id = format!("rule-{}", name.to_lowercase().replace(' ', "-"));

    let kind = match record.rule_kind_tag.as_str() {
        "Clearance" => {
            let min = field_f64(&record.fields, "GENERICCLEARANCE")?;
            if min <= 0.0 {
                return None;
            }
            RuleKind::Clearance(ClearanceParams {
                min_clearance_mm: min,
                object_clearances: object_clearance_overrides(record),
            })
        }
        "Width" => {
            let min = field_f64(&record.fields, "MINLIMIT")?;
            if min <= 0.0 {
                return None;
            }
            RuleKind::Width(WidthParams {
                min_width_mm: min,
                preferred_width_mm: field_f64(&record.fields, "PREFEREDWIDTH"),
                max_width_mm: field_f64(&record.fields, "MAXLIMIT"),
            })
        }
        "RoutingVias" | "Via" => {
            let min = field_f64(&record.fields, "MINHOLEWIDTH")?;
            if min <= 0.0 {
                return None;
            }
            RuleKind::Via(ViaParams {
                min_drill_mm: min,
                max_drill_mm: field_f64(&record.fields, "MAXHOLEWIDTH"),
                min_diameter_mm: None,
                max_diameter_mm: None,
                via_style: record.fields.get("STYLE").cloned(),
            })
        }
        "ShortCircuit" => RuleKind::ShortCircuit(ShortCircuitParams {
            allowed: record.fields.get("ALLOWED").map(|v| v == "TRUE").unwrap_or(false),
        }),
        "UnRoutedNet" => RuleKind::UnroutedNet(UnroutedNetParams {
            enabled: record.fields.get("ENABLED").map(|v| v != "FALSE").unwrap_or(true),
        }),
        "HoleToHoleClearance" => RuleKind::HoleToHole(HoleToHoleParams {
            min_gap_mm: field_f64(&record.fields, "GENERICCLEARANCE")?,
        }),
        "MinimumSolderMaskSliver" => RuleKind::SolderMaskSliver(SolderMaskSliverParams {
            min_gap_mm: field_f64(&record.fields, "GENERICCLEARANCE")?,
        }),
        "SilkToSolderMaskClearance" => {
            let min = field_f64(&record.fields, "GENERICCLEARANCE")?;
            if min <= 0.0 {
                return None;
            }
            RuleKind::SilkToMask(SilkClearanceParams { min_clearance_mm: min })
        }
        "SilkToSilkClearance" => {
            let min = field_f64(&record.fields, "GENERICCLEARANCE")?;
            if min <= 0.0 {
                return None;
            }
            RuleKind::SilkToSilk(SilkClearanceParams { min_clearance_mm: min })
        }
        "HeightClearance" | "ComponentHeight" => RuleKind::Height(HeightParams {
            min_mm: field_f64(&record.fields, "MINLIMIT"),
            preferred_mm: field_f64(&record.fields, "PREFEREDHEIGHT"),
            max_mm: field_f64(&record.fields, "MAXLIMIT"),
        }),
        _ => return None,
    };

    Some(Rule { id, scope, kind, enabled, priority })
}

pub fn build_cir_from_binary(records: &[RawRuleRecord]) -> Option<ConstraintIr> {
    if records.is_empty() {
        return None;
    }
    let rules: Vec<Rule> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| classify(r, (records.len() - i) as i32))
        .collect();
    if rules.is_empty() {
        None
    } else {
        Some(ConstraintIr { rules, netclasses: Vec::new() })
    }
}

/// `design_rules.json` companion: `clearance_rules`, `width_rules`,
/// `netclasses` arrays (spec.md §2 supplemented-features "exporter
/// round-trip", and `adapters/altium/importer.py::import_design_rules`).
pub fn build_cir_from_companion(companion: &CompanionData) -> Option<ConstraintIr> {
    let data = companion.design_rules.as_ref()?;
    let mut rules = Vec::new();

    for (i, rule) in companion::get_array(data, "clearance_rules").iter().enumerate() {
        if !companion::get_bool(rule, "enabled", true) {
            continue;
        }
        let min = companion::get_f64(rule, &["minimum_mm", "min_clearance_mm"], 0.2);
        rules.push(Rule {
            id: companion::get_str(rule, &["id"], &format!("rule-clearance-{i}")).to_string(),
            scope: companion_scope(rule),
            kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: min, object_clearances: Vec::new() }),
            enabled: true,
            priority: 0,
        });
    }

    for (i, rule) in companion::get_array(data, "width_rules").iter().enumerate() {
        if !companion::get_bool(rule, "enabled", true) {
            continue;
        }
        rules.push(Rule {
            id: companion::get_str(rule, &["id"], &format!("rule-width-{i}")).to_string(),
            scope: companion_scope(rule),
            kind: RuleKind::Width(WidthParams {
                min_width_mm: companion::get_f64(rule, &["min_width_mm"], 0.25),
                preferred_width_mm: Some(companion::get_f64(
                    rule,
                    &["preferred_width_mm", "default_width_mm"],
                    0.3,
                )),
                max_width_mm: None,
            }),
            enabled: true,
            priority: 0,
        });
    }

    let netclasses = companion::get_array(data, "netclasses")
        .iter()
        .map(|nc| {
            let name = companion::get_str(nc, &["name"], "").to_string();
            Netclass {
                id: format!("nc-{}", name.to_lowercase().replace(' ', "-")),
                nets: companion::get_array(nc, "nets")
                    .iter()
                    .filter_map(Value::as_str)
                    .map(crate::ids::net_id)
                    .collect(),
                name,
                defaults: NetclassDefaults {
                    trace_width_mm: Some(companion::get_f64(nc, &["default_width_mm"], 0.3)),
                    clearance_mm: Some(companion::get_f64(nc, &["default_clearance_mm"], 0.2)),
                    via_size_mm: None,
                },
            }
        })
        .collect();

    if rules.is_empty() && netclasses.is_empty() {
        None
    } else {
        Some(ConstraintIr { rules, netclasses })
    }
}

fn companion_scope(rule: &Value) -> RuleScope {
    let mut scope = RuleScope::default();
    if let Some(netclass) = rule.get("net_class").and_then(Value::as_str) {
        scope.netclass = Some(netclass.to_string());
        return scope;
    }
    if let Some(nets) = rule.get("nets").and_then(Value::as_array) {
        scope.nets = Some(
            nets.iter()
                .filter_map(Value::as_str)
                .map(crate::ids::net_id)
                .collect(),
        );
        return scope;
    }
    scope.all = true;
    scope
}

/// Merge policy for rules (spec.md §4.3): binary rules with missing
/// `object_clearances` absorb the JSON value's own overrides; otherwise
/// the JSON-sourced rule set wins wholesale when both are present.
pub fn merge(binary: Option<ConstraintIr>, companion: Option<ConstraintIr>) -> ConstraintIr {
    match (binary, companion) {
        (Some(mut bin), Some(json)) => {
            for json_rule in &json.rules {
                if let RuleKind::Clearance(json_params) = &json_rule.kind {
                    if let Some(bin_rule) = bin
                        .rules
                        .iter_mut()
                        .find(|r| matches!(&r.kind, RuleKind::Clearance(p) if p.object_clearances.is_empty()))
                    {
                        if let RuleKind::Clearance(bin_params) = &mut bin_rule.kind {
                            bin_params.object_clearances = json_params.object_clearances.clone();
                        }
                    }
                }
            }
            bin.netclasses = json.netclasses;
            bin
        }
        (Some(bin), None) => bin,
        (None, Some(json)) => json,
        (None, None) => pcb_rules::default_ruleset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rule(tag: &str, fields: &[(&str, &str)]) -> RawRuleRecord {
        let mut map = HashMap::new();
        for (k, v) in fields {
            map.insert(k.to_string(), v.to_string());
        }
        RawRuleRecord {
            rule_kind_tag: tag.to_string(),
            fields: map,
            object_clearances: Vec::new(),
            in_named_polygon: None,
        }
    }

    #[test]
    fn classifies_clearance_and_skips_non_positive() {
        let good = rule("Clearance", &[("NAME", "Clearance"), ("GENERICCLEARANCE", "200")]);
        let bad = rule("Clearance", &[("NAME", "Bad"), ("GENERICCLEARANCE", "0")]);
        assert!(classify(&good, 0).is_some());
        assert!(classify(&bad, 0).is_none());
    }

    #[test]
    fn falls_back_to_default_ruleset_when_nothing_recovered() {
        let cir = merge(None, None);
        assert_eq!(cir.rules.len(), 5);
    }
}
