//! Export direction: G-IR/C-IR back out to the JSON shapes the external
//! applicator's scripting API consumes (spec.md §2 supplemented feature,
//! grounded directly on `adapters/altium/exporter.py`'s
//! `export_pcb_info`/`export_design_rules`). This is the write side of
//! the round trip `pcb-client` drives when applying a [`pcb_ir::Patch`].

use pcb_ir::cir::{ConstraintIr, RuleKind};
use pcb_ir::gir::GeometryIr;
use serde_json::{json, Value};

const DEFAULT_WIDTH_MM: f64 = 100.0;
const DEFAULT_HEIGHT_MM: f64 = 80.0;

/// Mirrors `AltiumExporter.export_pcb_info`: bounding box from the board
/// outline (falling back to the documented 100x80mm default when empty),
/// plus flattened component/net/track/via summaries.
pub fn export_pcb_info(gir: &GeometryIr) -> Value {
    let (width_mm, height_mm) = match gir.board.as_ref().map(|b| b.outline.as_slice()) {
        Some(points) if !points.is_empty() => {
            let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
            let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
            let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
            (max_x - min_x, max_y - min_y)
        }
        _ => (DEFAULT_WIDTH_MM, DEFAULT_HEIGHT_MM),
    };

    let components: Vec<Value> = gir
        .footprints
        .iter()
        .map(|fp| {
            json!({
                "designator": fp.reference,
                "x_mm": fp.position.0,
                "y_mm": fp.position.1,
                "rotation": fp.rotation_deg,
                "layer": gir.board.as_ref().and_then(|b| b.layer(&fp.layer)).map(|l| l.name.clone()),
                "pattern": fp.library_name,
            })
        })
        .collect();

    let nets: Vec<Value> = gir.nets.iter().map(|n| json!({ "name": n.name })).collect();

    // "for MVP" in the source: one representative segment per track.
    let tracks: Vec<Value> = gir
        .tracks
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "net": gir.net(&t.net).map(|n| n.name.clone()),
                "layer": gir.board.as_ref().and_then(|b| b.layer(&t.layer)).map(|l| l.name.clone()),
                "x1_mm": t.from.0,
                "y1_mm": t.from.1,
                "x2_mm": t.to.0,
                "y2_mm": t.to.1,
                "width_mm": t.width_mm,
            })
        })
        .collect();

    let vias: Vec<Value> = gir
        .vias
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "net": gir.net(&v.net).map(|n| n.name.clone()),
                "x_mm": v.position.0,
                "y_mm": v.position.1,
                "hole_size_mm": v.drill_mm,
                "diameter_mm": v.diameter_mm,
            })
        })
        .collect();

    json!({
        "board_size": { "width_mm": width_mm, "height_mm": height_mm },
        "board_thickness_mm": gir.board.as_ref().map(|b| b.stackup.thickness_mm).unwrap_or(1.6),
        "layers": gir.board.as_ref().map(|b| b.layers.iter().map(|l| l.name.clone()).collect::<Vec<_>>()).unwrap_or_default(),
        "statistics": {
            "component_count": gir.footprints.len(),
            "net_count": gir.nets.len(),
            "track_count": gir.tracks.len(),
            "via_count": gir.vias.len(),
        },
        "components": components,
        "nets": nets,
        "tracks": tracks,
        "vias": vias,
    })
}

/// Mirrors `AltiumExporter.export_design_rules`: strips the `net-` ID
/// prefix back off before handing names to the scripting API, and fills
/// in the same param defaults (clearance 0.2mm, width 0.25/0.3mm) when a
/// rule's own params are absent.
pub fn export_design_rules(cir: &ConstraintIr) -> Value {
    let mut clearance_rules = Vec::new();
    let mut width_rules = Vec::new();

    for rule in &cir.rules {
        match &rule.kind {
            RuleKind::Clearance(params) => {
                clearance_rules.push(json!({
                    "id": rule.id,
                    "enabled": rule.enabled,
                    "minimum_mm": if params.min_clearance_mm > 0.0 { params.min_clearance_mm } else { 0.2 },
                    "net_class": rule.scope.netclass,
                    "nets": rule.scope.nets.as_ref().map(|nets| nets.iter().map(|n| strip_net_prefix(n)).collect::<Vec<_>>()),
                }));
            }
            RuleKind::Width(params) => {
                width_rules.push(json!({
                    "id": rule.id,
                    "enabled": rule.enabled,
                    "min_width_mm": if params.min_width_mm > 0.0 { params.min_width_mm } else { 0.25 },
                    "preferred_width_mm": params.preferred_width_mm.unwrap_or(0.3),
                    "net_class": rule.scope.netclass,
                    "nets": rule.scope.nets.as_ref().map(|nets| nets.iter().map(|n| strip_net_prefix(n)).collect::<Vec<_>>()),
                }));
            }
            _ => {}
        }
    }

    let netclasses: Vec<Value> = cir
        .netclasses
        .iter()
        .map(|nc| {
            json!({
                "name": nc.name,
                "nets": nc.nets.iter().map(|n| strip_net_prefix(n)).collect::<Vec<_>>(),
                "default_width_mm": nc.defaults.trace_width_mm.unwrap_or(0.3),
                "default_clearance_mm": nc.defaults.clearance_mm.unwrap_or(0.2),
            })
        })
        .collect();

    json!({
        "clearance_rules": clearance_rules,
        "width_rules": width_rules,
        "netclasses": netclasses,
    })
}

fn strip_net_prefix(net_id: &str) -> String {
    net_id.strip_prefix("net-").unwrap_or(net_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::gir::{Board, Stackup};

    #[test]
    fn export_pcb_info_defaults_to_100x80_when_outline_empty() {
        let gir = GeometryIr {
            board: Some(Board {
                outline: Vec::new(),
                layers: Vec::new(),
                stackup: Stackup { layer_order: vec![], thickness_mm: 1.6, dielectrics: vec![] },
            }),
            ..Default::default()
        };
        let info = export_pcb_info(&gir);
        assert_eq!(info["board_size"]["width_mm"], 100.0);
        assert_eq!(info["board_size"]["height_mm"], 80.0);
    }

    #[test]
    fn export_design_rules_strips_net_prefix() {
        assert_eq!(strip_net_prefix("net-vcc"), "vcc");
    }
}
