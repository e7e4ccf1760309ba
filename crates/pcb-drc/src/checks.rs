//! The individual rule-kind checks from spec.md §4.6's spatial-checks
//! table. Each function takes the whole board plus the constraint set
//! and returns whatever violations that one kind produces; `engine.rs`
//! is responsible for running all of them, ordering, and the
//! width-reliability / hybrid-mode wrapping around this layer.

use pcb_ir::cir::{ConstraintIr, RuleKind, ShapeKind};
use pcb_ir::gir::{Footprint, GeometryIr, Pad, Point, Polygon, Track, Via};
use pcb_ir::violation::{Location, Severity, Violation};
use pcb_rules::{resolve_rule, ObjectRef};

use crate::connectivity::NetGraph;
use crate::geometry::{clearance, dist_point_point, Shape};

struct Conductor<'a> {
    net: &'a str,
    net_name: &'a str,
    layers: Vec<&'a str>,
    shape: Shape,
    shape_kind: ShapeKind,
    objects: Vec<String>,
    location: Point,
    drill_mm: Option<f64>,
    reduced_fidelity: bool,
}

fn pad_shape(pad: &Pad, fp: Option<&Footprint>) -> (Shape, Point) {
    let pos = fp.map(|fp| pad.absolute_position(fp)).unwrap_or(pad.relative_position);
    let (hw, hh) = pad.half_size();
    let shape = match pad.shape {
        pcb_ir::gir::PadShape::Round => Shape::Circle { center: pos, radius: hw.max(hh) },
        _ => Shape::Rect { center: pos, half_w: hw, half_h: hh },
    };
    (shape, pos)
}

fn collect_conductors<'a>(gir: &'a GeometryIr) -> Vec<Conductor<'a>> {
    let mut out = Vec::new();

    for pad in &gir.pads {
        let Some(net) = &pad.net else { continue };
        let net_name = gir.net(net).map(|n| n.name.as_str()).unwrap_or(net.as_str());
        let fp = gir.footprint(&pad.footprint);
        let (shape, pos) = pad_shape(pad, fp);
        out.push(Conductor {
            net,
            net_name,
            layers: pad.layers.iter().map(|s| s.as_str()).collect(),
            shape,
            shape_kind: ShapeKind::Pad,
            objects: vec![pad.id.clone()],
            location: pos,
            drill_mm: pad.drill_mm,
            reduced_fidelity: false,
        });
    }

    for via in &gir.vias {
        out.push(Conductor {
            net: &via.net,
            net_name: gir.net(&via.net).map(|n| n.name.as_str()).unwrap_or(via.net.as_str()),
            layers: vec![via.span.0.as_str(), via.span.1.as_str()],
            shape: Shape::Circle { center: via.position, radius: via.diameter_mm / 2.0 },
            shape_kind: ShapeKind::Via,
            objects: vec![via.id.clone()],
            location: via.position,
            drill_mm: Some(via.drill_mm),
            reduced_fidelity: false,
        });
    }

    for track in &gir.tracks {
        let mid = ((track.from.0 + track.to.0) / 2.0, (track.from.1 + track.to.1) / 2.0);
        out.push(Conductor {
            net: &track.net,
            net_name: gir.net(&track.net).map(|n| n.name.as_str()).unwrap_or(track.net.as_str()),
            layers: vec![track.layer.as_str()],
            shape: Shape::Capsule { from: track.from, to: track.to, half_width: track.width_mm / 2.0 },
            shape_kind: ShapeKind::Track,
            objects: vec![track.id.clone()],
            location: mid,
            drill_mm: None,
            reduced_fidelity: false,
        });
    }

    for polygon in &gir.polygons {
        let net = polygon.net.as_deref().unwrap_or("");
        let net_name = polygon.net.as_deref().and_then(|n| gir.net(n)).map(|n| n.name.as_str()).unwrap_or(net);
        let reduced = polygon.copper_regions.as_ref().map(|r| r.is_empty()).unwrap_or(true);
        if reduced {
            tracing::warn!(polygon = %polygon.id, "clearance check falling back to polygon outline; no copper_regions available (reduced fidelity)");
        }
        for region in polygon.clearance_shape() {
            let centroid = centroid_of(region);
            out.push(Conductor {
                net,
                net_name,
                layers: vec![polygon.layer.as_str()],
                shape: Shape::Polygon { outline: region.clone() },
                shape_kind: ShapeKind::Poly,
                objects: vec![polygon.id.clone()],
                location: centroid,
                drill_mm: None,
                reduced_fidelity: reduced,
            });
        }
    }

    out
}

fn centroid_of(points: &[Point]) -> Point {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (sx, sy) = points.iter().fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    (sx / points.len() as f64, sy / points.len() as f64)
}

fn shares_layer(a: &[&str], b: &[&str]) -> bool {
    a.iter().any(|l| b.contains(l))
}

fn object_ref_for<'a>(c: &Conductor<'a>) -> ObjectRef {
    ObjectRef {
        net_id: Some(c.net.to_string()),
        net_name: Some(c.net_name.to_string()),
        netclass: None,
        component_ref: None,
        layer_id: c.layers.first().map(|l| l.to_string()),
        position: Some(c.location),
    }
}

fn location_for(c: &Conductor) -> Location {
    Location::point(c.location, c.layers.first().map(|l| l.to_string()))
}

/// spec.md §4.6 clearance: every unordered pair of objects on
/// overlapping layers and different nets, flagged when the gap is
/// below the applicable rule (or its per-object-pair override).
pub fn check_clearance(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let conductors = collect_conductors(gir);
    let mut violations = Vec::new();

    for i in 0..conductors.len() {
        for j in (i + 1)..conductors.len() {
            let a = &conductors[i];
            let b = &conductors[j];
            if a.net == b.net || !shares_layer(&a.layers, &b.layers) {
                continue;
            }
            let obj = object_ref_for(a);
            let Some(rule) = resolve_rule(cir, "clearance", &obj, gir) else { continue };
            let RuleKind::Clearance(params) = &rule.kind else { continue };
            let limit = params.limit_for(a.shape_kind, b.shape_kind);
            let gap = clearance(&a.shape, &b.shape);
            if gap < limit {
                let midpoint = ((a.location.0 + b.location.0) / 2.0, (a.location.1 + b.location.1) / 2.0);
                let layer = a.layers.first().map(|l| l.to_string());
                let location = Location::point(midpoint, layer);
                let mut objects = a.objects.clone();
                objects.extend(b.objects.clone());
                violations.push(Violation {
                    rule_id: rule.id.clone(),
                    rule_kind: "clearance".into(),
                    severity: Severity::Error,
                    message: format!(
                        "clearance {:.3}mm between {:?} and {:?} is below the required {:.3}mm",
                        gap, a.objects, b.objects, limit
                    ),
                    location,
                    actual_value: Some(gap),
                    required_value: Some(limit),
                    objects,
                    net: None,
                    component: None,
                    rule_priority: rule.priority,
                });
                if a.reduced_fidelity || b.reduced_fidelity {
                    tracing::debug!(rule = %rule.id, "clearance violation involves a polygon checked against its raw outline");
                }
            }
        }
    }

    violations
}

/// spec.md §4.6 short-circuit: two conductors on different nets whose
/// shapes overlap (non-positive clearance).
pub fn check_short_circuit(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let obj = ObjectRef::default();
    let Some(rule) = resolve_rule(cir, "short_circuit", &obj, gir) else { return Vec::new() };
    let RuleKind::ShortCircuit(params) = &rule.kind else { return Vec::new() };
    if params.allowed {
        return Vec::new();
    }

    let conductors = collect_conductors(gir);
    let mut violations = Vec::new();
    for i in 0..conductors.len() {
        for j in (i + 1)..conductors.len() {
            let a = &conductors[i];
            let b = &conductors[j];
            if a.net == b.net || !shares_layer(&a.layers, &b.layers) {
                continue;
            }
            let gap = clearance(&a.shape, &b.shape);
            if gap <= 0.0 {
                let mut location = location_for(a);
                location.points.push(b.location);
                let mut objects = a.objects.clone();
                objects.extend(b.objects.clone());
                violations.push(Violation {
                    rule_id: rule.id.clone(),
                    rule_kind: "short_circuit".into(),
                    severity: Severity::Error,
                    message: format!("nets {} and {} short: objects overlap", a.net_name, b.net_name),
                    location,
                    actual_value: Some(gap),
                    required_value: Some(0.0),
                    objects,
                    net: Some(format!("{}/{}", a.net_name, b.net_name)),
                    component: None,
                    rule_priority: rule.priority,
                });
            }
        }
    }
    violations
}

/// spec.md §4.6 hole-to-hole: clearance restricted to drilled shapes
/// (vias and through-pads), regardless of net.
pub fn check_hole_to_hole(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let holes: Vec<Conductor> = collect_conductors(gir).into_iter().filter(|c| c.drill_mm.is_some()).collect();
    let mut violations = Vec::new();

    for i in 0..holes.len() {
        for j in (i + 1)..holes.len() {
            let a = &holes[i];
            let b = &holes[j];
            let obj = object_ref_for(a);
            let Some(rule) = resolve_rule(cir, "hole_to_hole", &obj, gir) else { continue };
            let RuleKind::HoleToHole(params) = &rule.kind else { continue };
            let ra = a.drill_mm.unwrap() / 2.0;
            let rb = b.drill_mm.unwrap() / 2.0;
            let gap = dist_point_point(a.location, b.location) - ra - rb;
            if gap > 0.0 && gap < params.min_gap_mm {
                let mut objects = a.objects.clone();
                objects.extend(b.objects.clone());
                let mut location = location_for(a);
                location.points.push(b.location);
                violations.push(Violation {
                    rule_id: rule.id.clone(),
                    rule_kind: "hole_to_hole".into(),
                    severity: Severity::Error,
                    message: format!("hole-to-hole clearance {:.3}mm is below the required {:.3}mm", gap, params.min_gap_mm),
                    location,
                    actual_value: Some(gap),
                    required_value: Some(params.min_gap_mm),
                    objects,
                    net: None,
                    component: None,
                    rule_priority: rule.priority,
                });
            }
        }
    }
    violations
}

/// spec.md §4.6 width: each track segment's stored width against the
/// applicable rule's min/max. Skipped entirely by the caller when
/// `reliable` is false.
pub fn check_width(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let mut violations = Vec::new();
    for track in &gir.tracks {
        if track.width_mm <= 0.0 {
            continue;
        }
        let obj = ObjectRef {
            net_id: Some(track.net.clone()),
            layer_id: Some(track.layer.clone()),
            position: Some(track.from),
            ..Default::default()
        };
        let Some(rule) = resolve_rule(cir, "width", &obj, gir) else { continue };
        let RuleKind::Width(params) = &rule.kind else { continue };
        if track.width_mm < params.min_width_mm {
            violations.push(width_violation(rule.id.clone(), rule.priority, track, track.width_mm, params.min_width_mm, "below minimum"));
        } else if let Some(max) = params.max_width_mm {
            if track.width_mm > max {
                violations.push(width_violation(rule.id.clone(), rule.priority, track, track.width_mm, max, "exceeds maximum"));
            }
        }
    }
    violations
}

fn width_violation(rule_id: String, priority: i32, track: &Track, actual: f64, required: f64, qualifier: &str) -> Violation {
    Violation {
        rule_id,
        rule_kind: "width".into(),
        severity: Severity::Error,
        message: format!("track {} width {:.3}mm {} {:.3}mm", track.id, actual, qualifier, required),
        location: Location::point(track.from, Some(track.layer.clone())),
        actual_value: Some(actual),
        required_value: Some(required),
        objects: vec![track.id.clone()],
        net: Some(track.net.clone()),
        component: None,
        rule_priority: priority,
    }
}

/// spec.md §4.6 hole-size: each via's drill and each through-pad's
/// drill against the applicable rule's min/max.
pub fn check_hole_size(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let mut violations = Vec::new();

    for via in &gir.vias {
        let obj = ObjectRef { net_id: Some(via.net.clone()), position: Some(via.position), ..Default::default() };
        let Some(rule) = resolve_rule(cir, "via", &obj, gir) else { continue };
        let RuleKind::Via(params) = &rule.kind else { continue };
        if via.drill_mm > 0.0 && via.drill_mm < params.min_drill_mm {
            violations.push(hole_size_violation(
                rule.id.clone(),
                rule.priority,
                via.id.clone(),
                via.position,
                via.drill_mm,
                params.min_drill_mm,
                "via",
                "below minimum",
                None,
            ));
        } else if let Some(max) = params.max_drill_mm {
            if via.drill_mm > max {
                violations.push(hole_size_violation(
                    rule.id.clone(),
                    rule.priority,
                    via.id.clone(),
                    via.position,
                    via.drill_mm,
                    max,
                    "via",
                    "exceeds maximum",
                    None,
                ));
            }
        }
    }

    for pad in &gir.pads {
        let Some(drill) = pad.drill_mm else { continue };
        let Some(net) = &pad.net else { continue };
        let obj = ObjectRef { net_id: Some(net.clone()), position: Some(pad.relative_position), ..Default::default() };
        let Some(rule) = resolve_rule(cir, "via", &obj, gir) else { continue };
        let RuleKind::Via(params) = &rule.kind else { continue };
        let fp = gir.footprint(&pad.footprint);
        let pos = fp.map(|fp| pad.absolute_position(fp)).unwrap_or(pad.relative_position);
        if drill > 0.0 && drill < params.min_drill_mm {
            violations.push(hole_size_violation(
                rule.id.clone(),
                rule.priority,
                pad.id.clone(),
                pos,
                drill,
                params.min_drill_mm,
                "pad",
                "below minimum",
                fp.map(|f| f.reference.clone()),
            ));
        }
    }

    violations
}

#[allow(clippy::too_many_arguments)]
fn hole_size_violation(
    rule_id: String,
    priority: i32,
    object_id: String,
    pos: Point,
    actual: f64,
    required: f64,
    object_kind: &str,
    qualifier: &str,
    component: Option<String>,
) -> Violation {
    Violation {
        rule_id,
        rule_kind: "hole_size".into(),
        severity: Severity::Error,
        message: format!("{object_kind} {object_id} hole size {actual:.3}mm {qualifier} {required:.3}mm"),
        location: Location::point(pos, None),
        actual_value: Some(actual),
        required_value: Some(required),
        objects: vec![object_id],
        net: None,
        component,
        rule_priority: priority,
    }
}

/// spec.md §4.6 unrouted-net: a net with ≥2 pads is unrouted unless a
/// path connects all its pads.
pub fn check_unrouted_net(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let obj = ObjectRef::default();
    let Some(rule) = resolve_rule(cir, "unrouted_net", &obj, gir) else { return Vec::new() };
    let RuleKind::UnroutedNet(params) = &rule.kind else { return Vec::new() };
    if !params.enabled {
        return Vec::new();
    }

    let mut violations = Vec::new();
    for net in &gir.nets {
        let pad_count = gir.pads.iter().filter(|p| p.net.as_deref() == Some(net.id.as_str())).count();
        if pad_count < 2 {
            continue;
        }
        let mut graph = NetGraph::build(gir, &net.id);
        if graph.fully_connected() {
            continue;
        }
        violations.push(Violation {
            rule_id: rule.id.clone(),
            rule_kind: "unrouted_net".into(),
            severity: Severity::Error,
            message: format!("net '{}' has {pad_count} pad(s) but is not fully routed", net.name),
            location: Location { points: vec![], layer: None },
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: Some(net.name.clone()),
            component: None,
            rule_priority: rule.priority,
        });
    }
    violations
}

/// spec.md §4.6 net-antennae: a routed net has an antenna if a track
/// endpoint is touched by exactly one segment and isn't at a pad, via,
/// or polygon pour (within the rule's tolerance).
pub fn check_net_antennae(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let obj = ObjectRef::default();
    let Some(rule) = resolve_rule(cir, "net_antennae", &obj, gir) else { return Vec::new() };
    let RuleKind::NetAntennae(params) = &rule.kind else { return Vec::new() };

    let mut violations = Vec::new();
    for net in &gir.nets {
        let graph = NetGraph::build(gir, &net.id);
        for point in graph.dangling_track_endpoints(gir, &net.id, params.tolerance_mm) {
            violations.push(Violation {
                rule_id: rule.id.clone(),
                rule_kind: "net_antennae".into(),
                severity: Severity::Warning,
                message: format!("net '{}' has a dangling stub at ({:.3}, {:.3})", net.name, point.0, point.1),
                location: Location::point(point, None),
                actual_value: None,
                required_value: None,
                objects: vec![],
                net: Some(net.name.clone()),
                component: None,
                rule_priority: rule.priority,
            });
        }
    }
    violations
}

/// spec.md §4.6: "mask sliver, silk-to-*, height, modified-polygon are
/// straightforward predicates ... skipped when the threshold is zero
/// or unset." Solder mask sliver has supporting geometry (pad
/// spacing); silk-to-* and height don't have the underlying geometry
/// in G-IR (no silkscreen outlines, no component height field), so
/// those always report clean, matching the python engine's own
/// "skip — no geometry to check" fallback for silk.
pub fn check_solder_mask_sliver(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let obj = ObjectRef::default();
    let Some(rule) = resolve_rule(cir, "solder_mask_sliver", &obj, gir) else { return Vec::new() };
    let RuleKind::SolderMaskSliver(params) = &rule.kind else { return Vec::new() };
    if params.min_gap_mm <= 0.0 {
        return Vec::new();
    }

    let conductors: Vec<Conductor> = collect_conductors(gir).into_iter().filter(|c| c.shape_kind == ShapeKind::Pad).collect();
    let mut violations = Vec::new();
    for i in 0..conductors.len() {
        for j in (i + 1)..conductors.len() {
            let a = &conductors[i];
            let b = &conductors[j];
            if !shares_layer(&a.layers, &b.layers) {
                continue;
            }
            let gap = clearance(&a.shape, &b.shape);
            if gap > 0.0 && gap < params.min_gap_mm {
                let mut objects = a.objects.clone();
                objects.extend(b.objects.clone());
                let mut location = location_for(a);
                location.points.push(b.location);
                violations.push(Violation {
                    rule_id: rule.id.clone(),
                    rule_kind: "solder_mask_sliver".into(),
                    severity: Severity::Error,
                    message: format!("solder mask sliver {:.3}mm is below the required {:.3}mm", gap, params.min_gap_mm),
                    location,
                    actual_value: Some(gap),
                    required_value: Some(params.min_gap_mm),
                    objects,
                    net: None,
                    component: None,
                    rule_priority: rule.priority,
                });
            }
        }
    }
    violations
}

/// spec.md §4.6 modified-polygon: flags polygons marked modified or
/// shelved, unless the rule allows them.
pub fn check_modified_polygon(gir: &GeometryIr, cir: &ConstraintIr) -> Vec<Violation> {
    let obj = ObjectRef::default();
    let Some(rule) = resolve_rule(cir, "modified_polygon", &obj, gir) else { return Vec::new() };
    let RuleKind::ModifiedPolygon(params) = &rule.kind else { return Vec::new() };

    let mut violations = Vec::new();
    for polygon in &gir.polygons {
        if polygon.modified && !params.allow_modified {
            violations.push(polygon_violation(rule.id.clone(), rule.priority, polygon, "modified"));
        }
        if polygon.shelved && !params.allow_shelved {
            violations.push(polygon_violation(rule.id.clone(), rule.priority, polygon, "shelved"));
        }
    }
    violations
}

fn polygon_violation(rule_id: String, priority: i32, polygon: &Polygon, reason: &str) -> Violation {
    Violation {
        rule_id,
        rule_kind: "modified_polygon".into(),
        severity: Severity::Error,
        message: format!("polygon '{}' is {reason}, which this ruleset disallows", polygon.name),
        location: Location { points: centroid_location(polygon), layer: Some(polygon.layer.clone()) },
        actual_value: None,
        required_value: None,
        objects: vec![polygon.id.clone()],
        net: polygon.net.clone(),
        component: None,
        rule_priority: priority,
    }
}

fn centroid_location(polygon: &Polygon) -> Vec<Point> {
    vec![centroid_of(&polygon.outline)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::cir::{ClearanceParams, Rule, RuleScope};

    fn gir_two_pads_close(net_a: &str, net_b: &str, dx: f64) -> GeometryIr {
        GeometryIr {
            board: None,
            nets: vec![
                pcb_ir::gir::Net { id: net_a.into(), name: net_a.into(), netclass: None },
                pcb_ir::gir::Net { id: net_b.into(), name: net_b.into(), netclass: None },
            ],
            footprints: vec![],
            pads: vec![
                pcb_ir::gir::Pad {
                    id: "p1".into(),
                    footprint: "fp-missing".into(),
                    net: Some(net_a.into()),
                    shape: pcb_ir::gir::PadShape::Round,
                    size: (0.5, 0.5),
                    drill_mm: None,
                    layers: vec!["L1".into()],
                    relative_position: (0.0, 0.0),
                },
                pcb_ir::gir::Pad {
                    id: "p2".into(),
                    footprint: "fp-missing".into(),
                    net: Some(net_b.into()),
                    shape: pcb_ir::gir::PadShape::Round,
                    size: (0.5, 0.5),
                    drill_mm: None,
                    layers: vec!["L1".into()],
                    relative_position: (dx, 0.0),
                },
            ],
            tracks: vec![],
            vias: vec![],
            polygons: vec![],
        }
    }

    fn cir_with_clearance(min_mm: f64) -> ConstraintIr {
        ConstraintIr {
            rules: vec![Rule {
                id: "clearance-default".into(),
                scope: RuleScope { all: true, ..Default::default() },
                kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: min_mm, object_clearances: vec![] }),
                enabled: true,
                priority: 0,
            }],
            netclasses: vec![],
        }
    }

    #[test]
    fn clearance_check_flags_close_pads_on_different_nets() {
        // centers 0.6mm apart, radius 0.25mm each -> 0.1mm gap, below 0.2mm
        let gir = gir_two_pads_close("net-a", "net-b", 0.6);
        let cir = cir_with_clearance(0.2);
        let violations = check_clearance(&gir, &cir);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_kind, "clearance");
    }

    #[test]
    fn clearance_check_flags_overlapping_pads_with_negative_actual() {
        // centers 0.25mm apart, radius 0.25mm each -> -0.25mm gap (overlap)
        let gir = gir_two_pads_close("net-a", "net-b", 0.25);
        let cir = cir_with_clearance(0.2);
        let violations = check_clearance(&gir, &cir);
        assert_eq!(violations.len(), 1);
        let actual = violations[0].actual_value.unwrap();
        assert!((actual - (-0.25)).abs() < 1e-9, "expected actual ~= -0.25mm, got {actual}");
        assert_eq!(violations[0].location.points[0], (0.125, 0.0));
    }

    #[test]
    fn clearance_check_ignores_same_net_pads() {
        let gir = gir_two_pads_close("net-a", "net-a", 0.6);
        let cir = cir_with_clearance(0.2);
        assert!(check_clearance(&gir, &cir).is_empty());
    }

    #[test]
    fn short_circuit_flags_overlapping_different_net_pads() {
        let gir = gir_two_pads_close("net-a", "net-b", 0.1);
        let cir = ConstraintIr {
            rules: vec![Rule {
                id: "sc".into(),
                scope: RuleScope { all: true, ..Default::default() },
                kind: RuleKind::ShortCircuit(pcb_ir::cir::ShortCircuitParams { allowed: false }),
                enabled: true,
                priority: 0,
            }],
            netclasses: vec![],
        };
        assert_eq!(check_short_circuit(&gir, &cir).len(), 1);
    }
}
