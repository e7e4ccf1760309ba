//! Auto-fix orchestration (spec.md §4.7), grounded on
//! `auto_fix_engine.py`'s `fix_violations`/`_fix_single_violation`: one
//! safest-first pass over an ordered violation list, producing a typed
//! patch plus a log of what happened to every violation it looked at.

use std::collections::HashSet;

use pcb_client::AltiumClient;
use pcb_ir::cir::{ConstraintIr, RuleKind};
use pcb_ir::gir::GeometryIr;
use pcb_ir::patch::{EditOp, Patch};
use pcb_ir::violation::Violation;
use uuid::Uuid;

use crate::error::AutoFixError;
use crate::outcome::{FixLogEntry, FixOutcome};
use crate::routing;

const DEFAULT_MIN_CLEARANCE_MM: f64 = 0.2;
const DEFAULT_TRACK_WIDTH_MM: f64 = 0.254;
const DEFAULT_LAYER: &str = "Top";
const MAX_ROUTES_PER_NET: usize = 3;
const NEAREST_COMPONENT_RADIUS_MM: f64 = 10.0;

pub struct FixRun {
    pub patch: Patch,
    pub log: Vec<FixLogEntry>,
}

/// Runs one fix pass. `client`, when present, applies each edit op live
/// against the real applicator (so a second L-detour leg that actually
/// fails can trigger a rollback of the first); when absent, ops that
/// pass the geometric safety guard are simply appended to the patch —
/// the only verification an offline pass can do.
pub fn fix_violations(
    violations: &[Violation],
    gir: &GeometryIr,
    cir: &ConstraintIr,
    board_artifact: Uuid,
    from_version: u64,
    client: Option<&AltiumClient>,
) -> Result<FixRun, AutoFixError> {
    let min_clearance_mm = min_clearance_guard(cir);
    let unrouted_nets: HashSet<String> = violations
        .iter()
        .filter(|v| v.rule_kind == "unrouted_net")
        .filter_map(|v| v.net.clone())
        .collect();

    let mut ordered: Vec<&Violation> = violations.iter().collect();
    ordered.sort_by_key(|v| fix_priority(&v.rule_kind));

    let mut operations = Vec::new();
    let mut log = Vec::new();

    for violation in ordered {
        let outcomes = match violation.rule_kind.as_str() {
            "net_antennae" => vec![fix_net_antennae(violation, gir, &unrouted_nets, client)?],
            "unrouted_net" => fix_unrouted_net(violation, gir, min_clearance_mm, client)?,
            "clearance" => vec![fix_clearance(violation, gir)],
            "width" => vec![(None, FixOutcome::Manual { reason: "width fix requires track resize; manual fix in the PCB tool".into() })],
            other => vec![(None, FixOutcome::Manual { reason: format!("no auto-fix for rule kind '{other}'") })],
        };

        for (op, outcome) in outcomes {
            if let Some(op) = op {
                operations.push(op);
            }
            log.push(FixLogEntry { rule_kind: violation.rule_kind.clone(), net: violation.net.clone(), outcome });
        }
    }

    let patch = Patch {
        from_version,
        to_version: from_version + 1,
        board_artifact,
        operations,
        explanation: format!("auto-fix pass over {} violation(s)", violations.len()),
    };
    Ok(FixRun { patch, log })
}

fn fix_priority(rule_kind: &str) -> u8 {
    match rule_kind {
        "net_antennae" => 0,
        "unrouted_net" => 1,
        "clearance" => 2,
        "width" => 3,
        _ => 9,
    }
}

fn min_clearance_guard(cir: &ConstraintIr) -> f64 {
    let values: Vec<f64> = cir
        .enabled_rules_named("clearance")
        .into_iter()
        .filter_map(|r| match &r.kind {
            RuleKind::Clearance(params) if params.min_clearance_mm > 0.0 => Some(params.min_clearance_mm),
            _ => None,
        })
        .collect();
    values.into_iter().fold(None, |min, v| Some(min.map_or(v, |m: f64| m.min(v)))).unwrap_or(DEFAULT_MIN_CLEARANCE_MM)
}

type FixResult = (Option<EditOp>, FixOutcome);

fn fix_net_antennae(
    violation: &Violation,
    gir: &GeometryIr,
    unrouted_nets: &HashSet<String>,
    client: Option<&AltiumClient>,
) -> Result<FixResult, AutoFixError> {
    let Some(net_name) = &violation.net else {
        return Ok((None, FixOutcome::Rejected { reason: "antenna violation has no net".into() }));
    };
    if unrouted_nets.contains(net_name) {
        return Ok((None, FixOutcome::Manual { reason: format!("antenna on '{net_name}' will be resolved when the net is routed") }));
    }

    let Some(net) = gir.nets.iter().find(|n| &n.name == net_name) else {
        return Ok((None, FixOutcome::Rejected { reason: format!("unknown net '{net_name}'") }));
    };
    let stub_point = violation.location.points.first().copied();
    let Some(stub_point) = stub_point.or_else(|| crate::parsing::parse_track_coords(&violation.message).map(|(a, _)| a)) else {
        return Ok((None, FixOutcome::Rejected { reason: format!("cannot locate antenna track coordinates: {}", violation.message) }));
    };

    let epsilon = 1e-3;
    let same_point = |a: (f64, f64), b: (f64, f64)| {
        let (dx, dy) = (a.0 - b.0, a.1 - b.1);
        (dx * dx + dy * dy).sqrt() <= epsilon
    };
    let Some(track) = gir.tracks.iter().find(|t| t.net == net.id && (same_point(t.from, stub_point) || same_point(t.to, stub_point))) else {
        return Ok((None, FixOutcome::Rejected { reason: format!("no track endpoint near ({:.3}, {:.3}) on net '{net_name}'", stub_point.0, stub_point.1) }));
    };

    let op = EditOp::DeleteTrack { from: track.from, to: track.to };
    if let Some(client) = client {
        let request = pcb_client::protocol::delete_track_by_endpoints(track.from.0, track.from.1, track.to.0, track.to.1);
        match client.send(request) {
            Ok(_) => Ok((Some(op), FixOutcome::Applied)),
            Err(pcb_client::ClientError::ContainerUnreachable { action, timeout }) => {
                Err(AutoFixError::ClientUnreachable(pcb_client::ClientError::ContainerUnreachable { action, timeout }))
            }
            Err(e) => Ok((None, FixOutcome::Rejected { reason: e.to_string() })),
        }
    } else {
        Ok((Some(op), FixOutcome::Applied))
    }
}

fn fix_unrouted_net(
    violation: &Violation,
    gir: &GeometryIr,
    min_clearance_mm: f64,
    client: Option<&AltiumClient>,
) -> Result<Vec<FixResult>, AutoFixError> {
    let Some(net_name) = &violation.net else {
        return Ok(vec![(None, FixOutcome::Rejected { reason: "unrouted-net violation has no net".into() })]);
    };
    let Some(net) = gir.nets.iter().find(|n| &n.name == net_name) else {
        return Ok(vec![(None, FixOutcome::Rejected { reason: format!("unknown net '{net_name}'") })]);
    };

    let mut graph = pcb_drc::connectivity::NetGraph::build(gir, &net.id);
    let mut missing = graph.missing_connections();
    if missing.is_empty() {
        if let Some((from, to)) = crate::parsing::parse_unrouted_endpoints(&violation.message) {
            missing.push((from, to));
        }
    }
    if missing.is_empty() {
        return Ok(vec![(None, FixOutcome::Manual { reason: format!("no routable endpoints for net '{net_name}'") })]);
    }

    let (width_mm, layer) = inherited_track_style(gir, &net.id);

    let mut results = Vec::new();
    for (from, to) in missing.into_iter().take(MAX_ROUTES_PER_NET) {
        results.extend(route_one_connection(&net.id, net_name, from, to, width_mm, &layer, gir, min_clearance_mm, client)?);
    }
    Ok(results)
}

fn inherited_track_style(gir: &GeometryIr, net_id: &str) -> (f64, String) {
    let net_tracks: Vec<_> = gir.tracks.iter().filter(|t| t.net == net_id).collect();
    let width = net_tracks.iter().map(|t| t.width_mm).find(|w| *w > 0.0).unwrap_or(DEFAULT_TRACK_WIDTH_MM);
    let layer = net_tracks.iter().map(|t| t.layer.clone()).find(|l| !l.is_empty()).unwrap_or_else(|| DEFAULT_LAYER.to_string());
    (width, layer)
}

/// Returns one `FixResult` for a direct route, or two (one per leg) for
/// a successful L-detour — the caller folds both into the patch/log.
fn route_one_connection(
    net_id: &str,
    net_name: &str,
    from: (f64, f64),
    to: (f64, f64),
    width_mm: f64,
    layer: &str,
    gir: &GeometryIr,
    min_clearance_mm: f64,
    client: Option<&AltiumClient>,
) -> Result<Vec<FixResult>, AutoFixError> {
    if routing::is_direct_route_safe(net_id, from, to, width_mm, gir, min_clearance_mm) {
        return Ok(vec![add_track(net_name, layer, from, to, width_mm, client)?]);
    }

    for pivot in routing::l_shape_pivots(from, to) {
        if routing::is_degenerate_pivot(pivot, from, to) {
            continue;
        }
        if !routing::is_direct_route_safe(net_id, from, pivot, width_mm, gir, min_clearance_mm) {
            continue;
        }
        if !routing::is_direct_route_safe(net_id, pivot, to, width_mm, gir, min_clearance_mm) {
            continue;
        }

        let first = add_track(net_name, layer, from, pivot, width_mm, client)?;
        if !matches!(first.1, FixOutcome::Applied) {
            continue;
        }
        let second = add_track(net_name, layer, pivot, to, width_mm, client)?;
        if matches!(second.1, FixOutcome::Applied) {
            return Ok(vec![first, second]);
        }

        // Second leg failed live; roll back the first (spec.md §4.7).
        if let Some(client) = client {
            let _ = client.send(pcb_client::protocol::delete_track_by_endpoints(from.0, from.1, pivot.0, pivot.1));
        }
        continue;
    }

    Ok(vec![(
        None,
        FixOutcome::Manual {
            reason: format!("no safe route found for net '{net_name}' between ({:.3},{:.3}) and ({:.3},{:.3})", from.0, from.1, to.0, to.1),
        },
    )])
}

fn add_track(
    net_name: &str,
    layer: &str,
    from: (f64, f64),
    to: (f64, f64),
    width_mm: f64,
    client: Option<&AltiumClient>,
) -> Result<FixResult, AutoFixError> {
    let op = EditOp::AddTrackSegment { net: net_name.to_string(), layer: layer.to_string(), from, to, width_mm };
    if let Some(client) = client {
        let request = pcb_client::protocol::add_track(net_name, from.0, from.1, to.0, to.1, width_mm, layer);
        return match client.send(request) {
            Ok(_) => Ok((Some(op), FixOutcome::Applied)),
            Err(pcb_client::ClientError::ContainerUnreachable { action, timeout }) => {
                Err(AutoFixError::ClientUnreachable(pcb_client::ClientError::ContainerUnreachable { action, timeout }))
            }
            Err(e) => Ok((None, FixOutcome::Rejected { reason: e.to_string() })),
        };
    }
    Ok((Some(op), FixOutcome::Applied))
}

fn fix_clearance(violation: &Violation, gir: &GeometryIr) -> FixResult {
    let Some(&(x, y)) = violation.location.points.first() else {
        return (None, FixOutcome::Rejected { reason: "clearance violation has no location".into() });
    };
    let actual = violation.actual_value.unwrap_or(0.0);
    let required = violation.required_value.unwrap_or(0.0);

    let nearest = gir
        .footprints
        .iter()
        .map(|fp| (fp, ((fp.position.0 - x).powi(2) + (fp.position.1 - y).powi(2)).sqrt()))
        .filter(|(_, dist)| *dist < NEAREST_COMPONENT_RADIUS_MM)
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap());

    let Some((component, _)) = nearest else {
        return (None, FixOutcome::Manual { reason: "no component found near the violation; manual fix needed".into() });
    };

    let move_dist = ((required - actual) + 0.1).max(0.5);
    let (dx, dy) = (component.position.0 - x, component.position.1 - y);
    let dist = if dx == 0.0 && dy == 0.0 { 1.0 } else { (dx * dx + dy * dy).sqrt() };
    let new_position = (component.position.0 + (dx / dist) * move_dist, component.position.1 + (dy / dist) * move_dist);

    let op = EditOp::MoveComponent { designator: component.reference.clone(), new_position, rotation_deg: None };
    (Some(op), FixOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::cir::{ClearanceParams, Rule, RuleScope};
    use pcb_ir::gir::*;
    use pcb_ir::violation::{Location, Severity};

    fn net(id: &str, name: &str) -> Net {
        Net { id: id.into(), name: name.into(), netclass: None }
    }

    fn footprint(id: &str, reference: &str, position: Point, pad_ids: Vec<&str>) -> Footprint {
        Footprint {
            id: id.into(),
            reference: reference.into(),
            position,
            rotation_deg: 0.0,
            layer: "L1".into(),
            library_name: None,
            part_number: None,
            pads: pad_ids.into_iter().map(String::from).collect(),
        }
    }

    fn pad(id: &str, footprint: &str, net_id: &str, pos: Point) -> Pad {
        Pad {
            id: id.into(),
            footprint: footprint.into(),
            net: Some(net_id.into()),
            shape: PadShape::Round,
            size: (0.5, 0.5),
            drill_mm: None,
            layers: vec!["L1".into()],
            relative_position: pos,
        }
    }

    fn antenna_violation(net_name: &str, stub: Point) -> Violation {
        Violation {
            rule_id: "r".into(),
            rule_kind: "net_antennae".into(),
            severity: Severity::Warning,
            message: format!("net '{net_name}' has a dangling stub"),
            location: Location::point(stub, None),
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: Some(net_name.into()),
            component: None,
            rule_priority: 0,
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
    fn antenna_is_deleted_when_net_has_no_unrouted_violation() {
        let gir = GeometryIr {
            nets: vec![net("net-a", "A")],
            footprints: vec![footprint("fp1", "U1", (0.0, 0.0), vec!["p1"])],
            pads: vec![pad("p1", "fp1", "net-a", (0.0, 0.0))],
            tracks: vec![Track { id: "t1".into(), net: "net-a".into(), layer: "L1".into(), from: (0.0, 0.0), to: (5.0, 0.0), width_mm: 0.2 }],
            ..Default::default()
        };
        let violation = antenna_violation("A", (5.0, 0.0));
        let cir = cir_with_clearance(0.2);
        let run = fix_violations(&[violation], &gir, &cir, Uuid::nil(), 1, None).unwrap();
        assert_eq!(run.patch.operations.len(), 1);
        assert!(matches!(run.patch.operations[0], EditOp::DeleteTrack { .. }));
        assert!(matches!(run.log[0].outcome, FixOutcome::Applied));
    }

    #[test]
    fn antenna_is_deferred_when_net_also_has_unrouted_violation() {
        let gir = GeometryIr {
            nets: vec![net("net-a", "A")],
            footprints: vec![footprint("fp1", "U1", (0.0, 0.0), vec!["p1"])],
            pads: vec![pad("p1", "fp1", "net-a", (0.0, 0.0))],
            tracks: vec![Track { id: "t1".into(), net: "net-a".into(), layer: "L1".into(), from: (0.0, 0.0), to: (5.0, 0.0), width_mm: 0.2 }],
            ..Default::default()
        };
        let unrouted = Violation {
            rule_id: "r".into(),
            rule_kind: "unrouted_net".into(),
            severity: Severity::Error,
            message: "net 'A' has 2 pad(s) but is not fully routed".into(),
            location: Location { points: vec![], layer: None },
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: Some("A".into()),
            component: None,
            rule_priority: 0,
        };
        let antenna = antenna_violation("A", (5.0, 0.0));
        let cir = cir_with_clearance(0.2);
        let run = fix_violations(&[antenna, unrouted], &gir, &cir, Uuid::nil(), 1, None).unwrap();
        let antenna_entry = run.log.iter().find(|e| e.rule_kind == "net_antennae").unwrap();
        assert!(matches!(antenna_entry.outcome, FixOutcome::Manual { .. }));
    }

    #[test]
    fn clearance_fix_moves_nearest_component_away_from_violation() {
        let gir = GeometryIr {
            footprints: vec![footprint("fp1", "R1", (10.0, 0.0), vec![])],
            ..Default::default()
        };
        let violation = Violation {
            rule_id: "r".into(),
            rule_kind: "clearance".into(),
            severity: Severity::Error,
            message: String::new(),
            location: Location::point((9.0, 0.0), None),
            actual_value: Some(0.1),
            required_value: Some(0.3),
            objects: vec![],
            net: None,
            component: None,
            rule_priority: 0,
        };
        let cir = cir_with_clearance(0.2);
        let run = fix_violations(&[violation], &gir, &cir, Uuid::nil(), 1, None).unwrap();
        match &run.patch.operations[0] {
            EditOp::MoveComponent { designator, new_position, .. } => {
                assert_eq!(designator, "R1");
                assert!(new_position.0 > 10.0);
            }
            other => panic!("expected MoveComponent, got {other:?}"),
        }
    }

    #[test]
    fn width_violation_is_always_manual() {
        let gir = GeometryIr::default();
        let violation = Violation {
            rule_id: "r".into(),
            rule_kind: "width".into(),
            severity: Severity::Error,
            message: String::new(),
            location: Location::point((0.0, 0.0), None),
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: None,
            component: None,
            rule_priority: 0,
        };
        let cir = cir_with_clearance(0.2);
        let run = fix_violations(&[violation], &gir, &cir, Uuid::nil(), 1, None).unwrap();
        assert!(run.patch.operations.is_empty());
        assert!(matches!(run.log[0].outcome, FixOutcome::Manual { .. }));
    }
}
