//! DRC orchestration (spec.md §4.6): run every enabled rule kind over
//! a board, order the results deterministically, apply the
//! width-reliability override, and optionally reconcile against a
//! native tool's report in hybrid mode.

use pcb_ir::cir::ConstraintIr;
use pcb_ir::gir::GeometryIr;
use pcb_ir::violation::{Severity, Violation};
use serde::{Deserialize, Serialize};

use crate::checks;

#[derive(Debug)]
pub enum DrcError {
    /// The G-IR failed its own invariants — a bug upstream of DRC, not
    /// a data-quality issue DRC itself can report as a violation.
    InternalDrc { rule: String, reason: String },
}

impl std::fmt::Display for DrcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrcError::InternalDrc { rule, reason } => write!(f, "DRC internal error in {rule}: {reason}"),
        }
    }
}

impl std::error::Error for DrcError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrcMode {
    /// Violations are entirely the output of this engine's own checks.
    Native,
    /// Violations were seeded from a structured native-tool report and
    /// merged with this engine's own findings.
    Hybrid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DrcSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub mode: DrcMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DrcResult {
    pub violations: Vec<Violation>,
    pub summary: DrcSummary,
}

/// Runs every check kind, in no particular internal order (the result
/// is sorted afterward), then applies width-reliability and ordering.
pub fn run_drc(gir: &GeometryIr, cir: &ConstraintIr) -> Result<DrcResult, DrcError> {
    gir.check_invariants().map_err(|e| DrcError::InternalDrc { rule: "gir-invariants".into(), reason: e.to_string() })?;

    let mut violations = checks::check_clearance(gir, cir);
    violations.extend(checks::check_hole_size(gir, cir));
    violations.extend(checks::check_hole_to_hole(gir, cir));
    violations.extend(checks::check_short_circuit(gir, cir));
    violations.extend(checks::check_unrouted_net(gir, cir));
    violations.extend(checks::check_net_antennae(gir, cir));
    violations.extend(checks::check_solder_mask_sliver(gir, cir));
    violations.extend(checks::check_modified_polygon(gir, cir));

    if width_checking_is_reliable(gir, cir) {
        violations.extend(checks::check_width(gir, cir));
    } else {
        tracing::warn!("more than 10% of tracks have widths outside the applicable rule's band; width checking disabled for this run");
    }

    order_violations(&mut violations);
    let summary = summarize(&violations, DrcMode::Native);
    Ok(DrcResult { violations, summary })
}

/// §4.2's binary-decoder sanity band for widths; a track outside this
/// range is implausible regardless of what any width rule says.
const SANE_WIDTH_MIN_MM: f64 = 0.05;
const SANE_WIDTH_MAX_MM: f64 = 10.0;

/// spec.md §4.6 "width check skip": disables width checking globally
/// when more than 10% of tracks fall outside the applicable rule's
/// band (this reader never trusts a binary-decoded width in the first
/// place, so `width_mm == 0.0` counts as out-of-band too) or outside
/// the §4.2 sanity band, even when the rule sets no `max_width_mm`.
fn width_checking_is_reliable(gir: &GeometryIr, cir: &ConstraintIr) -> bool {
    let Some(rule) = cir.enabled_rules_named("width").into_iter().next() else {
        return true;
    };
    let pcb_ir::cir::RuleKind::Width(params) = &rule.kind else { return true };

    let total = gir.tracks.len();
    if total == 0 {
        return true;
    }
    let out_of_band = gir
        .tracks
        .iter()
        .filter(|t| {
            t.width_mm <= 0.0
                || t.width_mm < params.min_width_mm
                || params.max_width_mm.map(|max| t.width_mm > max).unwrap_or(false)
                || t.width_mm < SANE_WIDTH_MIN_MM
                || t.width_mm > SANE_WIDTH_MAX_MM
        })
        .count();
    (out_of_band as f64 / total as f64) <= 0.10
}

/// spec.md §4.6 "rule-priority descending, then kind, then location
/// lexicographic". Pair enumeration in `checks.rs` already used
/// indexed `(i, j > i)` iteration so symmetric pairs appear once.
fn order_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        b.rule_priority
            .cmp(&a.rule_priority)
            .then_with(|| a.rule_kind.cmp(&b.rule_kind))
            .then_with(|| a.location.sort_key().cmp(&b.location.sort_key()))
    });
}

fn summarize(violations: &[Violation], mode: DrcMode) -> DrcSummary {
    let errors = violations.iter().filter(|v| v.severity == Severity::Error).count();
    let warnings = violations.iter().filter(|v| v.severity == Severity::Warning).count();
    DrcSummary { total: violations.len(), errors, warnings, mode }
}

/// spec.md §4.6 hybrid mode: adopt a native tool's structured report as
/// ground truth for counts, folding in this engine's own violations
/// only when they don't duplicate one already in the native report
/// (same kind, locations within 1mm).
pub fn reconcile_hybrid(native: Vec<Violation>, mut own: Vec<Violation>) -> DrcResult {
    own.retain(|candidate| !native.iter().any(|n| duplicates(n, candidate)));

    let mut merged = native;
    merged.extend(own);
    order_violations(&mut merged);
    let summary = summarize(&merged, DrcMode::Hybrid);
    DrcResult { violations: merged, summary }
}

fn duplicates(a: &Violation, b: &Violation) -> bool {
    if a.rule_kind != b.rule_kind {
        return false;
    }
    a.location.points.iter().any(|pa| {
        b.location.points.iter().any(|pb| {
            let (dx, dy) = (pa.0 - pb.0, pa.1 - pb.1);
            (dx * dx + dy * dy).sqrt() <= 1.0
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::gir::Track;
    use pcb_ir::violation::Location;

    fn track(id: &str, width_mm: f64) -> Track {
        Track {
            id: id.into(),
            net: "net-a".into(),
            layer: "L1".into(),
            from: (0.0, 0.0),
            to: (1.0, 0.0),
            width_mm,
        }
    }

    fn cir_with_width(min_mm: f64) -> ConstraintIr {
        ConstraintIr {
            rules: vec![pcb_ir::cir::Rule {
                id: "width-default".into(),
                scope: pcb_ir::cir::RuleScope { all: true, ..Default::default() },
                kind: pcb_ir::cir::RuleKind::Width(pcb_ir::cir::WidthParams {
                    min_width_mm: min_mm,
                    preferred_width_mm: None,
                    max_width_mm: None,
                }),
                enabled: true,
                priority: 0,
            }],
            netclasses: vec![],
        }
    }

    #[test]
    fn width_checking_disabled_when_all_widths_are_unknown() {
        let gir = GeometryIr { tracks: vec![track("t1", 0.0), track("t2", 0.0)], ..Default::default() };
        let cir = cir_with_width(0.2);
        assert!(!width_checking_is_reliable(&gir, &cir));
    }

    #[test]
    fn width_checking_enabled_when_most_widths_are_in_band() {
        let gir = GeometryIr {
            tracks: vec![track("t1", 0.3), track("t2", 0.3), track("t3", 0.3), track("t4", 0.3), track("t5", 0.0)],
            ..Default::default()
        };
        let cir = cir_with_width(0.2);
        assert!(width_checking_is_reliable(&gir, &cir));
    }

    #[test]
    fn ordering_sorts_by_priority_then_kind_then_location() {
        let mut violations = vec![
            Violation {
                rule_id: "r1".into(),
                rule_kind: "width".into(),
                severity: Severity::Error,
                message: String::new(),
                location: Location::point((5.0, 0.0), None),
                actual_value: None,
                required_value: None,
                objects: vec![],
                net: None,
                component: None,
                rule_priority: 0,
            },
            Violation {
                rule_id: "r2".into(),
                rule_kind: "clearance".into(),
                severity: Severity::Error,
                message: String::new(),
                location: Location::point((1.0, 0.0), None),
                actual_value: None,
                required_value: None,
                objects: vec![],
                net: None,
                component: None,
                rule_priority: 5,
            },
        ];
        order_violations(&mut violations);
        assert_eq!(violations[0].rule_id, "r2");
    }

    #[test]
    fn reconcile_hybrid_drops_own_violation_duplicating_native() {
        let native = vec![Violation {
            rule_id: "native".into(),
            rule_kind: "clearance".into(),
            severity: Severity::Error,
            message: String::new(),
            location: Location::point((0.0, 0.0), None),
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: None,
            component: None,
            rule_priority: 0,
        }];
        let own = vec![Violation {
            rule_id: "own".into(),
            rule_kind: "clearance".into(),
            severity: Severity::Error,
            message: String::new(),
            location: Location::point((0.5, 0.0), None),
            actual_value: None,
            required_value: None,
            objects: vec![],
            net: None,
            component: None,
            rule_priority: 0,
        }];
        let result = reconcile_hybrid(native, own);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule_id, "native");
    }
}
