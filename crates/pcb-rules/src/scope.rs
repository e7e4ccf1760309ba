//! Scope evaluation: does a rule apply to a given object? spec.md §4.5
//! lists four scope forms — `All`, a literal net/component/layer set, a
//! net-class membership, and `InNamedPolygon(X)` (object lies inside
//! polygon X). Priority resolution then picks, among the rules of one
//! kind that match, the one with the highest priority (ties by
//! insertion order, already the iteration order of `ConstraintIr::rules`).

use pcb_ir::cir::{ConstraintIr, Rule, RuleScope};
use pcb_ir::gir::{GeometryIr, Point};

/// The subset of an object's identity a scope expression can be tested
/// against. Callers (DRC checks) build one of these per candidate object.
#[derive(Debug, Clone, Default)]
pub struct ObjectRef {
    pub net_id: Option<String>,
    pub net_name: Option<String>,
    pub netclass: Option<String>,
    pub component_ref: Option<String>,
    pub layer_id: Option<String>,
    /// Representative point used for `InNamedPolygon` containment tests.
    pub position: Option<Point>,
}

pub fn scope_matches(scope: &RuleScope, obj: &ObjectRef, gir: &GeometryIr) -> bool {
    if scope.all {
        return true;
    }

    let mut any_predicate = false;

    if let Some(nets) = &scope.nets {
        any_predicate = true;
        let hit = obj
            .net_id
            .as_deref()
            .map(|id| nets.iter().any(|n| n == id))
            .unwrap_or(false)
            || obj
                .net_name
                .as_deref()
                .map(|name| nets.iter().any(|n| n == name))
                .unwrap_or(false);
        if hit {
            return true;
        }
    }

    if let Some(components) = &scope.components {
        any_predicate = true;
        if obj
            .component_ref
            .as_deref()
            .map(|r| components.iter().any(|c| c == r))
            .unwrap_or(false)
        {
            return true;
        }
    }

    if let Some(layers) = &scope.layers {
        any_predicate = true;
        if obj
            .layer_id
            .as_deref()
            .map(|l| layers.iter().any(|want| want == l))
            .unwrap_or(false)
        {
            return true;
        }
    }

    if let Some(netclass) = &scope.netclass {
        any_predicate = true;
        if obj.netclass.as_deref() == Some(netclass.as_str()) {
            return true;
        }
    }

    if let Some(polygon_name) = &scope.in_named_polygon {
        any_predicate = true;
        if let Some(point) = obj.position {
            if gir
                .polygons
                .iter()
                .any(|p| p.name == *polygon_name && point_in_polygon(point, &p.outline))
            {
                return true;
            }
        }
    }

    // A scope with no predicates set at all behaves like `All` (an empty
    // `RuleScope::default()` is otherwise unreachable from real rule data).
    !any_predicate
}

fn point_in_polygon(point: Point, outline: &[Point]) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let (px, py) = point;
    let mut inside = false;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        let (xi, yi) = outline[i];
        let (xj, yj) = outline[j];
        let intersects = ((yi > py) != (yj > py))
            && (px < (xj - xi) * (py - yi) / (yj - yi) + xi);
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Among enabled rules of `kind_name` whose scope matches `obj`, returns
/// the one with highest priority (ties broken by insertion order).
pub fn resolve_rule<'a>(
    cir: &'a ConstraintIr,
    kind_name: &str,
    obj: &ObjectRef,
    gir: &GeometryIr,
) -> Option<&'a Rule> {
    cir.rules
        .iter()
        .filter(|r| r.enabled && r.kind.name() == kind_name && scope_matches(&r.scope, obj, gir))
        .fold(None, |best: Option<&Rule>, candidate| match best {
            None => Some(candidate),
            Some(current) if candidate.priority > current.priority => Some(candidate),
            Some(current) => Some(current),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::cir::{ClearanceParams, RuleKind};

    fn gir() -> GeometryIr {
        GeometryIr::default()
    }

    #[test]
    fn all_scope_matches_anything() {
        let scope = RuleScope { all: true, ..Default::default() };
        assert!(scope_matches(&scope, &ObjectRef::default(), &gir()));
    }

    #[test]
    fn net_scope_matches_by_id_or_name() {
        let scope = RuleScope {
            nets: Some(vec!["net-vcc".to_string()]),
            ..Default::default()
        };
        let obj = ObjectRef {
            net_id: Some("net-vcc".to_string()),
            ..Default::default()
        };
        assert!(scope_matches(&scope, &obj, &gir()));
    }

    #[test]
    fn higher_priority_rule_wins_when_both_match() {
        let cir = ConstraintIr {
            rules: vec![
                Rule {
                    id: "low".into(),
                    scope: RuleScope { all: true, ..Default::default() },
                    kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: 0.2, object_clearances: vec![] }),
                    enabled: true,
                    priority: 0,
                },
                Rule {
                    id: "high".into(),
                    scope: RuleScope { all: true, ..Default::default() },
                    kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: 0.5, object_clearances: vec![] }),
                    enabled: true,
                    priority: 10,
                },
            ],
            netclasses: vec![],
        };
        let resolved = resolve_rule(&cir, "clearance", &ObjectRef::default(), &gir()).unwrap();
        assert_eq!(resolved.id, "high");
    }
}
