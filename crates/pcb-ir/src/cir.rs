//! Constraint-IR (C-IR): the parameterized rule set and net-class table.
//!
//! Per the design notes in spec.md §9, rule parameters are modeled as a
//! tagged union (`RuleParams`) with one variant per rule kind rather than
//! a single struct of ~20 optional fields — the source's `RuleParams`
//! (`core/ir/cir.py`) is exactly that open bag, and exhaustive matching
//! on the enum is what lets `pcb-drc` and `pcb-autofix` know at compile
//! time that every kind has been handled.

use serde::{Deserialize, Serialize};

pub type RuleId = String;
pub type NetclassId = String;

/// Scope expression selecting which objects a rule applies to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleScope {
    pub nets: Option<Vec<String>>,
    pub netclass: Option<String>,
    pub components: Option<Vec<String>>,
    pub layers: Option<Vec<String>>,
    /// `InNamedPolygon('X')` style scope, extracted from rule-stream scope
    /// expressions (spec.md §4.2).
    pub in_named_polygon: Option<String>,
    pub all: bool,
}

impl RuleScope {
    pub fn matches_net(&self, net_id: &str, net_name: &str, netclass: Option<&str>) -> bool {
        if self.all {
            return true;
        }
        if let Some(nets) = &self.nets {
            if nets.iter().any(|n| n == net_id || n == net_name) {
                return true;
            }
        }
        if let (Some(want), Some(have)) = (&self.netclass, netclass) {
            if want == have {
                return true;
            }
        }
        false
    }
}

/// Per-object-pair clearance override, decoded from `OBJECTCLEARANCES`
/// entries such as `ClearanceObj_Track-ClearanceObj_Poly:600000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Track,
    Pad,
    Via,
    Poly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearanceParams {
    pub min_clearance_mm: f64,
    /// Unordered (shape, shape) pair overrides in mm, decoded from
    /// `OBJECTCLEARANCES`. Kept as a flat list (tuple map keys do not
    /// round-trip through `serde_json`) and looked up by
    /// [`ClearanceParams::limit_for`], falling back to `min_clearance_mm`.
    pub object_clearances: Vec<((ShapeKind, ShapeKind), f64)>,
}

impl ClearanceParams {
    pub fn limit_for(&self, a: ShapeKind, b: ShapeKind) -> f64 {
        let key = if (a as u8) <= (b as u8) { (a, b) } else { (b, a) };
        self.object_clearances
            .iter()
            .find(|(pair, _)| *pair == key)
            .map(|(_, mm)| *mm)
            .unwrap_or(self.min_clearance_mm)
    }

    pub fn set_override(&mut self, a: ShapeKind, b: ShapeKind, mm: f64) {
        let key = if (a as u8) <= (b as u8) { (a, b) } else { (b, a) };
        if let Some(entry) = self.object_clearances.iter_mut().find(|(pair, _)| *pair == key) {
            entry.1 = mm;
        } else {
            self.object_clearances.push((key, mm));
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidthParams {
    pub min_width_mm: f64,
    pub preferred_width_mm: Option<f64>,
    pub max_width_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViaParams {
    pub min_drill_mm: f64,
    pub max_drill_mm: Option<f64>,
    pub min_diameter_mm: Option<f64>,
    pub max_diameter_mm: Option<f64>,
    pub via_style: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShortCircuitParams {
    pub allowed: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnroutedNetParams {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoleToHoleParams {
    pub min_gap_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolderMaskSliverParams {
    pub min_gap_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SilkClearanceParams {
    pub min_clearance_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeightParams {
    pub min_mm: Option<f64>,
    pub preferred_mm: Option<f64>,
    pub max_mm: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ModifiedPolygonParams {
    pub allow_modified: bool,
    pub allow_shelved: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetAntennaeParams {
    pub tolerance_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingCornersParams {
    pub style: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingTopologyParams {
    pub topology: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingPriorityParams {
    pub priority: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingLayersParams {
    pub allowed_layers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffPairRoutingParams {
    pub gap_mm: f64,
    pub max_uncoupled_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaneClearanceParams {
    pub min_clearance_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaneConnectParams {
    pub relief_expansion_mm: f64,
    pub relief_air_gap_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasteMaskParams {
    pub expansion_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolderMaskParams {
    pub expansion_mm: f64,
}

/// One tagged variant per rule kind — see module docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    Clearance(ClearanceParams),
    Width(WidthParams),
    Via(ViaParams),
    ShortCircuit(ShortCircuitParams),
    UnroutedNet(UnroutedNetParams),
    HoleToHole(HoleToHoleParams),
    SolderMaskSliver(SolderMaskSliverParams),
    SilkToMask(SilkClearanceParams),
    SilkToSilk(SilkClearanceParams),
    Height(HeightParams),
    ModifiedPolygon(ModifiedPolygonParams),
    NetAntennae(NetAntennaeParams),
    RoutingCorners(RoutingCornersParams),
    RoutingTopology(RoutingTopologyParams),
    RoutingPriority(RoutingPriorityParams),
    RoutingLayers(RoutingLayersParams),
    DiffPairRouting(DiffPairRoutingParams),
    PlaneClearance(PlaneClearanceParams),
    PlaneConnect(PlaneConnectParams),
    PasteMask(PasteMaskParams),
    SolderMask(SolderMaskParams),
}

impl RuleKind {
    /// Short name used in violation records and log output.
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Clearance(_) => "clearance",
            RuleKind::Width(_) => "width",
            RuleKind::Via(_) => "via",
            RuleKind::ShortCircuit(_) => "short_circuit",
            RuleKind::UnroutedNet(_) => "unrouted_net",
            RuleKind::HoleToHole(_) => "hole_to_hole",
            RuleKind::SolderMaskSliver(_) => "solder_mask_sliver",
            RuleKind::SilkToMask(_) => "silk_to_mask",
            RuleKind::SilkToSilk(_) => "silk_to_silk",
            RuleKind::Height(_) => "height",
            RuleKind::ModifiedPolygon(_) => "modified_polygon",
            RuleKind::NetAntennae(_) => "net_antennae",
            RuleKind::RoutingCorners(_) => "routing_corners",
            RuleKind::RoutingTopology(_) => "routing_topology",
            RuleKind::RoutingPriority(_) => "routing_priority",
            RuleKind::RoutingLayers(_) => "routing_layers",
            RuleKind::DiffPairRouting(_) => "diff_pair_routing",
            RuleKind::PlaneClearance(_) => "plane_clearance",
            RuleKind::PlaneConnect(_) => "plane_connect",
            RuleKind::PasteMask(_) => "paste_mask",
            RuleKind::SolderMask(_) => "solder_mask",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub scope: RuleScope,
    pub kind: RuleKind,
    pub enabled: bool,
    /// Higher wins when two enabled rules of the same kind both scope an
    /// object; ties break by insertion order (position in `rules`).
    pub priority: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetclassDefaults {
    pub trace_width_mm: Option<f64>,
    pub clearance_mm: Option<f64>,
    pub via_size_mm: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netclass {
    pub id: NetclassId,
    pub name: String,
    pub nets: Vec<String>,
    pub defaults: NetclassDefaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintIr {
    pub rules: Vec<Rule>,
    pub netclasses: Vec<Netclass>,
}

impl ConstraintIr {
    /// Enabled rules of a given kind discriminant, ordered by priority
    /// descending then by original insertion order (stable sort).
    pub fn enabled_rules_named(&self, kind_name: &str) -> Vec<&Rule> {
        let mut matches: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.enabled && r.kind.name() == kind_name)
            .collect();
        matches.sort_by(|a, b| b.priority.cmp(&a.priority));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearance_override_lookup_is_symmetric() {
        let mut params = ClearanceParams {
            min_clearance_mm: 0.2,
            object_clearances: Default::default(),
        };
        params.set_override(ShapeKind::Poly, ShapeKind::Track, 0.6);
        assert_eq!(params.limit_for(ShapeKind::Track, ShapeKind::Poly), 0.6);
        assert_eq!(params.limit_for(ShapeKind::Poly, ShapeKind::Track), 0.6);
        assert_eq!(params.limit_for(ShapeKind::Pad, ShapeKind::Via), 0.2);
    }

    #[test]
    fn priority_breaks_ties_by_insertion_order() {
        let cir = ConstraintIr {
            rules: vec![
                Rule {
                    id: "r1".into(),
                    scope: RuleScope { all: true, ..Default::default() },
                    kind: RuleKind::Clearance(ClearanceParams {
                        min_clearance_mm: 0.2,
                        object_clearances: Default::default(),
                    }),
                    enabled: true,
                    priority: 0,
                },
                Rule {
                    id: "r2".into(),
                    scope: RuleScope { all: true, ..Default::default() },
                    kind: RuleKind::Clearance(ClearanceParams {
                        min_clearance_mm: 0.3,
                        object_clearances: Default::default(),
                    }),
                    enabled: true,
                    priority: 5,
                },
            ],
            netclasses: vec![],
        };
        let ordered = cir.enabled_rules_named("clearance");
        assert_eq!(ordered[0].id, "r2");
    }
}
