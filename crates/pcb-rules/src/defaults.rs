//! Default rule set, used when neither the binary rule stream nor a JSON
//! companion file yields any rules (spec.md §4.3 "Defaults"). Values match
//! the ones documented there: clearance 0.2 mm, min width 0.254 mm, min
//! hole 0.2 mm, hole-to-hole 0.254 mm, mask sliver 0.06 mm.

use pcb_ir::cir::{
    ClearanceParams, ConstraintIr, HoleToHoleParams, Rule, RuleKind, RuleScope,
    SolderMaskSliverParams, ViaParams, WidthParams,
};

pub fn default_ruleset() -> ConstraintIr {
    let all_scope = || RuleScope {
        all: true,
        ..Default::default()
    };

    ConstraintIr {
        rules: vec![
            Rule {
                id: "default-clearance".into(),
                scope: all_scope(),
                kind: RuleKind::Clearance(ClearanceParams {
                    min_clearance_mm: 0.2,
                    object_clearances: Vec::new(),
                }),
                enabled: true,
                priority: 0,
            },
            Rule {
                id: "default-width".into(),
                scope: all_scope(),
                kind: RuleKind::Width(WidthParams {
                    min_width_mm: 0.254,
                    preferred_width_mm: None,
                    max_width_mm: None,
                }),
                enabled: true,
                priority: 0,
            },
            Rule {
                id: "default-via".into(),
                scope: all_scope(),
                kind: RuleKind::Via(ViaParams {
                    min_drill_mm: 0.2,
                    max_drill_mm: None,
                    min_diameter_mm: None,
                    max_diameter_mm: None,
                    via_style: None,
                }),
                enabled: true,
                priority: 0,
            },
            Rule {
                id: "default-hole-to-hole".into(),
                scope: all_scope(),
                kind: RuleKind::HoleToHole(HoleToHoleParams { min_gap_mm: 0.254 }),
                enabled: true,
                priority: 0,
            },
            Rule {
                id: "default-solder-mask-sliver".into(),
                scope: all_scope(),
                kind: RuleKind::SolderMaskSliver(SolderMaskSliverParams { min_gap_mm: 0.06 }),
                enabled: true,
                priority: 0,
            },
        ],
        netclasses: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ruleset_covers_the_five_documented_kinds() {
        let cir = default_ruleset();
        assert_eq!(cir.rules.len(), 5);
        assert!(cir.enabled_rules_named("clearance")[0]
            .kind
            .name()
            == "clearance");
        assert_eq!(cir.enabled_rules_named("width").len(), 1);
        assert_eq!(cir.enabled_rules_named("hole_to_hole").len(), 1);
        assert_eq!(cir.enabled_rules_named("solder_mask_sliver").len(), 1);
        assert_eq!(cir.enabled_rules_named("via").len(), 1);
    }
}
