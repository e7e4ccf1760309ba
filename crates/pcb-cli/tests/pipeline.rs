//! End-to-end pipeline tests: build a minimal board in memory (no real
//! Altium binary needed), persist it, run DRC, run auto-fix, and check
//! the results land where the artifact store says they should.

use pcb_cli::config::Config;
use pcb_cli::pipeline::{self, Stores};
use pcb_ir::artifact::{Artifact, ArtifactKind, CreatedBy};
use pcb_ir::cir::{ClearanceParams, ConstraintIr, Rule, RuleKind, RuleScope, UnroutedNetParams};
use pcb_ir::gir::{Footprint, GeometryIr, Layer, LayerKind, Net, Pad, PadShape, Stackup};

fn two_pad_board() -> GeometryIr {
    let layer = Layer { id: "top".into(), name: "Top Layer".into(), kind: LayerKind::Signal, stack_index: 0 };
    let board = pcb_ir::gir::Board {
        outline: vec![(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)],
        layers: vec![layer],
        stackup: Stackup { layer_order: vec!["top".into()], thickness_mm: 1.6, dielectrics: Vec::new() },
    };

    let net = Net { id: "net1".into(), name: "NET1".into(), netclass: None };

    let fp1 = Footprint {
        id: "fp1".into(),
        reference: "R1".into(),
        position: (10.0, 10.0),
        rotation_deg: 0.0,
        layer: "top".into(),
        library_name: None,
        part_number: None,
        pads: vec!["p1".into()],
    };
    let fp2 = Footprint {
        id: "fp2".into(),
        reference: "R2".into(),
        position: (50.0, 10.0),
        rotation_deg: 0.0,
        layer: "top".into(),
        library_name: None,
        part_number: None,
        pads: vec!["p2".into()],
    };

    let pad1 = Pad {
        id: "p1".into(),
        footprint: "fp1".into(),
        net: Some("net1".into()),
        shape: PadShape::Round,
        size: (1.0, 1.0),
        drill_mm: None,
        layers: vec!["top".into()],
        relative_position: (0.0, 0.0),
    };
    let pad2 = Pad {
        id: "p2".into(),
        footprint: "fp2".into(),
        net: Some("net1".into()),
        shape: PadShape::Round,
        size: (1.0, 1.0),
        drill_mm: None,
        layers: vec!["top".into()],
        relative_position: (0.0, 0.0),
    };

    GeometryIr {
        board: Some(board),
        nets: vec![net],
        footprints: vec![fp1, fp2],
        pads: vec![pad1, pad2],
        tracks: Vec::new(),
        vias: Vec::new(),
        polygons: Vec::new(),
    }
}

fn ruleset_with_unrouted_check() -> ConstraintIr {
    ConstraintIr {
        rules: vec![
            Rule {
                id: "clearance".into(),
                scope: RuleScope { all: true, ..Default::default() },
                kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: 0.2, object_clearances: Vec::new() }),
                enabled: true,
                priority: 0,
            },
            Rule {
                id: "unrouted".into(),
                scope: RuleScope { all: true, ..Default::default() },
                kind: RuleKind::UnroutedNet(UnroutedNetParams { enabled: true }),
                enabled: true,
                priority: 0,
            },
        ],
        netclasses: Vec::new(),
    }
}

#[test]
fn drc_then_autofix_produces_a_patch_for_the_unrouted_net() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.store_dir = dir.path().to_path_buf();
    let stores = Stores::open(&config);

    let board = stores
        .boards
        .create(Artifact::new(ArtifactKind::PcbBoard, two_pad_board(), None, CreatedBy::User))
        .unwrap();
    let ruleset = stores
        .rulesets
        .create(Artifact::new(ArtifactKind::ConstraintRuleSet, ruleset_with_unrouted_check(), None, CreatedBy::User))
        .unwrap();

    let violations = pipeline::run_drc(board.id, ruleset.id, &stores).unwrap();
    assert!(!violations.data.is_empty(), "two unconnected same-net pads should trip the unrouted-net check");

    let (patch, log) = pipeline::run_autofix(board.id, ruleset.id, violations.id, &stores, None).unwrap();
    assert!(!patch.data.operations.is_empty());
    assert!(log.iter().any(|entry| entry.rule_kind == "unrouted_net"));
}

#[test]
fn summarize_counts_match_the_fixture() {
    let gir = two_pad_board();
    let summary = pipeline::summarize(&gir);
    assert_eq!(summary.footprints, 2);
    assert_eq!(summary.nets, 1);
    assert_eq!(summary.tracks, 0);
}
