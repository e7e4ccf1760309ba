//! Canonical intermediate representations for the PCB EDA core.
//!
//! This crate holds no behavior beyond constructors and small invariant
//! helpers — it is the shared vocabulary that `pcb-import`, `pcb-store`,
//! `pcb-rules`, `pcb-drc`, and `pcb-autofix` all speak. Two IRs live here:
//!
//! - [`gir`] — Geometry-IR: board, layers, nets, footprints, pads, tracks,
//!   vias, polygons.
//! - [`cir`] — Constraint-IR: rules and net-classes.
//!
//! Alongside the IRs: [`artifact`] (versioned persistence envelope),
//! [`violation`] (DRC output), and [`patch`] (auto-fix output).

pub mod artifact;
pub mod cir;
pub mod gir;
pub mod patch;
pub mod violation;

pub use artifact::{Artifact, ArtifactKind, ArtifactMeta, ArtifactRelation, CreatedBy, SourceEngine};
pub use cir::{ConstraintIr, Netclass, NetclassDefaults, Rule, RuleKind, RuleScope};
pub use gir::{Board, Footprint, GeometryIr, Layer, LayerKind, Net, Pad, PadShape, Polygon, Track, Via};
pub use patch::{EditOp, Patch};
pub use violation::{Severity, Violation};
