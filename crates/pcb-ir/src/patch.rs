//! Patch / edit contract (spec.md §4.8): typed geometric edits the
//! auto-fix engine produces. Interpretation — actually moving a
//! component, adding a track — is the applicator's job (`pcb-client`
//! for the live-Altium case, or a direct G-IR mutation for offline use).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gir::Point;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    AddTrackSegment {
        net: String,
        layer: String,
        from: Point,
        to: Point,
        width_mm: f64,
    },
    AddVia {
        net: String,
        position: Point,
        drill_mm: f64,
        diameter_mm: f64,
        span: (String, String),
    },
    /// Matched by endpoints, per spec.md §4.8.
    DeleteTrack {
        from: Point,
        to: Point,
    },
    /// Bulk net/layer-filtered delete — the other shape spec.md §6.3 names
    /// for the same action, used by the external-tool client's convenience
    /// API when no specific endpoints are known.
    DeleteTrackByNetLayer {
        net: String,
        layer: String,
    },
    MoveComponent {
        designator: String,
        new_position: Point,
        rotation_deg: Option<f64>,
    },
    AdjustPolygonClearance {
        position: Point,
        clearance_mm: f64,
    },
    CreateRule {
        kind: String,
        name: String,
        parameters: serde_json::Value,
    },
    UpdateRule {
        name: String,
        parameters: serde_json::Value,
    },
    DeleteRule {
        name: String,
    },
    ExportPcbInfo,
    RepourPolygons,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub from_version: u64,
    pub to_version: u64,
    pub board_artifact: Uuid,
    pub operations: Vec<EditOp>,
    pub explanation: String,
}
