//! Geometry-IR (G-IR): the canonical, engine-neutral geometric model of a
//! board. A committed `GeometryIr` is immutable; producing a new state
//! means building a new value and storing it as a new artifact version —
//! nothing here mutates in place once handed to the store.

use serde::{Deserialize, Serialize};

pub type LayerId = String;
pub type NetId = String;
pub type FootprintId = String;
pub type PadId = String;
pub type TrackId = String;
pub type ViaId = String;
pub type PolygonId = String;

/// A 2D point in millimeters.
pub type Point = (f64, f64);

/// Layer electrical/mechanical role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Signal,
    Ground,
    Power,
    Plane,
    Overlay,
    Mask,
    Paste,
    Mechanical,
    Keepout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    /// Index into the board's physical stackup order.
    pub stack_index: usize,
}

/// Physical stackup: ordered layer references plus total board thickness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stackup {
    pub layer_order: Vec<LayerId>,
    pub thickness_mm: f64,
    pub dielectrics: Vec<DielectricLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DielectricLayer {
    pub name: String,
    pub thickness_mm: f64,
    pub dielectric_constant: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Outline polygon, millimeters, in board coordinates.
    pub outline: Vec<Point>,
    pub layers: Vec<Layer>,
    pub stackup: Stackup,
}

impl Board {
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub id: NetId,
    pub name: String,
    pub netclass: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Round,
    Rect,
    Oval,
    Polygon,
}

/// A pad's position is stored relative to its owning footprint's center,
/// in the footprint's local (unrotated) frame — see [`Pad::absolute_position`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    pub id: PadId,
    pub footprint: FootprintId,
    pub net: Option<NetId>,
    pub shape: PadShape,
    /// (x, y) size in mm.
    pub size: (f64, f64),
    pub drill_mm: Option<f64>,
    pub layers: Vec<LayerId>,
    /// Position relative to the footprint's center, before rotation.
    pub relative_position: Point,
}

impl Pad {
    /// Absolute board position: the footprint's position plus the pad's
    /// relative position rotated by the footprint's rotation (degrees).
    pub fn absolute_position(&self, footprint: &Footprint) -> Point {
        let (rx, ry) = self.relative_position;
        let theta = footprint.rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let rotated_x = rx * cos - ry * sin;
        let rotated_y = rx * sin + ry * cos;
        (
            footprint.position.0 + rotated_x,
            footprint.position.1 + rotated_y,
        )
    }

    /// Half-extent used by clearance/overlap checks: half of the larger
    /// of width/height for a conservative bounding circle, or the true
    /// rect half-extents for rect/oval shapes.
    pub fn half_size(&self) -> (f64, f64) {
        (self.size.0 / 2.0, self.size.1 / 2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footprint {
    pub id: FootprintId,
    pub reference: String,
    pub position: Point,
    pub rotation_deg: f64,
    pub layer: LayerId,
    pub library_name: Option<String>,
    pub part_number: Option<String>,
    pub pads: Vec<PadId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub net: NetId,
    pub layer: LayerId,
    pub from: Point,
    pub to: Point,
    /// 0.0 means "unknown" (binary width decoder distrusted the value,
    /// see `TODO(width-decoder)` in pcb-reader) rather than "zero-width".
    pub width_mm: f64,
}

impl Track {
    pub fn length_mm(&self) -> f64 {
        let dx = self.to.0 - self.from.0;
        let dy = self.to.1 - self.from.1;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Via {
    pub id: ViaId,
    pub net: NetId,
    pub position: Point,
    pub drill_mm: f64,
    pub diameter_mm: f64,
    pub span: (LayerId, LayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PourStyle {
    Solid,
    Hatched,
    None,
}

/// A copper pour. `copper_regions`, when present, is the engine's actual
/// filled area (post keep-out carving) and must be preferred over
/// `outline` for clearance checks — see `pcb-drc`'s pour-aware clearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    pub id: PolygonId,
    pub name: String,
    pub net: Option<NetId>,
    pub layer: LayerId,
    pub outline: Vec<Point>,
    pub pour_style: PourStyle,
    pub modified: bool,
    pub shelved: bool,
    pub copper_regions: Option<Vec<Vec<Point>>>,
}

impl Polygon {
    /// The shape to use for clearance checks: copper regions when known,
    /// the raw outline otherwise (caller should log reduced fidelity).
    pub fn clearance_shape(&self) -> &[Vec<Point>] {
        match &self.copper_regions {
            Some(regions) if !regions.is_empty() => regions,
            _ => std::slice::from_ref(&self.outline),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeometryIr {
    pub board: Option<Board>,
    pub nets: Vec<Net>,
    pub footprints: Vec<Footprint>,
    pub pads: Vec<Pad>,
    pub tracks: Vec<Track>,
    pub vias: Vec<Via>,
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GirInvariantError {
    UnknownNet { referenced_by: String, net: NetId },
    UnknownLayer { referenced_by: String, layer: LayerId },
    NonFiniteDimension { object: String },
    DegenerateTrack { track: TrackId },
}

impl std::fmt::Display for GirInvariantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GirInvariantError::UnknownNet { referenced_by, net } => {
                write!(f, "{referenced_by} references unknown net {net}")
            }
            GirInvariantError::UnknownLayer { referenced_by, layer } => {
                write!(f, "{referenced_by} references unknown layer {layer}")
            }
            GirInvariantError::NonFiniteDimension { object } => {
                write!(f, "{object} has a non-finite or negative dimension")
            }
            GirInvariantError::DegenerateTrack { track } => {
                write!(f, "track {track} has identical from/to points")
            }
        }
    }
}

impl std::error::Error for GirInvariantError {}

impl GeometryIr {
    /// Checks the invariants listed in spec §3.1. Callers such as the DRC
    /// engine treat a failure here as `InternalDrc`-worthy — it means the
    /// importer produced an inconsistent IR, not a data-quality warning.
    pub fn check_invariants(&self) -> Result<(), GirInvariantError> {
        let net_ids: std::collections::HashSet<&str> =
            self.nets.iter().map(|n| n.id.as_str()).collect();
        let layer_ids: std::collections::HashSet<&str> = self
            .board
            .as_ref()
            .map(|b| b.layers.iter().map(|l| l.id.as_str()).collect())
            .unwrap_or_default();

        for pad in &self.pads {
            if let Some(net) = &pad.net {
                if !net_ids.contains(net.as_str()) {
                    return Err(GirInvariantError::UnknownNet {
                        referenced_by: format!("pad {}", pad.id),
                        net: net.clone(),
                    });
                }
            }
            if pad.size.0 < 0.0 || pad.size.1 < 0.0 || !pad.size.0.is_finite() || !pad.size.1.is_finite() {
                return Err(GirInvariantError::NonFiniteDimension {
                    object: format!("pad {}", pad.id),
                });
            }
            for layer in &pad.layers {
                if !layer_ids.contains(layer.as_str()) {
                    return Err(GirInvariantError::UnknownLayer {
                        referenced_by: format!("pad {}", pad.id),
                        layer: layer.clone(),
                    });
                }
            }
        }

        for track in &self.tracks {
            if !net_ids.contains(track.net.as_str()) {
                return Err(GirInvariantError::UnknownNet {
                    referenced_by: format!("track {}", track.id),
                    net: track.net.clone(),
                });
            }
            if !layer_ids.contains(track.layer.as_str()) {
                return Err(GirInvariantError::UnknownLayer {
                    referenced_by: format!("track {}", track.id),
                    layer: track.layer.clone(),
                });
            }
            if track.width_mm < 0.0 || !track.width_mm.is_finite() {
                return Err(GirInvariantError::NonFiniteDimension {
                    object: format!("track {}", track.id),
                });
            }
            if track.from == track.to {
                return Err(GirInvariantError::DegenerateTrack { track: track.id.clone() });
            }
        }

        for via in &self.vias {
            if !net_ids.contains(via.net.as_str()) {
                return Err(GirInvariantError::UnknownNet {
                    referenced_by: format!("via {}", via.id),
                    net: via.net.clone(),
                });
            }
            if via.drill_mm < 0.0 || via.diameter_mm < 0.0 {
                return Err(GirInvariantError::NonFiniteDimension {
                    object: format!("via {}", via.id),
                });
            }
        }

        for polygon in &self.polygons {
            if let Some(net) = &polygon.net {
                if !net_ids.contains(net.as_str()) {
                    return Err(GirInvariantError::UnknownNet {
                        referenced_by: format!("polygon {}", polygon.id),
                        net: net.clone(),
                    });
                }
            }
            if !layer_ids.contains(polygon.layer.as_str()) {
                return Err(GirInvariantError::UnknownLayer {
                    referenced_by: format!("polygon {}", polygon.id),
                    layer: polygon.layer.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn pad(&self, id: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.id == id)
    }

    pub fn footprint(&self, id: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.id == id)
    }

    pub fn net(&self, id: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board() -> Board {
        Board {
            outline: vec![(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)],
            layers: vec![Layer {
                id: "L1".into(),
                name: "Top".into(),
                kind: LayerKind::Signal,
                stack_index: 0,
            }],
            stackup: Stackup {
                layer_order: vec!["L1".into()],
                thickness_mm: 1.6,
                dielectrics: vec![],
            },
        }
    }

    #[test]
    fn pad_absolute_position_rotates_around_footprint() {
        let fp = Footprint {
            id: "fp-r1".into(),
            reference: "R1".into(),
            position: (10.0, 20.0),
            rotation_deg: 90.0,
            layer: "L1".into(),
            library_name: None,
            part_number: None,
            pads: vec!["pad-1".into()],
        };
        let pad = Pad {
            id: "pad-1".into(),
            footprint: "fp-r1".into(),
            net: None,
            shape: PadShape::Rect,
            size: (0.5, 0.5),
            drill_mm: None,
            layers: vec!["L1".into()],
            relative_position: (1.0, 0.0),
        };
        let (x, y) = pad.absolute_position(&fp);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 21.0).abs() < 1e-9);
    }

    #[test]
    fn invariants_reject_unknown_net() {
        let gir = GeometryIr {
            board: Some(sample_board()),
            nets: vec![],
            footprints: vec![],
            pads: vec![],
            tracks: vec![Track {
                id: "t1".into(),
                net: "net-missing".into(),
                layer: "L1".into(),
                from: (0.0, 0.0),
                to: (1.0, 0.0),
                width_mm: 0.2,
            }],
            vias: vec![],
            polygons: vec![],
        };
        assert!(matches!(
            gir.check_invariants(),
            Err(GirInvariantError::UnknownNet { .. })
        ));
    }

    #[test]
    fn invariants_reject_degenerate_track() {
        let gir = GeometryIr {
            board: Some(sample_board()),
            nets: vec![Net {
                id: "net-vcc".into(),
                name: "VCC".into(),
                netclass: None,
            }],
            footprints: vec![],
            pads: vec![],
            tracks: vec![Track {
                id: "t1".into(),
                net: "net-vcc".into(),
                layer: "L1".into(),
                from: (1.0, 1.0),
                to: (1.0, 1.0),
                width_mm: 0.2,
            }],
            vias: vec![],
            polygons: vec![],
        };
        assert!(matches!(
            gir.check_invariants(),
            Err(GirInvariantError::DegenerateTrack { .. })
        ));
    }
}
