//! Typed (or best-effort raw) records produced by the stream decoders.
//! Text-stream records are exposed as field maps — the importer, not the
//! decoder, knows which Altium keys mean what (spec.md's normalization
//! guidance in §9) — while binary-stream records (tracks, vias) are
//! exposed as concrete structs once a (record size, unit base) candidate
//! has been recognized.

use std::collections::HashMap;

use crate::binary::{read_i32_le, recognize};
use crate::text::{latin1_to_string, parse_pipe_fields, split_records_on_nul, split_records_on_sentinel};
use crate::units::round4;
use crate::Warning;

#[derive(Debug, Clone, Default)]
pub struct BoardRecord {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRecord {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct NetRecord {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct PadRecord {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct PolygonRecord {
    pub fields: HashMap<String, String>,
}

/// A decoded track segment. `width_mm` is always `0.0` — see
/// `TODO(width-decoder)` below — callers must treat it as "unknown" and
/// skip width checks rather than as a true zero width.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub component_id: i32,
    pub from_mm: (f64, f64),
    pub to_mm: (f64, f64),
    pub width_mm: f64,
    /// Layer name as written in the stream's `LAYER` field, when the
    /// text-record form carried one. Binary records don't encode a
    /// recognizable layer tag, so this is `None` there; the importer
    /// falls back to the board's first signal layer in that case.
    pub layer_tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ViaRecord {
    pub position_mm: (f64, f64),
    pub drill_mm: f64,
    pub diameter_mm: f64,
}

#[derive(Debug, Clone)]
pub struct OpaqueRecord {
    pub note: String,
}

#[derive(Debug, Clone)]
pub enum TrackOrOpaque {
    Track(TrackRecord),
    Opaque(OpaqueRecord),
}

#[derive(Debug, Clone)]
pub enum ViaOrOpaque {
    Via(ViaRecord),
    Opaque(OpaqueRecord),
}

pub fn decode_board(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<BoardRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let text = latin1_to_string(bytes);
    let fields = parse_pipe_fields(&text);
    if fields.is_empty() {
        warnings.push(Warning {
            stream: "Board6/Data".into(),
            message: "no key-value fields recovered from board stream".into(),
        });
        return Vec::new();
    }
    vec![BoardRecord { fields }]
}

pub fn decode_components(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<ComponentRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let text = latin1_to_string(bytes);
    let raw = split_records_on_sentinel(&text, "|UNICODE=EXISTS|");
    if raw.is_empty() {
        warnings.push(Warning {
            stream: "Components6/Data".into(),
            message: "no component records recovered".into(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter(|fields| {
            let designator = fields.get("SOURCEDESIGNATOR").cloned().unwrap_or_default();
            seen.insert(designator)
        })
        .map(|fields| ComponentRecord { fields })
        .collect()
}

pub fn decode_nets(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<NetRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let raw = split_records_on_nul(bytes);
    if raw.is_empty() {
        warnings.push(Warning {
            stream: "Nets6/Data".into(),
            message: "no net records recovered".into(),
        });
    }
    raw.into_iter().map(|fields| NetRecord { fields }).collect()
}

pub fn decode_pads(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<PadRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let text = latin1_to_string(bytes);
    let raw = split_records_on_sentinel(&text, "|RECORD=");
    if raw.is_empty() {
        warnings.push(Warning {
            stream: "Pads6/Data".into(),
            message: "no pad records recovered".into(),
        });
    }
    raw.into_iter().map(|fields| PadRecord { fields }).collect()
}

pub fn decode_polygons(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<PolygonRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let text = latin1_to_string(bytes);
    let raw = split_records_on_sentinel(&text, "|NAME=");
    if raw.is_empty() {
        warnings.push(Warning {
            stream: "Polygons6/Data".into(),
            message: "no polygon/region records recovered".into(),
        });
    }
    raw.into_iter().map(|fields| PolygonRecord { fields }).collect()
}

const TRACK_RECORD_SIZES: &[usize] = &[32, 36, 40, 44, 48];
const TRACK_HEADER_SKIP: usize = 4;

fn track_sanity(record: &TrackRecord, raw_width_mm: f64) -> bool {
    let coords_ok = [record.from_mm.0, record.from_mm.1, record.to_mm.0, record.to_mm.1]
        .iter()
        .all(|c| (0.0..=1000.0).contains(c));
    let width_ok = (0.05..=10.0).contains(&raw_width_mm);
    coords_ok && width_ok
}

pub fn decode_tracks(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<TrackOrOpaque> {
    if bytes.is_empty() {
        return Vec::new();
    }

    // Tracks are occasionally stored as key-value text rather than binary;
    // sniff for the text form first.
    let text = latin1_to_string(bytes);
    if text.contains("|LAYER=") {
        let raw = split_records_on_sentinel(&text, "|LAYER=");
        return raw
            .into_iter()
            .map(|fields| {
                let from = (
                    fields.get("X1").and_then(|v| crate::units::parse_to_mm(v)).unwrap_or(0.0),
                    fields.get("Y1").and_then(|v| crate::units::parse_to_mm(v)).unwrap_or(0.0),
                );
                let to = (
                    fields.get("X2").and_then(|v| crate::units::parse_to_mm(v)).unwrap_or(0.0),
                    fields.get("Y2").and_then(|v| crate::units::parse_to_mm(v)).unwrap_or(0.0),
                );
                TrackOrOpaque::Track(TrackRecord {
                    component_id: fields
                        .get("COMPONENT")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(-1),
                    from_mm: from,
                    to_mm: to,
                    // TODO(width-decoder): text-form width is equally
                    // unreliable in the source; skip it here too.
                    width_mm: 0.0,
                    layer_tag: fields.get("LAYER").cloned(),
                })
            })
            .collect();
    }

    let decode_one = |bytes: &[u8], mm_per_unit: f64| -> Option<(TrackRecord, f64)> {
        let x1 = read_i32_le(bytes, 0)? as f64 * mm_per_unit;
        let y1 = read_i32_le(bytes, 4)? as f64 * mm_per_unit;
        let x2 = read_i32_le(bytes, 8)? as f64 * mm_per_unit;
        let y2 = read_i32_le(bytes, 12)? as f64 * mm_per_unit;
        let raw_width = read_i32_le(bytes, 16)? as f64 * mm_per_unit;
        Some((
            TrackRecord {
                component_id: -1,
                from_mm: (round4(x1), round4(y1)),
                to_mm: (round4(x2), round4(y2)),
                // TODO(width-decoder): binary track widths are unreliable
                // (the source observed implausible values > 50 mm) and are
                // never trusted; width checking is skipped downstream.
                width_mm: 0.0,
                layer_tag: None,
            },
            round4(raw_width.abs()),
        ))
    };

    let candidate = recognize(
        bytes,
        TRACK_HEADER_SKIP,
        TRACK_RECORD_SIZES,
        decode_one,
        |(record, raw_width)| track_sanity(record, *raw_width),
    );

    match candidate {
        Some(candidate) if candidate.pass_ratio() >= 0.5 => candidate
            .records
            .into_iter()
            .map(|(record, _)| TrackOrOpaque::Track(record))
            .collect(),
        _ => {
            warnings.push(Warning {
                stream: "Tracks6/Data".into(),
                message: "no (record size, unit base) candidate passed the sanity ratio; emitting opaque placeholders".into(),
            });
            let count = bytes.len() / TRACK_RECORD_SIZES[0].max(1);
            (0..count)
                .map(|i| {
                    TrackOrOpaque::Opaque(OpaqueRecord {
                        note: format!("unparseable track record at index {i}"),
                    })
                })
                .collect()
        }
    }
}

const VIA_RECORD_SIZES: &[usize] = &[20, 24, 28, 32];
const VIA_HEADER_SKIP: usize = 4;

fn via_sanity(record: &ViaRecord) -> bool {
    let coords_ok = (0.0..=1000.0).contains(&record.position_mm.0)
        && (0.0..=1000.0).contains(&record.position_mm.1);
    let hole_ok = (0.1..=5.0).contains(&record.drill_mm);
    let diameter_ok = (0.2..=10.0).contains(&record.diameter_mm);
    coords_ok && hole_ok && diameter_ok
}

pub fn decode_vias(bytes: &[u8], warnings: &mut Vec<Warning>) -> Vec<ViaOrOpaque> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let decode_one = |bytes: &[u8], mm_per_unit: f64| -> Option<ViaRecord> {
        let x = read_i32_le(bytes, 0)? as f64 * mm_per_unit;
        let y = read_i32_le(bytes, 4)? as f64 * mm_per_unit;
        let hole = read_i32_le(bytes, 8)? as f64 * mm_per_unit;
        let diameter = read_i32_le(bytes, 12)? as f64 * mm_per_unit;
        Some(ViaRecord {
            position_mm: (round4(x), round4(y)),
            drill_mm: round4(hole.abs()),
            diameter_mm: round4(diameter.abs()),
        })
    };

    let candidate = recognize(bytes, VIA_HEADER_SKIP, VIA_RECORD_SIZES, decode_one, via_sanity);

    match candidate {
        Some(candidate) if candidate.pass_ratio() >= 0.5 => {
            candidate.records.into_iter().map(ViaOrOpaque::Via).collect()
        }
        _ => {
            warnings.push(Warning {
                stream: "Vias6/Data".into(),
                message: "no (record size, unit base) candidate passed the sanity ratio; emitting opaque placeholders".into(),
            });
            let count = bytes.len() / VIA_RECORD_SIZES[0].max(1);
            (0..count)
                .map(|i| {
                    ViaOrOpaque::Opaque(OpaqueRecord {
                        note: format!("unparseable via record at index {i}"),
                    })
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_track(x1: i32, y1: i32, x2: i32, y2: i32, width: i32) -> Vec<u8> {
        let mut bytes = vec![0u8; 4]; // header
        for v in [x1, y1, x2, y2, width] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.resize(32, 0);
        bytes
    }

    #[test]
    fn recognizes_internal_unit_tracks() {
        // 10mm == 10 / 2.54e-6 internal units
        let unit = |mm: f64| (mm / crate::units::MM_PER_INTERNAL_UNIT).round() as i32;
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend(encode_track(unit(10.0), unit(10.0), unit(20.0), unit(10.0), unit(0.2)));
        }
        let mut warnings = Vec::new();
        let tracks = decode_tracks(&data, &mut warnings);
        assert_eq!(tracks.len(), 4);
        assert!(matches!(tracks[0], TrackOrOpaque::Track(_)));
        if let TrackOrOpaque::Track(t) = &tracks[0] {
            assert!((t.from_mm.0 - 10.0).abs() < 0.01);
            assert_eq!(t.width_mm, 0.0);
        }
    }

    #[test]
    fn component_records_dedupe_by_designator() {
        let text = "|UNICODE=EXISTS|SOURCEDESIGNATOR=R1|\
                     |UNICODE=EXISTS|SOURCEDESIGNATOR=R1|\
                     |UNICODE=EXISTS|SOURCEDESIGNATOR=C1|";
        let mut warnings = Vec::new();
        let records = decode_components(text.as_bytes(), &mut warnings);
        assert_eq!(records.len(), 2);
    }
}
