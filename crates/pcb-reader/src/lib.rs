//! Binary PCB reader: opens Altium's OLE-compound-document container and
//! decodes its streams into typed records (spec.md §4.1, §4.2).
//!
//! This crate never panics on malformed input and never fails a decode
//! outright — it emits as many well-formed records as it can and surfaces
//! a [`Warning`] list alongside them, per spec.md's "Decoders must never
//! throw on corrupted input" contract. Only opening the container itself
//! can fail hard ([`ReaderError`]).

pub mod binary;
pub mod container;
pub mod records;
pub mod rules;
pub mod text;
pub mod units;

use std::fmt;

pub use container::{PcbContainer, STREAM_PATHS};
pub use records::{
    BoardRecord, ComponentRecord, NetRecord, OpaqueRecord, PadRecord, PolygonRecord, TrackOrOpaque,
    TrackRecord, ViaOrOpaque, ViaRecord,
};
pub use rules::RawRuleRecord;

#[derive(Debug)]
pub enum ReaderError {
    ContainerUnreadable(String),
    StreamUnreadable { path: String, reason: String },
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::ContainerUnreadable(reason) => {
                write!(f, "container unreadable: {reason}")
            }
            ReaderError::StreamUnreadable { path, reason } => {
                write!(f, "stream {path} unreadable: {reason}")
            }
        }
    }
}

impl std::error::Error for ReaderError {}

/// A non-fatal condition surfaced alongside a decoded record set, per
/// spec.md §4.2 ("append a stream-level warning to the importer context").
#[derive(Debug, Clone)]
pub struct Warning {
    pub stream: String,
    pub message: String,
}

/// Everything the decoders produced for one PCB file: raw record lists
/// per stream plus accumulated warnings. Unparsed/missing streams are
/// simply empty vectors (spec.md §4.1: "Missing streams are non-fatal").
#[derive(Debug, Default)]
pub struct DecodedPcb {
    pub board: Vec<BoardRecord>,
    pub components: Vec<ComponentRecord>,
    pub nets: Vec<NetRecord>,
    pub tracks: Vec<TrackOrOpaque>,
    pub vias: Vec<ViaOrOpaque>,
    pub pads: Vec<PadRecord>,
    pub rules: Vec<RawRuleRecord>,
    pub polygons: Vec<PolygonRecord>,
    pub regions: Vec<PolygonRecord>,
    pub warnings: Vec<Warning>,
}

/// Opens `path` as a compound document and decodes every known stream.
pub fn read_pcb_file(path: &std::path::Path) -> Result<DecodedPcb, ReaderError> {
    let container = PcbContainer::open(path)?;
    Ok(decode_container(&container))
}

/// Decodes an already-open container. Split out from [`read_pcb_file`] so
/// tests can build a [`PcbContainer`] from in-memory bytes.
pub fn decode_container(container: &PcbContainer) -> DecodedPcb {
    let mut out = DecodedPcb::default();

    let board_bytes = container.stream_bytes("Board6/Data");
    out.board = records::decode_board(&board_bytes, &mut out.warnings);

    let comp_bytes = container.stream_bytes("Components6/Data");
    out.components = records::decode_components(&comp_bytes, &mut out.warnings);

    let net_bytes = container.stream_bytes("Nets6/Data");
    out.nets = records::decode_nets(&net_bytes, &mut out.warnings);

    let track_bytes = container.stream_bytes("Tracks6/Data");
    out.tracks = records::decode_tracks(&track_bytes, &mut out.warnings);

    let via_bytes = container.stream_bytes("Vias6/Data");
    out.vias = records::decode_vias(&via_bytes, &mut out.warnings);

    let pad_bytes = container.stream_bytes("Pads6/Data");
    out.pads = records::decode_pads(&pad_bytes, &mut out.warnings);

    let rule_bytes = container.stream_bytes("Rules6/Data");
    out.rules = rules::decode_rules(&rule_bytes, &mut out.warnings);

    let poly_bytes = container.stream_bytes("Polygons6/Data");
    out.polygons = records::decode_polygons(&poly_bytes, &mut out.warnings);

    let region_bytes = container.stream_bytes("Regions6/Data");
    out.regions = records::decode_polygons(&region_bytes, &mut out.warnings);

    out
}
