//! Compound-document reader (spec.md §4.1). Altium PCB files are OLE2
//! compound documents; streams are addressed by a hierarchical ASCII path
//! such as `Board6/Data`. We treat the container as an opaque hierarchical
//! byte store — unknown streams are ignored, missing expected streams are
//! non-fatal.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::ReaderError;

/// Top-level stream paths the importer expects to find (spec.md §4.1).
pub const STREAM_PATHS: &[&str] = &[
    "Board6/Data",
    "Components6/Data",
    "Nets6/Data",
    "Tracks6/Data",
    "Vias6/Data",
    "Pads6/Data",
    "Rules6/Data",
    "Polygons6/Data",
    "Regions6/Data",
];

pub struct PcbContainer {
    cfb: std::cell::RefCell<cfb::CompoundFile<Cursor<Vec<u8>>>>,
}

impl PcbContainer {
    pub fn open(path: &Path) -> Result<Self, ReaderError> {
        let mut file = File::open(path)
            .map_err(|e| ReaderError::ContainerUnreadable(format!("{}: {e}", path.display())))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| ReaderError::ContainerUnreadable(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ReaderError> {
        const OLE_MAGIC: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];
        if bytes.len() < 8 || bytes[..8] != OLE_MAGIC {
            return Err(ReaderError::ContainerUnreadable(
                "missing OLE2/CFB magic bytes".into(),
            ));
        }
        let cfb = cfb::CompoundFile::open(Cursor::new(bytes))
            .map_err(|e| ReaderError::ContainerUnreadable(e.to_string()))?;
        Ok(PcbContainer {
            cfb: std::cell::RefCell::new(cfb),
        })
    }

    /// Returns the stream's raw bytes, or an empty vector if the stream is
    /// absent — absence is non-fatal per spec.md §4.1.
    pub fn stream_bytes(&self, path: &str) -> Vec<u8> {
        let full_path = format!("/{path}");
        let mut cfb = self.cfb.borrow_mut();
        match cfb.open_stream(&full_path) {
            Ok(mut stream) => {
                let mut data = Vec::new();
                if let Err(e) = stream.read_to_end(&mut data) {
                    tracing::warn!(path = %path, error = %e, "stream read failed, treating as empty");
                    return Vec::new();
                }
                data
            }
            Err(_) => {
                tracing::debug!(path = %path, "stream not present in container");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_ole_bytes() {
        let err = PcbContainer::from_bytes(b"not an ole file".to_vec());
        assert!(matches!(err, Err(ReaderError::ContainerUnreadable(_))));
    }
}
