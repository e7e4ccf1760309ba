//! Fixed-record binary decoding (spec.md §4.2, family 2). Tracks and vias
//! are usually binary with no reliable record-size header, so we try a
//! small set of candidate record sizes and unit bases and keep the first
//! combination where at least half the records pass a sanity-range check.

/// A candidate decode: a chosen record size, a chosen unit-to-mm factor,
/// and how many of the records it produced passed the sanity check.
pub struct Candidate<T> {
    pub record_size: usize,
    pub mm_per_unit: f64,
    pub records: Vec<T>,
    pub pass_count: usize,
    pub total_count: usize,
}

impl<T> Candidate<T> {
    pub fn pass_ratio(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.pass_count as f64 / self.total_count as f64
        }
    }
}

pub const INTERNAL_UNIT_MM: f64 = crate::units::MM_PER_INTERNAL_UNIT;
pub const MIL_MM: f64 = crate::units::MM_PER_MIL;
const SANITY_PASS_THRESHOLD: f64 = 0.5;

/// Skips a fixed-size per-record header, then hands the remainder of each
/// `record_size`-byte record to `decode_one`, trying every (size, unit)
/// combination and returning the first whose pass ratio meets the
/// threshold — preferring smaller record sizes first, matching the
/// source's candidate order.
pub fn recognize<T>(
    data: &[u8],
    header_skip: usize,
    candidate_sizes: &[usize],
    decode_one: impl Fn(&[u8], f64) -> Option<T>,
    sanity_check: impl Fn(&T) -> bool,
) -> Option<Candidate<T>> {
    let mut best: Option<Candidate<T>> = None;

    for &record_size in candidate_sizes {
        if record_size <= header_skip || data.len() < record_size {
            continue;
        }
        for &mm_per_unit in &[INTERNAL_UNIT_MM, MIL_MM] {
            let mut records = Vec::new();
            let mut pass_count = 0usize;
            let mut offset = 0usize;
            while offset + record_size <= data.len() {
                let record_bytes = &data[offset + header_skip..offset + record_size];
                if let Some(record) = decode_one(record_bytes, mm_per_unit) {
                    if sanity_check(&record) {
                        pass_count += 1;
                    }
                    records.push(record);
                }
                offset += record_size;
            }
            let total_count = records.len();
            if total_count == 0 {
                continue;
            }
            let candidate = Candidate {
                record_size,
                mm_per_unit,
                records,
                pass_count,
                total_count,
            };
            if candidate.pass_ratio() >= SANITY_PASS_THRESHOLD {
                return Some(candidate);
            }
            let candidate_is_better = match &best {
                Some(b) => candidate.pass_ratio() > b.pass_ratio(),
                None => true,
            };
            if candidate_is_better {
                best = Some(candidate);
            }
        }
    }
    best
}

pub fn read_i32_le(bytes: &[u8], offset: usize) -> Option<i32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
