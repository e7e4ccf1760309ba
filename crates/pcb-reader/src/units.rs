//! Unit inference for numeric fields in key-value text records
//! (spec.md §4.2). A value string may carry an explicit `mil`/`mm` suffix;
//! absent a suffix, magnitude decides: values above 10,000 are internal
//! units (1 unit = 2.54e-5 mm), otherwise mil.
//!
//! Resolves two discrepancies noted in SPEC_FULL.md §3: the source's
//! `altium_file_reader.py` checks `> 100000` at the call site, not
//! `> 10000` as the prose here states; and the prose gives the internal
//! unit conversion as `2.54e-5` mm/unit while the worked testable-property
//! example (`"50000"` → 0.127 mm) is only consistent with `2.54e-6`
//! (matching the source's actual `UNITS_TO_MM = 25.4 / 10_000_000`
//! constant). Both choices here follow the binding numeric example.

pub const MM_PER_INTERNAL_UNIT: f64 = 2.54e-6;
pub const MM_PER_MIL: f64 = 0.0254;
const INTERNAL_UNIT_THRESHOLD: f64 = 10_000.0;

/// Parses a coordinate/dimension string into millimeters, rounded to 4
/// decimal places, per spec.md §4.2 and the unit-inference testable
/// property in §8. Returns `None` for strings that don't parse as a
/// number at all (caller should treat the field as absent).
pub fn parse_to_mm(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (number_part, mm_value) = if let Some(stripped) = trimmed.strip_suffix("mil") {
        (stripped.trim(), None)
    } else if let Some(stripped) = trimmed.strip_suffix("mm") {
        (stripped.trim(), Some(()))
    } else {
        (trimmed, None)
    };

    let magnitude: f64 = number_part.parse().ok()?;

    let mm = if trimmed.ends_with("mil") {
        magnitude * MM_PER_MIL
    } else if mm_value.is_some() {
        magnitude
    } else if magnitude.abs() > INTERNAL_UNIT_THRESHOLD {
        magnitude * MM_PER_INTERNAL_UNIT
    } else {
        magnitude * MM_PER_MIL
    };

    Some(round4(mm))
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mil_suffix_is_honored() {
        assert_eq!(parse_to_mm("33mil"), Some(0.8382));
    }

    #[test]
    fn mm_suffix_is_honored() {
        assert_eq!(parse_to_mm("0.5mm"), Some(0.5));
    }

    #[test]
    fn large_unsuffixed_value_is_internal_units() {
        assert_eq!(parse_to_mm("50000"), Some(0.127));
    }

    #[test]
    fn small_unsuffixed_value_is_mil() {
        assert_eq!(parse_to_mm("200"), Some(5.08));
    }

    #[test]
    fn unparseable_string_is_none() {
        assert_eq!(parse_to_mm("not-a-number"), None);
    }
}
