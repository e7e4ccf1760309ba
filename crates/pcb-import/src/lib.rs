//! Importer / IR builder (spec.md §4.3): turns decoded Altium records
//! (`pcb-reader`) plus an optional JSON companion into a [`GeometryIr`]
//! and [`ConstraintIr`], both satisfying the invariants `pcb-ir::gir`
//! checks.

pub mod build_cir;
pub mod build_gir;
pub mod companion;
pub mod error;
pub mod ids;
pub mod export;

pub use companion::CompanionData;
pub use error::ImportError;

use pcb_ir::cir::ConstraintIr;
use pcb_ir::gir::GeometryIr;
use pcb_reader::DecodedPcb;

/// Runs the full import: G-IR from binary + companion merge, then C-IR
/// from binary rules + companion `design_rules.json`, falling back to
/// [`pcb_rules::default_ruleset`] when neither yields anything.
pub fn import(
    decoded: &DecodedPcb,
    companion: Option<&CompanionData>,
) -> Result<(GeometryIr, ConstraintIr), ImportError> {
    let gir = build_gir::build_gir(decoded, companion)?;
    gir.check_invariants().map_err(|e| ImportError::ImportFailed { reason: e.to_string() })?;

    let from_binary = build_cir::build_cir_from_binary(&decoded.rules);
    let from_companion = companion.and_then(build_cir::build_cir_from_companion);
    let cir = build_cir::merge(from_binary, from_companion);

    Ok((gir, cir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn import_fails_when_nothing_recovered() {
        let decoded = DecodedPcb::default();
        let result = import(&decoded, None);
        assert!(matches!(result, Err(ImportError::ImportFailed { .. })));
    }

    #[test]
    fn import_falls_back_to_default_ruleset() {
        let mut decoded = DecodedPcb::default();
        decoded.components.push(pcb_reader::ComponentRecord {
            fields: HashMap::from([("SOURCEDESIGNATOR".to_string(), "R1".to_string())]),
        });
        let (_, cir) = import(&decoded, None).unwrap();
        assert_eq!(cir.rules.len(), 5);
    }
}
