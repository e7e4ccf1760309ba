//! Glue between crates: load a board, import it, persist artifacts, run
//! DRC, auto-fix, and talk to the external applicator. `main.rs`'s
//! subcommand handlers are thin wrappers over these functions so the
//! control flow itself stays testable without going through `clap`.

use std::path::Path;

use pcb_ir::artifact::{Artifact, ArtifactKind, CreatedBy, SourceEngine};
use pcb_ir::cir::ConstraintIr;
use pcb_ir::gir::GeometryIr;
use pcb_ir::patch::Patch;
use pcb_ir::violation::Violation;
use pcb_store::ArtifactStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug)]
pub enum PipelineError {
    Reader(pcb_reader::ReaderError),
    Import(pcb_import::ImportError),
    Store(pcb_store::StoreError),
    Drc(pcb_drc::engine::DrcError),
    AutoFix(pcb_autofix::AutoFixError),
    Client(pcb_client::ClientError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Reader(e) => write!(f, "{e}"),
            PipelineError::Import(e) => write!(f, "{e}"),
            PipelineError::Store(e) => write!(f, "{e}"),
            PipelineError::Drc(e) => write!(f, "{e}"),
            PipelineError::AutoFix(e) => write!(f, "{e}"),
            PipelineError::Client(e) => write!(f, "{e}"),
            PipelineError::Io(e) => write!(f, "{e}"),
            PipelineError::Json(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

macro_rules! from_err {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for PipelineError {
            fn from(e: $ty) -> Self {
                PipelineError::$variant(e)
            }
        }
    };
}

from_err!(Reader, pcb_reader::ReaderError);
from_err!(Import, pcb_import::ImportError);
from_err!(Store, pcb_store::StoreError);
from_err!(Drc, pcb_drc::engine::DrcError);
from_err!(AutoFix, pcb_autofix::AutoFixError);
from_err!(Client, pcb_client::ClientError);
from_err!(Io, std::io::Error);
from_err!(Json, serde_json::Error);

/// Artifact stores for each kind this pipeline persists, all rooted
/// under `Config::store_dir` (spec.md §6.2: one subdirectory per kind).
pub struct Stores {
    pub boards: ArtifactStore<GeometryIr>,
    pub rulesets: ArtifactStore<ConstraintIr>,
    pub violations: ArtifactStore<Vec<Violation>>,
    pub patches: ArtifactStore<Patch>,
}

impl Stores {
    pub fn open(config: &Config) -> Self {
        Stores {
            boards: ArtifactStore::open(config.store_dir.join("boards")),
            rulesets: ArtifactStore::open(config.store_dir.join("rulesets")),
            violations: ArtifactStore::open(config.store_dir.join("violations")),
            patches: ArtifactStore::open(config.store_dir.join("patches")),
        }
    }
}

/// Reads `pcb_info.json` / `design_rules.json` / `copper_regions.json`
/// out of `dir` if present, tolerating any subset being absent (spec.md
/// §4.3: the companion is optional in whole and in part).
pub fn load_companion(dir: &Path) -> Result<pcb_import::CompanionData, PipelineError> {
    let read_json = |name: &str| -> Result<Option<serde_json::Value>, PipelineError> {
        let path = dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    };

    Ok(pcb_import::CompanionData {
        pcb_info: read_json("pcb_info.json")?,
        design_rules: read_json("design_rules.json")?,
        copper_regions: read_json("copper_regions.json")?,
    })
}

/// Loads a binary PCB file plus optional companion directory, imports
/// it, and persists both resulting artifacts as version 1.
pub fn load_and_import(
    config: &Config,
    pcb_path: &Path,
    companion_dir: Option<&Path>,
    stores: &Stores,
) -> Result<(Artifact<GeometryIr>, Artifact<ConstraintIr>), PipelineError> {
    let decoded = pcb_reader::read_pcb_file(pcb_path)?;
    let companion = companion_dir.map(load_companion).transpose()?;
    let (gir, mut cir) = pcb_import::import(&decoded, companion.as_ref())?;

    // Only the built-in default ruleset (no binary rules, no companion
    // design_rules.json) is subject to config overrides; rules actually
    // recovered from the board file are authoritative as-is.
    if cir.rules.iter().any(|r| r.id == "default-clearance") {
        config.default_rules.apply(&mut cir);
    }

    let board = stores.boards.create(Artifact::new(
        ArtifactKind::PcbBoard,
        gir,
        Some(SourceEngine::Altium),
        CreatedBy::User,
    ))?;
    let ruleset = stores.rulesets.create(Artifact::new(
        ArtifactKind::ConstraintRuleSet,
        cir,
        Some(SourceEngine::Altium),
        CreatedBy::User,
    ))?;

    Ok((board, ruleset))
}

/// Runs DRC over the latest version of `board_id` against `ruleset_id`
/// and persists the violation list as a new `Violations` artifact.
pub fn run_drc(
    board_id: Uuid,
    ruleset_id: Uuid,
    stores: &Stores,
) -> Result<Artifact<Vec<Violation>>, PipelineError> {
    let board = stores.boards.read(board_id, None)?;
    let ruleset = stores.rulesets.read(ruleset_id, None)?;
    let result = pcb_drc::run_drc(&board.data, &ruleset.data)?;

    tracing::info!(
        total = result.summary.total,
        errors = result.summary.errors,
        warnings = result.summary.warnings,
        "drc complete"
    );

    let violations = stores.violations.create(Artifact::new(
        ArtifactKind::Violations,
        result.violations,
        None,
        CreatedBy::Engine,
    ))?;
    Ok(violations)
}

/// Runs the auto-fix engine over the latest violation list for
/// `board_id`, producing a `Patch` artifact. `client` is `None` for an
/// offline pass (spec.md §4.7/§4.8 open question, see DESIGN.md).
pub fn run_autofix(
    board_id: Uuid,
    ruleset_id: Uuid,
    violations_id: Uuid,
    stores: &Stores,
    client: Option<&pcb_client::AltiumClient>,
) -> Result<(Artifact<Patch>, Vec<pcb_autofix::FixLogEntry>), PipelineError> {
    let board = stores.boards.read(board_id, None)?;
    let ruleset = stores.rulesets.read(ruleset_id, None)?;
    let violations = stores.violations.read(violations_id, None)?;

    let run = pcb_autofix::fix_violations(
        &violations.data,
        &board.data,
        &ruleset.data,
        board.id,
        board.version,
        client,
    )?;

    for entry in &run.log {
        tracing::info!(rule_kind = %entry.rule_kind, net = ?entry.net, outcome = ?entry.outcome, "autofix");
    }

    let patch = stores.patches.create(Artifact::new(ArtifactKind::Patch, run.patch, None, CreatedBy::Engine))?;
    Ok((patch, run.log))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardSummary {
    pub footprints: usize,
    pub nets: usize,
    pub tracks: usize,
    pub vias: usize,
}

pub fn summarize(gir: &GeometryIr) -> BoardSummary {
    BoardSummary {
        footprints: gir.footprints.len(),
        nets: gir.nets.len(),
        tracks: gir.tracks.len(),
        vias: gir.vias.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_companion_tolerates_missing_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        let companion = load_companion(dir.path()).unwrap();
        assert!(companion.pcb_info.is_none());
        assert!(companion.design_rules.is_none());
        assert!(companion.copper_regions.is_none());
    }

    #[test]
    fn load_companion_reads_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pcb_info.json"), r#"{"width_mm": 100.0}"#).unwrap();
        let companion = load_companion(dir.path()).unwrap();
        assert!(companion.pcb_info.is_some());
        assert!(companion.design_rules.is_none());
    }
}
