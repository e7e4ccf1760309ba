//! Versioned persistence envelope. An `Artifact` wraps a JSON-serializable
//! payload (G-IR, C-IR, a violation report, a patch) with a monotonic
//! version, provenance metadata, and a relation list to other artifacts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    PcbBoard,
    ConstraintRuleSet,
    Violations,
    Patch,
    ExecutionResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEngine {
    Altium,
    Cadence,
    Kicad,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    User,
    Agent,
    Engine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRelation {
    pub role: String,
    pub target_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub source_engine: Option<SourceEngine>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub created_by: CreatedBy,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact<T> {
    pub id: Uuid,
    pub kind: ArtifactKind,
    /// Dense chain 1..N within an artifact ID; no gaps (spec.md §3.3).
    pub version: u64,
    pub data: T,
    pub meta: ArtifactMeta,
    pub relations: Vec<ArtifactRelation>,
}

impl<T> Artifact<T> {
    pub fn new(kind: ArtifactKind, data: T, source_engine: Option<SourceEngine>, created_by: CreatedBy) -> Self {
        let now = chrono::Utc::now();
        Artifact {
            id: Uuid::new_v4(),
            kind,
            version: 1,
            data,
            meta: ArtifactMeta {
                source_engine,
                created_at: now,
                updated_at: now,
                created_by,
                tags: Vec::new(),
            },
            relations: Vec::new(),
        }
    }

    /// Produces the next version of this artifact carrying `data`, with
    /// `updated_at` refreshed and `relations` carried forward unless the
    /// caller passes an explicit replacement (spec.md §4.4 invariants).
    pub fn with_next_version(&self, data: T) -> Self
    where
        T: Clone,
    {
        Artifact {
            id: self.id,
            kind: self.kind,
            version: self.version + 1,
            data,
            meta: ArtifactMeta {
                updated_at: chrono::Utc::now(),
                ..self.meta.clone()
            },
            relations: self.relations.clone(),
        }
    }
}
