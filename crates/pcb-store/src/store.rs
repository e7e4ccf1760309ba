//! The versioned artifact store itself (spec.md §4.4).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pcb_ir::artifact::{Artifact, ArtifactKind, ArtifactRelation};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::layout;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct IndexRecord {
    kind: ArtifactKind,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    relations: Vec<ArtifactRelation>,
}

/// A file-based, per-artifact-ID-serialized store for `Artifact<T>`
/// values. One store instance is scoped to a single payload type — the
/// binary's top-level wiring (`pcb-cli`) holds one store per artifact
/// kind it manages (board, rule set, violations, patch, result).
pub struct ArtifactStore<T> {
    base_dir: PathBuf,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    _marker: std::marker::PhantomData<T>,
}

impl<T> ArtifactStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        ArtifactStore {
            base_dir: base_dir.into(),
            locks: Mutex::new(HashMap::new()),
            _marker: std::marker::PhantomData,
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub fn create(&self, artifact: Artifact<T>) -> Result<Artifact<T>, StoreError> {
        let guard = self.lock_for(artifact.id);
        let _lock = guard.lock().expect("artifact lock poisoned");
        self.write_version(&artifact)?;
        self.write_current(artifact.id, artifact.version)?;
        self.write_index(&artifact)?;
        Ok(artifact)
    }

    pub fn read(&self, id: Uuid, version: Option<u64>) -> Result<Artifact<T>, StoreError> {
        let guard = self.lock_for(id);
        let _lock = guard.lock().expect("artifact lock poisoned");
        let version = match version {
            Some(v) => v,
            None => self.read_current(id)?,
        };
        self.read_version(id, version)
    }

    pub fn update(&self, artifact: Artifact<T>) -> Result<Artifact<T>, StoreError> {
        let guard = self.lock_for(artifact.id);
        let _lock = guard.lock().expect("artifact lock poisoned");

        let current_version = self.read_current(artifact.id)?;
        if artifact.version <= current_version {
            return Err(StoreError::VersionConflict {
                artifact: artifact.id,
                current: current_version,
                attempted: artifact.version,
            });
        }
        let existing = self.read_version(artifact.id, current_version)?;
        if existing.kind != artifact.kind {
            return Err(StoreError::KindChanged { id: artifact.id });
        }

        self.write_version(&artifact)?;
        self.write_current(artifact.id, artifact.version)?;
        self.write_index(&artifact)?;
        Ok(artifact)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let guard = self.lock_for(id);
        let _lock = guard.lock().expect("artifact lock poisoned");
        let dir = layout::artifact_dir(&self.base_dir, id);
        if !dir.exists() {
            return Err(StoreError::NotFound { id });
        }
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Ascending version numbers actually on disk for this artifact.
    pub fn history(&self, id: Uuid) -> Result<Vec<u64>, StoreError> {
        let guard = self.lock_for(id);
        let _lock = guard.lock().expect("artifact lock poisoned");
        let dir = layout::artifact_dir(&self.base_dir, id);
        if !dir.exists() {
            return Err(StoreError::NotFound { id });
        }
        let mut versions: Vec<u64> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                name.strip_prefix('v')?.strip_suffix(".json")?.parse().ok()
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn list(&self, kind: Option<ArtifactKind>) -> Result<Vec<Uuid>, StoreError> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let Ok(id) = entry.file_name().to_string_lossy().parse::<Uuid>() else {
                continue;
            };
            let index_path = layout::index_path(&self.base_dir, id);
            let Ok(bytes) = std::fs::read(&index_path) else {
                continue;
            };
            let Ok(index) = serde_json::from_slice::<IndexRecord>(&bytes) else {
                continue;
            };
            if kind.map(|k| k == index.kind).unwrap_or(true) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn write_version(&self, artifact: &Artifact<T>) -> Result<(), StoreError> {
        let path = layout::version_path(&self.base_dir, artifact.id, artifact.version);
        let bytes = serde_json::to_vec_pretty(artifact)
            .map_err(|e| StoreError::Corrupt { id: artifact.id, reason: e.to_string() })?;
        layout::atomic_write(&path, &bytes)?;
        Ok(())
    }

    fn write_current(&self, id: Uuid, version: u64) -> Result<(), StoreError> {
        layout::atomic_write(&layout::current_pointer_path(&self.base_dir, id), version.to_string().as_bytes())?;
        Ok(())
    }

    fn write_index(&self, artifact: &Artifact<T>) -> Result<(), StoreError> {
        let index = IndexRecord {
            kind: artifact.kind,
            created_at: artifact.meta.created_at,
            updated_at: artifact.meta.updated_at,
            relations: artifact.relations.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&index)
            .map_err(|e| StoreError::Corrupt { id: artifact.id, reason: e.to_string() })?;
        layout::atomic_write(&layout::index_path(&self.base_dir, artifact.id), &bytes)?;
        Ok(())
    }

    fn read_current(&self, id: Uuid) -> Result<u64, StoreError> {
        let path = layout::current_pointer_path(&self.base_dir, id);
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound { id }
            } else {
                StoreError::IoError(e)
            }
        })?;
        String::from_utf8_lossy(&bytes)
            .trim()
            .parse()
            .map_err(|_| StoreError::Corrupt { id, reason: "current pointer is not a valid version number".into() })
    }

    fn read_version(&self, id: Uuid, version: u64) -> Result<Artifact<T>, StoreError> {
        let path = layout::version_path(&self.base_dir, id, version);
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound { id }
            } else {
                StoreError::IoError(e)
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt { id, reason: e.to_string() })
    }
}
