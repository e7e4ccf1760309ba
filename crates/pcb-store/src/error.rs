use uuid::Uuid;

#[derive(Debug)]
pub enum StoreError {
    /// `update` was called with a version that does not strictly exceed
    /// the artifact's current version (spec.md §4.4 invariant).
    VersionConflict { artifact: Uuid, current: u64, attempted: u64 },
    NotFound { id: Uuid },
    /// `update` changed the artifact's kind, which spec.md §4.4 forbids.
    KindChanged { id: Uuid },
    IoError(std::io::Error),
    Corrupt { id: Uuid, reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::VersionConflict { artifact, current, attempted } => write!(
                f,
                "artifact {artifact}: update version {attempted} does not exceed current {current}"
            ),
            StoreError::NotFound { id } => write!(f, "artifact {id} not found"),
            StoreError::KindChanged { id } => write!(f, "artifact {id}: update changed artifact kind"),
            StoreError::IoError(e) => write!(f, "store I/O error: {e}"),
            StoreError::Corrupt { id, reason } => write!(f, "artifact {id} corrupt: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::IoError(e)
    }
}
