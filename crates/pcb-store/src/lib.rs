//! Versioned artifact store (spec.md §4.4): `create`/`read`/`update`/
//! `delete`/`list`/`history` over a per-artifact-UUID directory, with
//! atomic current-pointer writes and per-ID-serialized operations.

pub mod error;
pub mod layout;
pub mod store;

pub use error::StoreError;
pub use store::ArtifactStore;
