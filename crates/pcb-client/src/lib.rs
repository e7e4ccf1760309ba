//! File-based request/response client for the live Altium applicator
//! bridge (spec.md §4.9, §6.3). The applicator and this client never
//! share a lock; every guarantee comes from polling discipline and the
//! `action` echo, not from the filesystem.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::AltiumClient;
pub use error::ClientError;
pub use protocol::{Request, Response};
