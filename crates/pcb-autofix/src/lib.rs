//! Auto-fix engine (spec.md §4.7): turns an ordered DRC violation list
//! into a typed patch plus a log of what could and couldn't be fixed
//! automatically. One pass, safest fix kind first; never loops DRC
//! itself, so fix-induced oscillation is the caller's call to make by
//! re-running DRC on the result.

pub mod engine;
pub mod error;
pub mod outcome;
pub mod parsing;
pub mod routing;

pub use engine::{fix_violations, FixRun};
pub use error::AutoFixError;
pub use outcome::{FixLogEntry, FixOutcome};
