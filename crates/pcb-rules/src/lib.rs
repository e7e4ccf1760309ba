//! Rule model: scope evaluation and priority resolution over the
//! Constraint-IR (spec.md §4.5). The typed rule/parameter data itself
//! lives in `pcb-ir::cir`; this crate is the behavior layered on top —
//! deciding which rule applies to which object.

pub mod defaults;
pub mod scope;

pub use defaults::default_ruleset;
pub use scope::{resolve_rule, ObjectRef};
