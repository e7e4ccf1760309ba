/// What happened when the engine tried to fix one violation, recorded
/// in the run's log regardless of whether an edit op was produced.
#[derive(Debug, Clone)]
pub enum FixOutcome {
    Applied,
    /// Safety checks passed but the caller's live applicator rejected
    /// the change, or a rollback was needed mid-detour.
    Rejected { reason: String },
    /// No safe automated fix exists; a person needs to do this in the
    /// PCB tool directly.
    Manual { reason: String },
}

#[derive(Debug, Clone)]
pub struct FixLogEntry {
    pub rule_kind: String,
    pub net: Option<String>,
    pub outcome: FixOutcome,
}
