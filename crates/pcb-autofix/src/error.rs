#[derive(Debug)]
pub enum AutoFixError {
    /// spec.md §4.7: "a pass fails only when the external-tool client is
    /// requested but unreachable" — every other per-violation failure is
    /// recorded in the fix log and the pass continues.
    ClientUnreachable(pcb_client::ClientError),
}

impl std::fmt::Display for AutoFixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoFixError::ClientUnreachable(e) => write!(f, "auto-fix pass aborted, applicator unreachable: {e}"),
        }
    }
}

impl std::error::Error for AutoFixError {}
