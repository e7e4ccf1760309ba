use std::fmt;

#[derive(Debug)]
pub enum ImportError {
    /// Neither the binary decode nor a JSON companion yielded a parsable
    /// board outline and at least one component (spec.md §4.3 Failure).
    ImportFailed { reason: String },
    CompanionJsonInvalid { reason: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::ImportFailed { reason } => write!(f, "import failed: {reason}"),
            ImportError::CompanionJsonInvalid { reason } => {
                write!(f, "companion JSON invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ImportError {}
