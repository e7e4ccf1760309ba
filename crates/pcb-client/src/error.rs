#[derive(Debug)]
pub enum ClientError {
    /// No response within the action's timeout and the request file is
    /// still present — the applicator never picked it up.
    ContainerUnreachable { action: String, timeout: std::time::Duration },
    /// Too many consecutive responses echoed a different `action` than
    /// the one just sent.
    StaleResponse { action: String, discarded: usize },
    /// The applicator answered but reported `success: false`.
    AppError { action: String, message: String },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ContainerUnreachable { action, timeout } => {
                write!(f, "no response to '{action}' within {timeout:?}; applicator may not be running")
            }
            ClientError::StaleResponse { action, discarded } => {
                write!(f, "gave up on '{action}' after discarding {discarded} stale responses")
            }
            ClientError::AppError { action, message } => write!(f, "applicator rejected '{action}': {message}"),
            ClientError::Io(e) => write!(f, "client I/O error: {e}"),
            ClientError::Json(e) => write!(f, "client JSON error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Json(e)
    }
}
