use thiserror::Error;

/// Errors that stop a scan before or during the probing phase.
///
/// Per-candidate transport failures are not errors at this level: they are
/// recorded as failed outcomes and the run carries on.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no usable baseline: all {attempted} baseline probes failed (last error: {last_error})")]
    BaselineUnavailable { attempted: usize, last_error: String },

    #[error("scan cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ScanError>;
