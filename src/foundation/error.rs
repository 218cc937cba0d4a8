/// Convenience result type used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Whether an oracle failure is worth retrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorKind {
    /// Timeouts, empty outputs, overloaded backends.
    Transient,
    /// Malformed output or a capability that will never succeed for this input.
    Permanent,
}

/// Failure reported by an external inference capability.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind:?} oracle failure: {message}")]
pub struct OracleError {
    /// Retry classification.
    pub kind: OracleErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl OracleError {
    /// Build a retryable failure.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self {
            kind: OracleErrorKind::Transient,
            message: msg.into(),
        }
    }

    /// Build a non-retryable failure.
    pub fn permanent(msg: impl Into<String>) -> Self {
        Self {
            kind: OracleErrorKind::Permanent,
            message: msg.into(),
        }
    }

    /// Return `true` for [`OracleErrorKind::Transient`].
    pub fn is_transient(&self) -> bool {
        self.kind == OracleErrorKind::Transient
    }
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid timeline parameters or request data; rejected before a job exists.
    #[error("input error: {0}")]
    Input(String),

    /// An oracle call failed (after retries, when transient).
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Image decode or frame composition failure.
    #[error("render error: {0}")]
    Render(String),

    /// Encoding/muxing failure. Never retried.
    #[error("mux error: {0}")]
    Mux(String),

    /// Unknown job ids and illegal state transitions.
    #[error("job error: {0}")]
    Job(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Mux`] value.
    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux(msg.into())
    }

    /// Build a [`ReelError::Job`] value.
    pub fn job(msg: impl Into<String>) -> Self {
        Self::Job(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Only transient oracle failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Oracle(e) if e.is_transient())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
