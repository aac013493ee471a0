//! Producer errors

/// Rejected producer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("grove is already complete")]
    Complete,

    #[error("end of element with no open element")]
    NoOpenElement,
}

/// Result of a producer event
pub type BuildResult<T = ()> = Result<T, BuildError>;
