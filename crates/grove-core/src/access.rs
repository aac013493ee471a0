//! Access Results
//!
//! Every navigation or property call answers with a value or one of three
//! distinct failures. `Blocked` is never folded into `Absent`: a reader
//! that gets `Blocked` must retry once more of the grove has been built.

/// Why an access produced no value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AccessError {
    /// Well defined, but there is no value (implied attribute, no parent, end of list)
    #[error("property has no value")]
    Absent,

    /// The operation is not defined for this node's class
    #[error("operation not defined for this node class")]
    WrongClass,

    /// The grove is still being built and the answer has not arrived yet
    #[error("grove incomplete: value not yet available")]
    Blocked,
}

/// Result of a grove access
pub type AccessResult<T> = Result<T, AccessError>;

/// Convenience adapters for access results
pub trait AccessResultExt<T> {
    /// Turn `Absent` into `Ok(None)`, keep the other failures
    fn optional(self) -> AccessResult<Option<T>>;
}

impl<T> AccessResultExt<T> for AccessResult<T> {
    fn optional(self) -> AccessResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(AccessError::Absent) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Outcome of probing the grove state once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stall {
    Failed(AccessError),
    /// Not known yet; the producer may still append the answer
    MoreMayArrive,
}

impl From<AccessError> for Stall {
    fn from(err: AccessError) -> Self {
        Stall::Failed(err)
    }
}

/// Single probe of the grove state
pub(crate) type Probe<T> = Result<T, Stall>;

#[inline]
pub(crate) fn absent<T>() -> Probe<T> {
    Err(Stall::Failed(AccessError::Absent))
}

#[inline]
pub(crate) fn wrong_class<T>() -> Probe<T> {
    Err(Stall::Failed(AccessError::WrongClass))
}

#[inline]
pub(crate) fn more_may_arrive<T>() -> Probe<T> {
    Err(Stall::MoreMayArrive)
}

/// `Some` or `Absent`
#[inline]
pub(crate) fn present<T>(value: Option<T>) -> Probe<T> {
    value.ok_or(Stall::Failed(AccessError::Absent))
}

/// `Absent` becomes `Ok(None)`
#[inline]
pub(crate) fn optional<T>(probe: Probe<T>) -> Probe<Option<T>> {
    match probe {
        Ok(value) => Ok(Some(value)),
        Err(Stall::Failed(AccessError::Absent)) => Ok(None),
        Err(stall) => Err(stall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_keeps_blocked_distinct() {
        let absent: AccessResult<u32> = Err(AccessError::Absent);
        let blocked: AccessResult<u32> = Err(AccessError::Blocked);

        assert_eq!(absent.optional(), Ok(None));
        assert_eq!(blocked.optional(), Err(AccessError::Blocked));
        assert_eq!(Ok::<u32, AccessError>(3).optional(), Ok(Some(3)));
    }
}
