//! Scheduler errors — configuration and protocol violations
//!
//! Everything here is a programming error, not a runtime condition.
//! The `try_*` operations hand these back; the plain operations route
//! them through [`fatal`], which never returns.
//!
//! Energy deferral, duplicate activation and retry are not errors and
//! never show up in this type.

use crate::task::TaskId;

/// Result alias for fallible scheduler operations
pub type Result<T> = core::result::Result<T, PowertaskError>;

/// Unrecoverable scheduler error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PowertaskError {
    /// Two descriptors share an ID
    #[error("register ID collision: old ID {id} ({existing}), new ID {id} ({incoming})")]
    DuplicateId {
        id: TaskId,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Activation of a task that was never registered
    #[error("invalid task in make_runnable: {0}")]
    UnknownTask(TaskId),

    /// Task function returned a code outside the result protocol
    #[error("task {id} returned invalid result code {code:04x}")]
    InvalidResult { id: TaskId, code: u16 },

    /// Caller-supplied buffer disagrees with the descriptor
    #[error("task {id} buffer length {actual}, descriptor declares {expected}")]
    BufferLength {
        id: TaskId,
        expected: u16,
        actual: u16,
    },

    /// Wire packet shorter than its header claims
    #[error("telemetry packet truncated: need {needed} bytes, got {got}")]
    TruncatedPacket { needed: usize, got: usize },
}

impl PowertaskError {
    /// Task ID the error is about, if any
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            PowertaskError::DuplicateId { id, .. }
            | PowertaskError::UnknownTask(id)
            | PowertaskError::InvalidResult { id, .. }
            | PowertaskError::BufferLength { id, .. } => Some(*id),
            PowertaskError::TruncatedPacket { .. } => None,
        }
    }
}

/// Report a fatal error and stop.
///
/// The release profile builds with `panic = "abort"`, so this terminates
/// the process; under test it unwinds and can be caught by `#[should_panic]`.
#[cold]
#[track_caller]
pub fn fatal(err: PowertaskError) -> ! {
    log::error!("FATAL powertask ERROR: {}", err);
    panic!("FATAL powertask ERROR: {}", err)
}

/// Unwrap a scheduler result, aborting on error
#[inline]
#[track_caller]
pub(crate) fn or_fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_names_offending_id() {
        let err = PowertaskError::UnknownTask(TaskId(0xB007));
        assert_eq!(err.to_string(), "invalid task in make_runnable: b007");
        assert_eq!(err.task_id(), Some(TaskId(0xB007)));
    }

    #[test]
    fn test_invalid_result_display() {
        let err = PowertaskError::InvalidResult { id: TaskId(0xA123), code: 0x0042 };
        assert_eq!(err.to_string(), "task a123 returned invalid result code 0042");
    }

    #[test]
    fn test_truncated_has_no_task() {
        let err = PowertaskError::TruncatedPacket { needed: 4, got: 2 };
        assert!(err.task_id().is_none());
    }

    #[test]
    #[should_panic(expected = "FATAL powertask ERROR")]
    fn test_fatal_panics() {
        fatal(PowertaskError::UnknownTask(TaskId(1)));
    }
}
