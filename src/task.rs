//! Task definition — descriptors, result codes and runtime instances
//!
//! A [`TaskAttribute`] is the constant part of a task, written once by the
//! application and shared read-only. A [`Task`] is the scheduler's runtime
//! record for it: telemetry buffers plus the index links used by the
//! registry tree and the runnable ring.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use crate::error::{PowertaskError, Result};
use crate::scheduler::Scheduler;
use crate::telemetry::Telemetry;

/// Task identifier, traditionally printed in hex (e.g. `b0f3`)
///
/// IDs below `0x1000` or above `0xF000` are reserved for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u16);

impl TaskId {
    /// Built-in idle task
    pub const IDLE: TaskId = TaskId(0xFFFF);
    /// Lowest application ID
    pub const APP_FIRST: u16 = 0x1000;
    /// Highest application ID
    pub const APP_LAST: u16 = 0xF000;

    /// Is this ID in the scheduler's reserved range?
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::APP_FIRST || self.0 > Self::APP_LAST
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Amount of battery energy, in joules
pub type Energy = u16;

/// Raw 16-bit result code returned by a task function
///
/// ```text
///   0x0000..0x1000  invalid
///   0x1001          OK     (complete, output produced)
///   0x10FF          RETRY  (not complete, run again later)
///   0x2000..0x4000  failed quietly   (0x2000 + reason)
///   0x4000..0x6000  failed w/ output (0x4000 + reason)
///   0x6000..        invalid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskResult(pub u16);

impl TaskResult {
    /// Completed successfully and produced output
    pub const OK: TaskResult = TaskResult(0x1001);
    /// Not complete; retry when possible
    pub const RETRY: TaskResult = TaskResult(0x10FF);

    /// Codes below this are invalid
    pub const FIRST: u16 = 0x1000;
    /// Start of the quiet failure band
    pub const FAIL_QUIET: u16 = 0x2000;
    /// Start of the failure-with-output band
    pub const FAIL_OUTPUT: u16 = 0x4000;
    /// Codes at or above this are invalid
    pub const LAST: u16 = 0x6000;
    /// Reason codes are 12 bits
    pub const REASON_MASK: u16 = 0x0FFF;

    /// Failed, no output produced
    pub const fn fail_quiet(reason: u16) -> Self {
        TaskResult(Self::FAIL_QUIET + (reason & Self::REASON_MASK))
    }

    /// Failed, but some output is worth forwarding
    pub const fn fail_output(reason: u16) -> Self {
        TaskResult(Self::FAIL_OUTPUT + (reason & Self::REASON_MASK))
    }

    /// Interpret the code. `None` means the protocol was violated.
    pub const fn classify(self) -> Option<Outcome> {
        match self.0 {
            0x1001 => Some(Outcome::Complete),
            0x10FF => Some(Outcome::Retry),
            c if c >= Self::FAIL_QUIET && c < Self::FAIL_OUTPUT => Some(Outcome::Failed {
                reason: c - Self::FAIL_QUIET,
            }),
            c if c >= Self::FAIL_OUTPUT && c < Self::LAST => Some(Outcome::FailedWithOutput {
                reason: c - Self::FAIL_OUTPUT,
            }),
            _ => None,
        }
    }
}

/// What a valid result code asks the dispatcher to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Done; remove and forward output
    Complete,
    /// Not done; stay queued, let others run first
    Retry,
    /// Failed; remove, drop output
    Failed { reason: u16 },
    /// Failed; remove, forward output anyway
    FailedWithOutput { reason: u16 },
}

impl Outcome {
    /// Does this outcome take the task out of the runnable ring?
    pub const fn removes_task(self) -> bool {
        !matches!(self, Outcome::Retry)
    }

    /// Does the output buffer go to the sink?
    pub const fn forwards_output(self) -> bool {
        matches!(self, Outcome::Complete | Outcome::FailedWithOutput { .. })
    }
}

/// Task behavior: `(scheduler, input, output) -> result code`
///
/// The scheduler handle lets a task activate other tasks (or itself) as a
/// side effect. Calling `run_next` from inside a task is ignored.
/// Functions must not block; "not finished yet" is `TaskResult::RETRY`.
pub type TaskFn = dyn Fn(&mut Scheduler, &Telemetry, &mut Telemetry) -> TaskResult;

/// Constant attributes of a task
pub struct TaskAttribute {
    /// Unique ID
    pub id: TaskId,
    /// Short human-readable name, diagnostics only
    pub name: &'static str,
    /// Battery must hold at least this much before the task may start
    pub minimum_energy: Energy,
    /// Bytes of telemetry input required
    pub input_length: u16,
    /// Bytes of telemetry output produced
    pub output_length: u16,
    function: Box<TaskFn>,
}

impl TaskAttribute {
    /// Describe a task
    pub fn new<F>(
        id: TaskId,
        name: &'static str,
        minimum_energy: Energy,
        input_length: u16,
        output_length: u16,
        function: F,
    ) -> Self
    where
        F: Fn(&mut Scheduler, &Telemetry, &mut Telemetry) -> TaskResult + 'static,
    {
        Self {
            id,
            name,
            minimum_energy,
            input_length,
            output_length,
            function: Box::new(function),
        }
    }

    /// Call the task function
    pub fn run(&self, scheduler: &mut Scheduler, input: &Telemetry, output: &mut Telemetry) -> TaskResult {
        (self.function)(scheduler, input, output)
    }
}

impl fmt::Debug for TaskAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAttribute")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("minimum_energy", &self.minimum_energy)
            .field("input_length", &self.input_length)
            .field("output_length", &self.output_length)
            .finish_non_exhaustive()
    }
}

/// Stable index of a task in the scheduler's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub(crate) usize);

impl TaskHandle {
    /// Arena slot
    pub fn index(self) -> usize {
        self.0
    }
}

/// Caller-provided telemetry for a task, so nothing is allocated later
#[derive(Debug, Default)]
pub struct TaskStorage {
    pub input: Option<Telemetry>,
    pub output: Option<Telemetry>,
}

impl TaskStorage {
    /// No buffers supplied
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the input buffer
    pub fn with_input(mut self, input: Telemetry) -> Self {
        self.input = Some(input);
        self
    }

    /// Supply the output buffer
    pub fn with_output(mut self, output: Telemetry) -> Self {
        self.output = Some(output);
        self
    }
}

/// Runtime record of a registered task
#[derive(Debug)]
pub struct Task {
    attribute: Rc<TaskAttribute>,
    pub(crate) input: Option<Telemetry>,
    pub(crate) output: Option<Telemetry>,
    /// Registry tree: smaller IDs
    pub(crate) lower: Option<TaskHandle>,
    /// Registry tree: larger IDs
    pub(crate) higher: Option<TaskHandle>,
    /// Runnable ring; both `None` when not runnable
    pub(crate) prev: Option<TaskHandle>,
    pub(crate) next: Option<TaskHandle>,
}

impl Task {
    /// Wrap a descriptor, checking any supplied buffers against it
    pub fn new(attribute: Rc<TaskAttribute>, storage: TaskStorage) -> Result<Self> {
        let id = attribute.id;
        check_length(id, attribute.input_length, storage.input.as_ref())?;
        check_length(id, attribute.output_length, storage.output.as_ref())?;
        Ok(Self {
            attribute,
            input: storage.input,
            output: storage.output,
            lower: None,
            higher: None,
            prev: None,
            next: None,
        })
    }

    pub fn id(&self) -> TaskId {
        self.attribute.id
    }

    pub fn name(&self) -> &'static str {
        self.attribute.name
    }

    pub fn attribute(&self) -> &Rc<TaskAttribute> {
        &self.attribute
    }

    /// Input telemetry, once allocated
    pub fn input(&self) -> Option<&Telemetry> {
        self.input.as_ref()
    }

    /// Output telemetry, once allocated
    pub fn output(&self) -> Option<&Telemetry> {
        self.output.as_ref()
    }

    /// Is this task linked into the runnable ring?
    pub fn is_runnable(&self) -> bool {
        self.prev.is_some()
    }
}

fn check_length(id: TaskId, expected: u16, buffer: Option<&Telemetry>) -> Result<()> {
    match buffer {
        Some(tel) if tel.len() != expected => Err(PowertaskError::BufferLength {
            id,
            expected,
            actual: tel.len(),
        }),
        _ => Ok(()),
    }
}
