//! Power-aware cooperative scheduler
//!
//! One explicit context object holds the task registry, the runnable
//! ring and the diagnostic threshold. Each [`Scheduler::run_next`] call
//! performs exactly one dispatch step:
//!
//! ```text
//!   task = ring[cursor]
//!   if energy < task.minimum_energy      -> cursor = next        (deferred)
//!   else match task.function(in, out):
//!        OK                              -> remove, sink(out)
//!        RETRY                           -> cursor = next
//!        FAIL_QUIET + reason             -> remove
//!        FAIL_OUTPUT + reason            -> remove, sink(out)
//!        anything else                   -> fatal
//!   return ring.len > 1                  (work besides idle remains)
//! ```
//!
//! The first registration also registers the built-in idle task and makes
//! it runnable, so the ring never empties. Idle always retries.
//!
//! Single-threaded and non-reentrant by construction: every operation
//! takes `&mut self`, and a running task reaches the scheduler only
//! through the `&mut Scheduler` it is handed.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::energy::EnergySource;
use crate::error::{or_fatal, PowertaskError, Result};
use crate::registry::TaskRegistry;
use crate::runqueue::RunQueue;
use crate::sink::OutputSink;
use crate::task::{Outcome, Task, TaskAttribute, TaskHandle, TaskId, TaskResult, TaskStorage};
use crate::telemetry::Telemetry;

/// Arena slots reserved up front
pub const DEFAULT_CAPACITY: usize = 16;

/// Log through the `log` facade when verbosity reaches `level`
macro_rules! diag {
    ($sched:expr, $level:expr, $lvl:ident, $($arg:tt)+) => {
        if $sched.verbosity >= $level {
            log::$lvl!($($arg)+);
        }
    };
}

/// Runtime settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Diagnostic threshold, 0 = fatal errors only
    pub verbosity: u8,
    /// Arena slots to reserve
    pub capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Dispatch counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    /// `run_next` calls
    pub steps: u64,
    /// Task functions invoked
    pub executed: u64,
    /// Steps skipped for lack of energy
    pub deferred: u64,
    /// Tasks that returned OK
    pub completed: u64,
    /// RETRY results (idle included)
    pub retried: u64,
    /// Tasks that returned a failure code
    pub failed: u64,
    /// Output buffers handed to the sink
    pub outputs_forwarded: u64,
}

/// Scheduler context
pub struct Scheduler {
    registry: TaskRegistry,
    runnable: RunQueue,
    verbosity: u8,
    bootstrapped: bool,
    stats: SchedulerStats,
    /// Task whose function is executing; its buffers are on loan to it
    running: Option<TaskHandle>,
    /// Next-run input staged by the running task re-arming itself
    rearmed_input: Option<Telemetry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            // +1 for idle
            registry: TaskRegistry::with_capacity(config.capacity.saturating_add(1)),
            runnable: RunQueue::new(),
            verbosity: config.verbosity,
            bootstrapped: false,
            stats: SchedulerStats::default(),
            running: None,
            rearmed_input: None,
        }
    }

    /// Set the diagnostic threshold. 0 = fatal only, higher = chattier.
    pub fn set_debug_verbosity(&mut self, level: u8) {
        self.verbosity = level;
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// Register a task; buffers are allocated on first activation.
    ///
    /// Aborts on a duplicate ID.
    pub fn register(&mut self, attribute: impl Into<Rc<TaskAttribute>>) -> TaskHandle {
        or_fatal(self.try_register(attribute))
    }

    /// Register a task with caller-supplied buffers.
    ///
    /// Aborts on a duplicate ID or a buffer whose length disagrees with
    /// the descriptor.
    pub fn register_preallocated(
        &mut self,
        attribute: impl Into<Rc<TaskAttribute>>,
        storage: TaskStorage,
    ) -> TaskHandle {
        or_fatal(self.try_register_preallocated(attribute, storage))
    }

    pub fn try_register(&mut self, attribute: impl Into<Rc<TaskAttribute>>) -> Result<TaskHandle> {
        self.try_register_preallocated(attribute, TaskStorage::new())
    }

    pub fn try_register_preallocated(
        &mut self,
        attribute: impl Into<Rc<TaskAttribute>>,
        storage: TaskStorage,
    ) -> Result<TaskHandle> {
        let attribute = attribute.into();
        if attribute.id.is_reserved() {
            log::warn!(
                "task {} ({}) uses a reserved ID",
                attribute.id,
                attribute.name
            );
        }
        // idle first, so a failed insert below never leaves the ring empty
        self.bootstrap()?;
        self.insert(attribute, storage)
    }

    fn insert(&mut self, attribute: Rc<TaskAttribute>, storage: TaskStorage) -> Result<TaskHandle> {
        diag!(
            self,
            10,
            debug,
            "register ID {} ({}), {} battery, {} bytes in, {} bytes out",
            attribute.id,
            attribute.name,
            attribute.minimum_energy,
            attribute.input_length,
            attribute.output_length
        );
        let task = Task::new(attribute, storage)?;
        self.registry.insert(task)
    }

    /// One-time setup on first registration: idle task, made runnable
    fn bootstrap(&mut self) -> Result<()> {
        if self.bootstrapped {
            return Ok(());
        }
        self.bootstrapped = true;
        self.insert(Rc::new(idle_attribute()), TaskStorage::new())?;
        self.try_make_runnable(TaskId::IDLE)?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------

    pub fn lookup(&self, id: TaskId) -> Option<TaskHandle> {
        self.registry.lookup(id)
    }

    /// Runtime record for `id`
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.lookup(id).map(|h| self.registry.get(h))
    }

    pub fn get(&self, handle: TaskHandle) -> &Task {
        self.registry.get(handle)
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Registered tasks, idle included
    pub fn task_count(&self) -> usize {
        self.registry.len()
    }

    // -----------------------------------------------------------------
    // Runnable ring
    // -----------------------------------------------------------------

    /// Queue `id` to run and return its input buffer for the caller to fill.
    ///
    /// Already runnable: no-op, returns the existing buffer. Unknown ID:
    /// aborts. A running task re-arming itself gets a fresh buffer of its
    /// input length, which replaces its input once the function returns.
    pub fn make_runnable(&mut self, id: TaskId) -> &mut Telemetry {
        or_fatal(self.try_make_runnable(id))
    }

    pub fn try_make_runnable(&mut self, id: TaskId) -> Result<&mut Telemetry> {
        let handle = self.lookup(id).ok_or(PowertaskError::UnknownTask(id))?;
        diag!(self, 3, debug, "make_runnable {} ({})", id, self.registry.get(handle).name());

        if self.registry.get(handle).is_runnable() {
            diag!(
                self,
                2,
                warn,
                "  ignoring request to make task {} runnable, already runnable",
                id
            );
            return Ok(self.input_mut(handle));
        }

        let verbosity = self.verbosity;
        let task = self.registry.get_mut(handle);
        let (input_length, output_length) = (task.attribute().input_length, task.attribute().output_length);
        if task.input.is_none() {
            if verbosity >= 8 {
                log::trace!("  allocating {} bytes of input telemetry", input_length);
            }
            task.input = Some(Telemetry::allocate(id, input_length));
        }
        if task.output.is_none() {
            if verbosity >= 8 {
                log::trace!("  allocating {} bytes of output telemetry", output_length);
            }
            task.output = Some(Telemetry::allocate(id, output_length));
        }

        self.runnable.insert(self.registry.tasks_mut(), handle);
        Ok(self.input_mut(handle))
    }

    fn input_mut(&mut self, handle: TaskHandle) -> &mut Telemetry {
        let task = self.registry.get_mut(handle);
        let (id, length) = (task.id(), task.attribute().input_length);
        match task.input.as_mut() {
            Some(input) => input,
            // only the running task is without its input; what it writes
            // here becomes its input for the next run
            None => self
                .rearmed_input
                .get_or_insert_with(|| Telemetry::allocate(id, length)),
        }
    }

    fn remove(&mut self, handle: TaskHandle) {
        diag!(
            self,
            3,
            debug,
            "  removing {} ({}) from the run queue",
            self.registry.get(handle).id(),
            self.registry.get(handle).name()
        );
        self.runnable.remove(self.registry.tasks_mut(), handle);
    }

    /// Members of the runnable ring, idle included
    pub fn runnable_len(&self) -> usize {
        self.runnable.len()
    }

    pub fn is_runnable(&self, id: TaskId) -> bool {
        self.task(id).is_some_and(Task::is_runnable)
    }

    /// Runnable IDs in dispatch order, starting with the next to run
    pub fn runnable_ids(&self) -> Vec<TaskId> {
        self.runnable
            .members(self.registry.tasks())
            .into_iter()
            .map(|h| self.registry.get(h).id())
            .collect()
    }

    /// Task at the cursor
    pub fn current(&self) -> Option<TaskId> {
        self.runnable.cursor().map(|h| self.registry.get(h).id())
    }

    /// Is anything besides idle runnable?
    pub fn has_work(&self) -> bool {
        self.runnable.has_work()
    }

    /// Every member's successor points back at it, and nothing else is linked
    pub fn links_consistent(&self) -> bool {
        self.runnable.is_consistent(self.registry.tasks())
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    /// Run one scheduling step. Returns true while non-idle work remains.
    ///
    /// Aborts if the task returns a code outside the result protocol.
    pub fn run_next<E, S>(&mut self, energy: &E, sink: &mut S) -> bool
    where
        E: EnergySource + ?Sized,
        S: OutputSink + ?Sized,
    {
        or_fatal(self.try_run_next(energy, sink))
    }

    pub fn try_run_next<E, S>(&mut self, energy: &E, sink: &mut S) -> Result<bool>
    where
        E: EnergySource + ?Sized,
        S: OutputSink + ?Sized,
    {
        if let Some(running) = self.running {
            log::warn!(
                "run_next called from inside task {}, ignored",
                self.registry.get(running).id()
            );
            return Ok(self.runnable.has_work());
        }
        self.bootstrap()?;
        let Some(handle) = self.runnable.cursor() else {
            return Ok(false);
        };
        self.stats.steps += 1;

        let attribute = Rc::clone(self.registry.get(handle).attribute());
        let id = attribute.id;
        diag!(self, 3, debug, "run_next chooses {} ({})", id, attribute.name);

        let available = energy.available();
        if available < attribute.minimum_energy {
            diag!(
                self,
                3,
                debug,
                "  not enough battery, need {} have {}",
                attribute.minimum_energy,
                available
            );
            self.stats.deferred += 1;
            self.runnable.advance(self.registry.tasks());
            return Ok(self.runnable.has_work());
        }

        // Lend the buffers to the task so it can hold `&mut self` too
        let task = self.registry.get_mut(handle);
        let input = task
            .input
            .take()
            .unwrap_or_else(|| Telemetry::allocate(id, attribute.input_length));
        let mut output = task
            .output
            .take()
            .unwrap_or_else(|| Telemetry::allocate(id, attribute.output_length));

        self.stats.executed += 1;
        self.running = Some(handle);
        let code = attribute.run(self, &input, &mut output);
        self.running = None;
        let input = self.rearmed_input.take().unwrap_or(input);
        diag!(self, 3, debug, "  function returns {:04x}", code.0);

        let task = self.registry.get_mut(handle);
        task.input = Some(input);
        task.output = Some(output);

        let outcome = code
            .classify()
            .ok_or(PowertaskError::InvalidResult { id, code: code.0 })?;

        match outcome {
            Outcome::Retry => {
                // stays queued; everyone else gets a turn first
                self.stats.retried += 1;
                self.runnable.advance(self.registry.tasks());
            }
            Outcome::Complete | Outcome::Failed { .. } | Outcome::FailedWithOutput { .. } => {
                if outcome == Outcome::Complete {
                    self.stats.completed += 1;
                } else {
                    self.stats.failed += 1;
                }
                self.remove(handle);
                if outcome.forwards_output() {
                    if let Some(output) = self.registry.get(handle).output() {
                        sink.accept(output, outcome);
                        self.stats.outputs_forwarded += 1;
                    }
                }
            }
        }

        Ok(self.runnable.has_work())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn idle_attribute() -> TaskAttribute {
    TaskAttribute::new(TaskId::IDLE, "IdleTask", 0, 0, 0, idle_task)
}

fn idle_task(scheduler: &mut Scheduler, _: &Telemetry, _: &mut Telemetry) -> TaskResult {
    // a real port would drop into a low-power sleep here
    diag!(scheduler, 5, trace, "idle");
    TaskResult::RETRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{DiscardSink, TelemetryQueue};
    use core::cell::Cell;

    fn retry(_: &mut Scheduler, _: &Telemetry, _: &mut Telemetry) -> TaskResult {
        TaskResult::RETRY
    }

    fn done(_: &mut Scheduler, _: &Telemetry, out: &mut Telemetry) -> TaskResult {
        out.data_mut().fill(0xAA);
        TaskResult::OK
    }

    fn attr(id: u16, energy: u16, f: fn(&mut Scheduler, &Telemetry, &mut Telemetry) -> TaskResult) -> TaskAttribute {
        TaskAttribute::new(TaskId(id), "test", energy, 1, 1, f)
    }

    #[test]
    fn test_first_registration_bootstraps_idle() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.task_count(), 0);
        sched.register(attr(0x1000, 0, done));
        assert_eq!(sched.task_count(), 2);
        assert!(sched.is_runnable(TaskId::IDLE));
        assert!(!sched.is_runnable(TaskId(0x1000)));
        assert_eq!(sched.runnable_len(), 1);
    }

    #[test]
    fn test_idle_alone_has_no_work() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        assert!(!sched.run_next(&30_000u16, &mut DiscardSink));
        assert_eq!(sched.stats().retried, 1);
    }

    #[test]
    fn test_run_next_on_empty_scheduler_bootstraps() {
        let mut sched = Scheduler::new();
        assert!(!sched.run_next(&0u16, &mut DiscardSink));
        assert_eq!(sched.runnable_ids(), [TaskId::IDLE]);
    }

    #[test]
    #[should_panic(expected = "ID collision")]
    fn test_duplicate_registration_is_fatal() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        sched.register(attr(0x1000, 0, retry));
    }

    #[test]
    fn test_try_register_reports_duplicate() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        let err = sched.try_register(attr(0x1000, 0, retry)).unwrap_err();
        assert_eq!(err.task_id(), Some(TaskId(0x1000)));
    }

    #[test]
    #[should_panic(expected = "invalid task in make_runnable")]
    fn test_unknown_activation_is_fatal() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        sched.make_runnable(TaskId(0x2000));
    }

    #[test]
    fn test_make_runnable_allocates_buffers() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "t", 0, 3, 5, done));
        assert!(sched.task(TaskId(0x1000)).unwrap().input().is_none());

        let input = sched.make_runnable(TaskId(0x1000));
        assert_eq!(input.len(), 3);
        assert_eq!(input.id(), TaskId(0x1000));

        let task = sched.task(TaskId(0x1000)).unwrap();
        assert_eq!(task.output().unwrap().len(), 5);
        assert!(task.is_runnable());
    }

    #[test]
    fn test_make_runnable_twice_is_idempotent() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        sched.make_runnable(TaskId(0x1000)).data_mut()[0] = 42;
        let again = sched.make_runnable(TaskId(0x1000));
        assert_eq!(again.data(), &[42]);
        assert_eq!(sched.runnable_len(), 2);
        assert!(sched.links_consistent());
    }

    #[test]
    fn test_new_member_runs_next() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, retry));
        sched.register(attr(0x2000, 0, retry));
        sched.make_runnable(TaskId(0x1000));
        sched.make_runnable(TaskId(0x2000));
        assert_eq!(sched.current(), Some(TaskId(0x2000)));
        assert_eq!(
            sched.runnable_ids(),
            [TaskId(0x2000), TaskId::IDLE, TaskId(0x1000)]
        );
    }

    #[test]
    fn test_complete_removes_and_forwards() {
        let mut sched = Scheduler::new();
        sched.register(attr(0x1000, 0, done));
        sched.make_runnable(TaskId(0x1000));

        let mut sink = TelemetryQueue::new(4);
        assert!(!sched.run_next(&100u16, &mut sink));
        assert!(!sched.is_runnable(TaskId(0x1000)));
        let (packet, outcome) = sink.pop().unwrap();
        assert_eq!(packet.data(), &[0xAA]);
        assert_eq!(outcome, Outcome::Complete);
        assert!(sched.links_consistent());
    }

    #[test]
    fn test_quiet_failure_forwards_nothing() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "f", 0, 0, 1, |_: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            TaskResult::fail_quiet(3)
        }));
        sched.make_runnable(TaskId(0x1000));

        let mut sink = TelemetryQueue::new(4);
        sched.run_next(&0u16, &mut sink);
        assert!(sink.is_empty());
        assert!(!sched.is_runnable(TaskId(0x1000)));
        assert_eq!(sched.stats().failed, 1);
    }

    #[test]
    fn test_failure_with_output_forwards() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "f", 0, 0, 1, |_: &mut Scheduler, _: &Telemetry, out: &mut Telemetry| {
            out.data_mut()[0] = b'E';
            TaskResult::fail_output(9)
        }));
        sched.make_runnable(TaskId(0x1000));

        let mut sink = TelemetryQueue::new(4);
        sched.run_next(&0u16, &mut sink);
        let (packet, outcome) = sink.pop().unwrap();
        assert_eq!(packet.data(), b"E");
        assert_eq!(outcome, Outcome::FailedWithOutput { reason: 9 });
        assert!(!sched.is_runnable(TaskId(0x1000)));
    }

    #[test]
    #[should_panic(expected = "invalid result code")]
    fn test_invalid_result_is_fatal() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "bad", 0, 0, 0, |_: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            TaskResult(0x0001)
        }));
        sched.make_runnable(TaskId(0x1000));
        sched.run_next(&0u16, &mut DiscardSink);
    }

    #[test]
    fn test_try_run_next_reports_invalid_code() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "bad", 0, 0, 0, |_: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            TaskResult(0x6000)
        }));
        sched.make_runnable(TaskId(0x1000));
        assert_eq!(
            sched.try_run_next(&0u16, &mut DiscardSink),
            Err(PowertaskError::InvalidResult { id: TaskId(0x1000), code: 0x6000 })
        );
    }

    #[test]
    fn test_energy_gate_skips_function() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "hungry", 500, 0, 0, move |_: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            counter.set(counter.get() + 1);
            TaskResult::OK
        }));
        sched.make_runnable(TaskId(0x1000));

        for _ in 0..6 {
            assert!(sched.run_next(&499u16, &mut DiscardSink));
        }
        assert_eq!(calls.get(), 0);
        assert_eq!(sched.stats().deferred, 3);
        assert!(sched.is_runnable(TaskId(0x1000)));

        while sched.run_next(&500u16, &mut DiscardSink) {}
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_self_rearm_stages_next_input() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "again", 0, 1, 1, |s: &mut Scheduler, input: &Telemetry, out: &mut Telemetry| {
            if input.data()[0] == 0 {
                let next = s.make_runnable(TaskId(0x1000));
                assert_eq!(next.len(), 1);
                next.data_mut()[0] = 7;
                TaskResult::RETRY
            } else {
                out.data_mut()[0] = input.data()[0];
                TaskResult::OK
            }
        }));
        sched.make_runnable(TaskId(0x1000));

        let mut sink = TelemetryQueue::new(2);
        while sched.run_next(&0u16, &mut sink) {}
        assert_eq!(sink.pop().unwrap().0.data(), &[7]);
        assert_eq!(sched.stats().executed, 3); // task, idle, task
        assert!(sched.links_consistent());
    }

    #[test]
    fn test_self_rearm_input_kept_after_completion() {
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "once", 0, 2, 0, |s: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            s.make_runnable(TaskId(0x1000)).data_mut()[1] = 9;
            TaskResult::OK
        }));
        sched.make_runnable(TaskId(0x1000)).data_mut()[0] = 4;
        assert!(!sched.run_next(&0u16, &mut DiscardSink));
        assert!(!sched.is_runnable(TaskId(0x1000)));

        let input = sched.make_runnable(TaskId(0x1000));
        assert_eq!(input.data(), &[0, 9]);
    }

    #[test]
    fn test_nested_run_next_is_ignored() {
        let nested = Rc::new(Cell::new(None));
        let seen = Rc::clone(&nested);
        let mut sched = Scheduler::new();
        sched.register(TaskAttribute::new(TaskId(0x1000), "nested", 0, 1, 1, move |s: &mut Scheduler, _: &Telemetry, _: &mut Telemetry| {
            seen.set(Some(s.run_next(&0u16, &mut DiscardSink)));
            TaskResult::RETRY
        }));
        sched.make_runnable(TaskId(0x1000)).data_mut()[0] = 5;

        assert!(sched.run_next(&0u16, &mut DiscardSink));
        assert_eq!(nested.get(), Some(true));
        assert_eq!(sched.stats().steps, 1);
        assert_eq!(sched.stats().executed, 1);
        let task = sched.task(TaskId(0x1000)).unwrap();
        assert_eq!(task.input().unwrap().data(), &[5]);
        assert_eq!(sched.current(), Some(TaskId::IDLE));
    }

    #[test]
    fn test_registering_idle_id_keeps_ring() {
        let mut sched = Scheduler::new();
        let err = sched
            .try_register(TaskAttribute::new(TaskId::IDLE, "user", 0, 0, 0, done))
            .unwrap_err();
        assert_eq!(
            err,
            PowertaskError::DuplicateId { id: TaskId::IDLE, existing: "IdleTask", incoming: "user" }
        );
        assert_eq!(sched.task_count(), 1);
        assert_eq!(sched.runnable_ids(), [TaskId::IDLE]);

        sched.register(attr(0x1000, 0, done));
        assert_eq!(sched.task_count(), 2);
        assert_eq!(sched.runnable_len(), 1);
        assert!(sched.links_consistent());
    }

    #[test]
    fn test_preallocated_buffers_are_used() {
        let mut sched = Scheduler::new();
        let storage = TaskStorage::new()
            .with_input(Telemetry::from_payload(TaskId(0x1000), b"x"))
            .with_output(Telemetry::allocate(TaskId(0x1000), 1));
        sched.register_preallocated(attr(0x1000, 0, done), storage);
        let input = sched.make_runnable(TaskId(0x1000));
        assert_eq!(input.data(), b"x");
    }

    #[test]
    #[should_panic(expected = "descriptor declares")]
    fn test_preallocated_length_mismatch_is_fatal() {
        let mut sched = Scheduler::new();
        let storage = TaskStorage::new().with_input(Telemetry::allocate(TaskId(0x1000), 2));
        sched.register_preallocated(attr(0x1000, 0, done), storage);
    }

    #[test]
    fn test_verbosity_does_not_change_schedule() {
        let mut quiet = Scheduler::new();
        let mut loud = Scheduler::with_config(SchedulerConfig { verbosity: 10, ..Default::default() });
        assert_eq!(loud.verbosity(), 10);
        for sched in [&mut quiet, &mut loud] {
            sched.register(attr(0x1000, 0, retry));
            sched.register(attr(0x2000, 0, done));
            sched.make_runnable(TaskId(0x1000));
            sched.make_runnable(TaskId(0x2000));
            for _ in 0..5 {
                sched.run_next(&0u16, &mut DiscardSink);
            }
        }
        assert_eq!(quiet.runnable_ids(), loud.runnable_ids());
        assert_eq!(quiet.stats(), loud.stats());
    }
}
