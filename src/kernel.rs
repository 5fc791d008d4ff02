//! Kernel — scheduler plus its two collaborators
//!
//! Bundles the scheduler context with an energy source and an output
//! sink, and provides the driving loop that calls `run_next` until only
//! idle is left.

use alloc::rc::Rc;

use crate::energy::EnergySource;
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerStats};
use crate::sink::OutputSink;
use crate::task::{TaskAttribute, TaskHandle, TaskId, TaskStorage};
use crate::telemetry::Telemetry;

/// Powertask kernel
pub struct Kernel<E, S> {
    /// Task scheduler
    pub scheduler: Scheduler,
    energy: E,
    sink: S,
}

impl<E: EnergySource, S: OutputSink> Kernel<E, S> {
    pub fn new(energy: E, sink: S) -> Self {
        Self::with_config(SchedulerConfig::default(), energy, sink)
    }

    pub fn with_config(config: SchedulerConfig, energy: E, sink: S) -> Self {
        Self {
            scheduler: Scheduler::with_config(config),
            energy,
            sink,
        }
    }

    /// Register a task
    pub fn register(&mut self, attribute: impl Into<Rc<TaskAttribute>>) -> TaskHandle {
        self.scheduler.register(attribute)
    }

    /// Register a task with caller-supplied buffers
    pub fn register_preallocated(
        &mut self,
        attribute: impl Into<Rc<TaskAttribute>>,
        storage: TaskStorage,
    ) -> TaskHandle {
        self.scheduler.register_preallocated(attribute, storage)
    }

    /// Queue a task; returns its input buffer
    pub fn make_runnable(&mut self, id: TaskId) -> &mut Telemetry {
        self.scheduler.make_runnable(id)
    }

    /// One scheduling step. True while non-idle work remains.
    pub fn run_next(&mut self) -> bool {
        self.scheduler.run_next(&self.energy, &mut self.sink)
    }

    /// Step until only idle is left or `max_steps` is reached
    ///
    /// A task gated on energy that never arrives keeps the loop busy,
    /// hence the bound.
    pub fn run_until_idle(&mut self, max_steps: u64) -> KernelStats {
        let before = self.scheduler.stats();
        let mut steps = 0u64;
        let mut drained = false;

        while steps < max_steps {
            steps += 1;
            if !self.run_next() {
                drained = true;
                break;
            }
        }

        let after = self.scheduler.stats();
        KernelStats {
            steps,
            drained,
            executed: after.executed - before.executed,
            deferred: after.deferred - before.deferred,
            completed: after.completed - before.completed,
            failed: after.failed - before.failed,
            outputs_forwarded: after.outputs_forwarded - before.outputs_forwarded,
            runnable: self.scheduler.runnable_len(),
        }
    }

    pub fn energy(&self) -> &E {
        &self.energy
    }

    /// Update the energy source between steps (fresh reading, harvest, ...)
    pub fn energy_mut(&mut self) -> &mut E {
        &mut self.energy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Lifetime dispatch counters
    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (Scheduler, E, S) {
        (self.scheduler, self.energy, self.sink)
    }
}

/// Result of one `run_until_idle` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    /// `run_next` calls made
    pub steps: u64,
    /// Stopped because only idle was left (not because of `max_steps`)
    pub drained: bool,
    /// Task functions invoked
    pub executed: u64,
    /// Steps skipped for lack of energy
    pub deferred: u64,
    /// Tasks that completed
    pub completed: u64,
    /// Tasks that failed
    pub failed: u64,
    /// Outputs handed to the sink
    pub outputs_forwarded: u64,
    /// Ring size at the end, idle included
    pub runnable: usize,
}
