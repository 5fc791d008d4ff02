//! Powertask — power-aware cooperative task scheduler
//!
//! Run short, non-blocking tasks on a battery-powered device, but only
//! when the battery can afford them:
//! - Tasks declare a minimum energy; the dispatcher skips them until it is there
//! - No blocking: an unfinished task returns RETRY and goes round again
//! - Length-prefixed telemetry in and out, allocated once per task
//! - No threads, no locks, no interrupts: one explicit scheduler context
//!
//! ```text
//!   register ──► TaskRegistry (BST by ID) ──► make_runnable ──► RunQueue (ring)
//!                                                                 │
//!                    EnergySource ──► run_next ◄──────────────────┘
//!                                        │
//!                                        └──► OutputSink (OK / FAIL_OUTPUT)
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod error;
pub mod task;
pub mod telemetry;
pub mod registry;
pub mod runqueue;
pub mod scheduler;
pub mod energy;
pub mod sink;
pub mod kernel;

pub use error::{PowertaskError, Result};
pub use task::{Energy, Outcome, Task, TaskAttribute, TaskFn, TaskHandle, TaskId, TaskResult, TaskStorage};
pub use telemetry::{Telemetry, TelemetryHeader};
pub use registry::TaskRegistry;
pub use runqueue::RunQueue;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStats};
pub use energy::{Battery, EnergySource};
pub use sink::{DiscardSink, OutputSink, TelemetryQueue};
pub use kernel::{Kernel, KernelStats};
