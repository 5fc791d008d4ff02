//! Output sinks — where finished telemetry goes
//!
//! The dispatcher hands a sink a *borrowed* output buffer: the buffer
//! stays with its task and is reused on the next run, so a sink that
//! wants to keep the data copies it.

use alloc::collections::VecDeque;

use crate::task::Outcome;
use crate::telemetry::Telemetry;

/// Receiver for completed (or failed-with-output) task telemetry
pub trait OutputSink {
    fn accept(&mut self, output: &Telemetry, outcome: Outcome);
}

impl<F> OutputSink for F
where
    F: FnMut(&Telemetry, Outcome),
{
    fn accept(&mut self, output: &Telemetry, outcome: Outcome) {
        self(output, outcome)
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl OutputSink for DiscardSink {
    fn accept(&mut self, _output: &Telemetry, _outcome: Outcome) {}
}

/// Bounded FIFO of copied packets, waiting to be stored or transmitted
///
/// When full, new packets are rejected (and counted) rather than
/// evicting older ones, so what was queued first goes out first.
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    packets: VecDeque<(Telemetry, Outcome)>,
    capacity: usize,
    dropped: u32,
}

impl TelemetryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Queue a copy. Returns false if the queue is full.
    pub fn push(&mut self, output: &Telemetry, outcome: Outcome) -> bool {
        if self.packets.len() >= self.capacity {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }
        self.packets.push_back((output.clone(), outcome));
        true
    }

    /// Oldest packet
    pub fn pop(&mut self) -> Option<(Telemetry, Outcome)> {
        self.packets.pop_front()
    }

    pub fn peek(&self) -> Option<&(Telemetry, Outcome)> {
        self.packets.front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.packets.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Packets rejected because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Take everything, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = (Telemetry, Outcome)> + '_ {
        self.packets.drain(..)
    }
}

impl OutputSink for TelemetryQueue {
    fn accept(&mut self, output: &Telemetry, outcome: Outcome) {
        if !self.push(output, outcome) {
            log::warn!("telemetry queue full, dropping output of {}", output.id());
        }
    }
}
