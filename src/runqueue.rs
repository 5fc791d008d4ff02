//! Runnable ring — circular doubly-linked membership list
//!
//! Links live in the task records themselves (`prev`/`next` as arena
//! handles), the ring only tracks the cursor and its size. A task is a
//! member iff its links are set. New members are spliced in right after
//! the cursor and the cursor moves onto them, so they cut in line ahead
//! of everything already queued.
//!
//! ```text
//!        cursor
//!          v
//!   ... -> A -> B -> idle -> ...        insert(N)
//!   ... -> A -> N -> B -> idle -> ...   cursor = N
//! ```

use alloc::vec::Vec;

use crate::task::{Task, TaskHandle};

/// Cursor + size of the runnable ring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunQueue {
    cursor: Option<TaskHandle>,
    len: usize,
}

impl RunQueue {
    pub const fn new() -> Self {
        Self { cursor: None, len: 0 }
    }

    /// Task the dispatcher will look at next
    pub fn cursor(&self) -> Option<TaskHandle> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// More than one member (i.e. something besides idle)
    pub fn has_work(&self) -> bool {
        self.len > 1
    }

    /// Link `handle` in after the cursor and make it the cursor.
    ///
    /// Returns false, changing nothing, if it is already a member.
    pub fn insert(&mut self, tasks: &mut [Task], handle: TaskHandle) -> bool {
        if tasks[handle.0].is_runnable() {
            return false;
        }
        match self.cursor {
            None => {
                let task = &mut tasks[handle.0];
                task.prev = Some(handle);
                task.next = Some(handle);
            }
            Some(at) => {
                let after = tasks[at.0].next.unwrap_or(at);
                tasks[handle.0].prev = Some(at);
                tasks[handle.0].next = Some(after);
                tasks[at.0].next = Some(handle);
                tasks[after.0].prev = Some(handle);
            }
        }
        self.cursor = Some(handle);
        self.len += 1;
        true
    }

    /// Unlink `handle`, closing the gap and clearing its links.
    ///
    /// If it was the cursor, the cursor moves to its successor.
    /// Returns false if it was not a member.
    pub fn remove(&mut self, tasks: &mut [Task], handle: TaskHandle) -> bool {
        let (Some(prev), Some(next)) = (tasks[handle.0].prev, tasks[handle.0].next) else {
            return false;
        };
        if next == handle {
            self.cursor = None;
        } else {
            tasks[prev.0].next = Some(next);
            tasks[next.0].prev = Some(prev);
            if self.cursor == Some(handle) {
                self.cursor = Some(next);
            }
        }
        tasks[handle.0].prev = None;
        tasks[handle.0].next = None;
        self.len -= 1;
        true
    }

    /// Move the cursor to the next member
    pub fn advance(&mut self, tasks: &[Task]) {
        if let Some(at) = self.cursor {
            self.cursor = tasks[at.0].next;
        }
    }

    /// Members in dispatch order, starting at the cursor
    pub fn members(&self, tasks: &[Task]) -> Vec<TaskHandle> {
        let mut out = Vec::with_capacity(self.len);
        let Some(start) = self.cursor else {
            return out;
        };
        let mut at = start;
        loop {
            out.push(at);
            match tasks[at.0].next {
                Some(next) if next != start && out.len() < self.len => at = next,
                _ => break,
            }
        }
        out
    }

    /// Check every link: each member's successor points back at it, the
    /// ring closes after exactly `len` steps, and non-members are unlinked.
    pub fn is_consistent(&self, tasks: &[Task]) -> bool {
        let members = self.members(tasks);
        if members.len() != self.len {
            return false;
        }
        for &member in &members {
            let Some(next) = tasks[member.0].next else {
                return false;
            };
            if tasks[next.0].prev != Some(member) {
                return false;
            }
        }
        if let (Some(&first), Some(&last)) = (members.first(), members.last()) {
            if tasks[last.0].next != Some(first) {
                return false;
            }
        }
        let linked = tasks
            .iter()
            .filter(|t| t.prev.is_some() || t.next.is_some())
            .count();
        let half_linked = tasks
            .iter()
            .any(|t| t.prev.is_some() != t.next.is_some());
        linked == self.len && !half_linked
    }
}
