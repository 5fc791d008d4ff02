//! Task registry — arena of task records indexed by an unbalanced BST
//!
//! Insertion walks from the root comparing IDs and hangs the new task on
//! the first open branch. No rebalancing: tree depth is whatever the
//! registration order makes it, so register in an order that keeps it
//! shallow if lookup depth matters.

use alloc::vec::Vec;

use crate::error::{PowertaskError, Result};
use crate::task::{Task, TaskHandle, TaskId};

/// All registered tasks
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    root: Option<TaskHandle>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with arena space for `capacity` tasks
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Add a task. An ID collision leaves the registry unchanged.
    pub fn insert(&mut self, task: Task) -> Result<TaskHandle> {
        let handle = TaskHandle(self.tasks.len());
        let id = task.id();

        let Some(mut parent) = self.root else {
            self.tasks.push(task);
            self.root = Some(handle);
            return Ok(handle);
        };

        loop {
            let node = &self.tasks[parent.0];
            let branch = if id < node.id() {
                node.lower
            } else if id > node.id() {
                node.higher
            } else {
                return Err(PowertaskError::DuplicateId {
                    id,
                    existing: node.name(),
                    incoming: task.name(),
                });
            };
            match branch {
                Some(child) => parent = child,
                None => break,
            }
        }

        let goes_lower = id < self.tasks[parent.0].id();
        self.tasks.push(task);
        let node = &mut self.tasks[parent.0];
        if goes_lower {
            node.lower = Some(handle);
        } else {
            node.higher = Some(handle);
        }
        Ok(handle)
    }

    /// Find a task by ID
    pub fn lookup(&self, id: TaskId) -> Option<TaskHandle> {
        let mut cursor = self.root;
        while let Some(handle) = cursor {
            let node = &self.tasks[handle.0];
            cursor = if id < node.id() {
                node.lower
            } else if id > node.id() {
                node.higher
            } else {
                return Some(handle);
            };
        }
        None
    }

    /// Number of comparisons a lookup of `id` makes
    pub fn depth_of(&self, id: TaskId) -> Option<usize> {
        let mut depth = 0;
        let mut cursor = self.root;
        while let Some(handle) = cursor {
            depth += 1;
            let node = &self.tasks[handle.0];
            cursor = if id < node.id() {
                node.lower
            } else if id > node.id() {
                node.higher
            } else {
                return Some(depth);
            };
        }
        None
    }

    pub fn get(&self, handle: TaskHandle) -> &Task {
        &self.tasks[handle.0]
    }

    pub fn get_mut(&mut self, handle: TaskHandle) -> &mut Task {
        &mut self.tasks[handle.0]
    }

    pub(crate) fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Arena slice, for the runnable ring
    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// IDs in ascending order (in-order tree walk)
    pub fn ids_in_order(&self) -> Vec<TaskId> {
        let mut ids = Vec::with_capacity(self.tasks.len());
        let mut stack = Vec::new();
        let mut cursor = self.root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(handle) = cursor {
                stack.push(handle);
                cursor = self.tasks[handle.0].lower;
            }
            if let Some(handle) = stack.pop() {
                ids.push(self.tasks[handle.0].id());
                cursor = self.tasks[handle.0].higher;
            }
        }
        ids
    }
}
