use std::collections::BTreeMap;

use serde::Serialize;

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            completed: tasks
                .iter()
                .filter(|task| task.status.is_completed())
                .count(),
            total: tasks.len(),
        }
    }

    /// Share of completed tasks in `0.0..=1.0`, or `None` with no tasks.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.completed as f64 / self.total as f64)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Analytics {
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

impl Analytics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut out = Self::default();
        for task in tasks {
            *out.by_priority.entry(task.priority).or_default() += 1;
            *out.by_tag.entry(task.tag.clone()).or_default() += 1;
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.by_priority.is_empty()
    }
}
