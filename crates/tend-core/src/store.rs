use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::{Analytics, Progress};
use crate::attachment::Attachment;
use crate::deadline::{DEFAULT_WARNING_DAYS, DeadlineReport};
use crate::error::{StoreError, StoreResult};
use crate::habit::{Habit, NewHabit};
use crate::task::{NewTask, Status, Task, TaskEdit};

/// Addresses a task by display position or by its stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    Index(usize),
    Id(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitKey {
    Index(usize),
    Id(Uuid),
}

impl From<usize> for TaskKey {
    fn from(index: usize) -> Self {
        TaskKey::Index(index)
    }
}

impl From<Uuid> for TaskKey {
    fn from(id: Uuid) -> Self {
        TaskKey::Id(id)
    }
}

impl From<usize> for HabitKey {
    fn from(index: usize) -> Self {
        HabitKey::Index(index)
    }
}

impl From<Uuid> for HabitKey {
    fn from(id: Uuid) -> Self {
        HabitKey::Id(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub index: usize,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitHandle {
    pub index: usize,
    pub id: Uuid,
}

/// Process-lifetime task and habit state. Every operation resolves its key
/// and validates its input before mutating, so a failed call changes
/// nothing.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    habits: Vec<Habit>,
    warning_days: i64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_warning_days(DEFAULT_WARNING_DAYS)
    }

    pub fn with_warning_days(warning_days: i64) -> Self {
        Self {
            tasks: Vec::new(),
            habits: Vec::new(),
            warning_days,
        }
    }

    pub fn warning_days(&self) -> i64 {
        self.warning_days
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn habit_count(&self) -> usize {
        self.habits.len()
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Current position of the task `key` refers to.
    pub fn position(&self, key: impl Into<TaskKey>) -> StoreResult<usize> {
        self.resolve_task(key.into())
    }

    pub fn task(&self, key: impl Into<TaskKey>) -> StoreResult<&Task> {
        let idx = self.resolve_task(key.into())?;
        Ok(&self.tasks[idx])
    }

    pub fn habit(&self, key: impl Into<HabitKey>) -> StoreResult<&Habit> {
        let idx = self.resolve_habit(key.into())?;
        Ok(&self.habits[idx])
    }

    /// Distinct tags in use, sorted. Empty tags are skipped.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.tasks
            .iter()
            .map(|task| task.tag.as_str())
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub fn add_task(&mut self, new: NewTask) -> StoreResult<TaskHandle> {
        validate_name("task", &new.name)?;

        let task = Task::from_new(new);
        let handle = TaskHandle {
            index: self.tasks.len(),
            id: task.id,
        };
        self.tasks.push(task);

        debug!(index = handle.index, id = %handle.id, "task added");
        Ok(handle)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_task(&mut self, key: impl Into<TaskKey> + std::fmt::Debug) -> StoreResult<Task> {
        let idx = self.resolve_task(key.into())?;
        let removed = self.tasks.remove(idx);
        info!(index = idx, id = %removed.id, remaining = self.tasks.len(), "task removed");
        Ok(removed)
    }

    /// Overwrites name, priority, tag, status and deadline. Note and
    /// attachment are kept.
    #[tracing::instrument(skip(self, edit))]
    pub fn edit_task(
        &mut self,
        key: impl Into<TaskKey> + std::fmt::Debug,
        edit: TaskEdit,
    ) -> StoreResult<&Task> {
        let idx = self.resolve_task(key.into())?;
        validate_name("task", &edit.name)?;

        let task = &mut self.tasks[idx];
        task.apply_edit(edit);
        debug!(index = idx, id = %task.id, "task edited");
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub fn set_status(
        &mut self,
        key: impl Into<TaskKey> + std::fmt::Debug,
        status: Status,
    ) -> StoreResult<&Task> {
        let idx = self.resolve_task(key.into())?;
        let task = &mut self.tasks[idx];
        task.status = status;
        debug!(index = idx, id = %task.id, status = %status, "status set");
        Ok(task)
    }

    #[tracing::instrument(skip(self, note))]
    pub fn set_note(
        &mut self,
        key: impl Into<TaskKey> + std::fmt::Debug,
        note: impl Into<String>,
    ) -> StoreResult<&Task> {
        let idx = self.resolve_task(key.into())?;
        let task = &mut self.tasks[idx];
        task.note = note.into();
        Ok(task)
    }

    /// Replaces the attachment; `None` detaches.
    #[tracing::instrument(skip(self, attachment))]
    pub fn attach(
        &mut self,
        key: impl Into<TaskKey> + std::fmt::Debug,
        attachment: Option<Attachment>,
    ) -> StoreResult<&Task> {
        let idx = self.resolve_task(key.into())?;
        let task = &mut self.tasks[idx];
        task.attachment = attachment;
        Ok(task)
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub fn add_habit(&mut self, new: NewHabit) -> StoreResult<HabitHandle> {
        validate_name("habit", &new.name)?;

        let habit = Habit::from_new(new);
        let handle = HabitHandle {
            index: self.habits.len(),
            id: habit.id,
        };
        self.habits.push(habit);

        debug!(index = handle.index, id = %handle.id, "habit added");
        Ok(handle)
    }

    /// Marks a habit completed. Returns `false` when it already was.
    #[tracing::instrument(skip(self))]
    pub fn mark_habit_completed(
        &mut self,
        key: impl Into<HabitKey> + std::fmt::Debug,
    ) -> StoreResult<bool> {
        let idx = self.resolve_habit(key.into())?;
        let habit = &mut self.habits[idx];
        let changed = !habit.completed;
        habit.completed = true;
        debug!(index = idx, changed, "habit marked completed");
        Ok(changed)
    }

    pub fn compute_progress(&self) -> Progress {
        Progress::from_tasks(&self.tasks)
    }

    pub fn compute_deadline_warnings(&self, today: NaiveDate) -> DeadlineReport {
        DeadlineReport::evaluate(&self.tasks, today, self.warning_days)
    }

    pub fn compute_analytics(&self) -> Analytics {
        Analytics::from_tasks(&self.tasks)
    }

    fn resolve_task(&self, key: TaskKey) -> StoreResult<usize> {
        match key {
            TaskKey::Index(index) if index < self.tasks.len() => Ok(index),
            TaskKey::Index(index) => Err(StoreError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            }),
            TaskKey::Id(id) => self.index_of(id).ok_or(StoreError::UnknownTask(id)),
        }
    }

    fn resolve_habit(&self, key: HabitKey) -> StoreResult<usize> {
        match key {
            HabitKey::Index(index) if index < self.habits.len() => Ok(index),
            HabitKey::Index(index) => Err(StoreError::HabitIndexOutOfRange {
                index,
                len: self.habits.len(),
            }),
            HabitKey::Id(id) => self
                .habits
                .iter()
                .position(|habit| habit.id == id)
                .ok_or(StoreError::UnknownHabit(id)),
        }
    }
}

fn validate_name(kind: &'static str, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName { kind });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::TaskStore;
    use crate::attachment::Attachment;
    use crate::error::StoreError;
    use crate::habit::{Frequency, NewHabit};
    use crate::task::{NewTask, Priority, Status};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn store_with(names: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        for name in names {
            store
                .add_task(NewTask::new(*name, date(2024, 1, 10)))
                .expect("add task");
        }
        store
    }

    #[test]
    fn add_returns_previous_length_as_index() {
        let mut store = store_with(&["a", "b"]);
        let handle = store
            .add_task(NewTask::new("c", date(2024, 1, 10)))
            .expect("add task");
        assert_eq!(handle.index, 2);
        assert_eq!(store.index_of(handle.id), Some(2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn remove_shifts_later_tasks_down() {
        let mut store = store_with(&["a", "b", "c"]);
        let removed = store.remove_task(1).expect("remove");
        assert_eq!(removed.name, "b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.task(1).expect("task").name, "c");
        assert_eq!(store.task(0).expect("task").name, "a");
    }

    #[test]
    fn ids_survive_removal_of_earlier_tasks() {
        let mut store = store_with(&["a", "b", "c"]);
        let c_id = store.task(2).expect("task").id;
        store.remove_task(0).expect("remove");
        assert_eq!(store.index_of(c_id), Some(1));
        assert_eq!(store.task(c_id).expect("task").name, "c");
    }

    #[test]
    fn out_of_range_leaves_store_unchanged() {
        let mut store = store_with(&["a", "b", "c"]);
        let before = store.tasks().to_vec();

        assert_eq!(
            store.remove_task(5),
            Err(StoreError::IndexOutOfRange { index: 5, len: 3 })
        );
        assert!(store.set_status(3, Status::Completed).is_err());
        let edit = store.task(0).expect("task").edit_draft();
        assert!(store.edit_task(7, edit).is_err());

        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut store = store_with(&["a"]);
        let stray = uuid::Uuid::new_v4();
        assert_eq!(store.remove_task(stray), Err(StoreError::UnknownTask(stray)));
    }

    #[test]
    fn edit_preserves_note_and_attachment() {
        let mut store = TaskStore::new();
        let attachment = Attachment::new("essay.pdf", vec![1, 2, 3]).expect("attachment");
        store
            .add_task(
                NewTask::new("essay", date(2024, 1, 10))
                    .note("outline first")
                    .attachment(attachment.clone()),
            )
            .expect("add task");

        let mut edit = store.task(0).expect("task").edit_draft();
        edit.name = "final essay".to_string();
        edit.priority = Priority::High;
        edit.tag = "assignment".to_string();
        edit.status = Status::InProgress;
        edit.deadline = date(2024, 2, 1);
        store.edit_task(0, edit).expect("edit");

        let task = store.task(0).expect("task");
        assert_eq!(task.name, "final essay");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tag, "assignment");
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.deadline, date(2024, 2, 1));
        assert_eq!(task.note, "outline first");
        assert_eq!(task.attachment, Some(attachment));
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut store = store_with(&["a"]);
        assert_eq!(
            store.add_task(NewTask::new("   ", date(2024, 1, 10))),
            Err(StoreError::EmptyName { kind: "task" })
        );

        let mut edit = store.task(0).expect("task").edit_draft();
        edit.name = String::new();
        assert!(store.edit_task(0, edit).is_err());
        assert_eq!(store.task(0).expect("task").name, "a");

        assert_eq!(
            store.add_habit(NewHabit::new("", Frequency::Daily, date(2024, 1, 1))),
            Err(StoreError::EmptyName { kind: "habit" })
        );
    }

    #[test]
    fn habit_completion_is_idempotent() {
        let mut store = TaskStore::new();
        let handle = store
            .add_habit(NewHabit::new("read", Frequency::Weekly, date(2024, 1, 1)))
            .expect("add habit");
        assert!(!store.habit(0).expect("habit").completed);

        assert_eq!(store.mark_habit_completed(handle.index), Ok(true));
        assert_eq!(store.mark_habit_completed(handle.id), Ok(false));
        assert!(store.habit(0).expect("habit").completed);

        assert_eq!(
            store.mark_habit_completed(4),
            Err(StoreError::HabitIndexOutOfRange { index: 4, len: 1 })
        );
    }

    #[test]
    fn tags_are_distinct_and_sorted() {
        let mut store = TaskStore::new();
        for tag in ["study", "project", "study", ""] {
            store
                .add_task(NewTask::new("t", date(2024, 1, 10)).tag(tag))
                .expect("add task");
        }
        let tags: Vec<&str> = store.tags().into_iter().collect();
        assert_eq!(tags, vec!["project", "study"]);
    }
}
