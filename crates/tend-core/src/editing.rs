use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::TaskStore;
use crate::task::{Task, TaskEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing,
}

/// View state for in-progress edits, keyed by task id. Tasks start in
/// `Viewing`; only a save writes the draft back to the store.
#[derive(Debug, Clone, Default)]
pub struct EditSessions {
    drafts: HashMap<Uuid, TaskEdit>,
}

impl EditSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self, id: Uuid) -> EditMode {
        if self.drafts.contains_key(&id) {
            EditMode::Editing
        } else {
            EditMode::Viewing
        }
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Enters edit mode. An existing draft for the same task is kept.
    pub fn begin(&mut self, task: &Task) -> &mut TaskEdit {
        debug!(id = %task.id, "begin edit");
        self.drafts
            .entry(task.id)
            .or_insert_with(|| task.edit_draft())
    }

    pub fn draft(&self, id: Uuid) -> Option<&TaskEdit> {
        self.drafts.get(&id)
    }

    pub fn draft_mut(&mut self, id: Uuid) -> Option<&mut TaskEdit> {
        self.drafts.get_mut(&id)
    }

    /// Leaves edit mode without touching the store. Returns whether the task
    /// was being edited.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        debug!(id = %id, "cancel edit");
        self.drafts.remove(&id).is_some()
    }

    /// Drops a session whose task went away.
    pub fn forget(&mut self, id: Uuid) {
        self.drafts.remove(&id);
    }

    /// Commits the draft through `TaskStore::edit_task` and returns to
    /// viewing. A draft the store rejects for its content stays open so it
    /// can be fixed; a draft for a vanished task is discarded.
    pub fn save(&mut self, id: Uuid, store: &mut TaskStore) -> StoreResult<usize> {
        let draft = self
            .drafts
            .get(&id)
            .cloned()
            .ok_or(StoreError::UnknownTask(id))?;

        match store.edit_task(id, draft) {
            Ok(_) => {
                self.drafts.remove(&id);
                debug!(id = %id, "saved edit");
                store.index_of(id).ok_or(StoreError::UnknownTask(id))
            }
            Err(err @ StoreError::UnknownTask(_)) => {
                self.drafts.remove(&id);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{EditMode, EditSessions};
    use crate::error::StoreError;
    use crate::store::TaskStore;
    use crate::task::{NewTask, Priority};

    fn store_with_task() -> (TaskStore, uuid::Uuid) {
        let mut store = TaskStore::new();
        let deadline = NaiveDate::from_ymd_opt(2024, 1, 10).expect("date");
        let handle = store
            .add_task(NewTask::new("essay", deadline).note("keep me"))
            .expect("add task");
        (store, handle.id)
    }

    #[test]
    fn save_commits_draft_and_returns_to_viewing() {
        let (mut store, id) = store_with_task();
        let mut sessions = EditSessions::new();

        let draft = sessions.begin(store.task(id).expect("task"));
        draft.name = "essay v2".to_string();
        draft.priority = Priority::High;
        assert_eq!(sessions.mode(id), EditMode::Editing);
        assert_eq!(store.task(id).expect("task").name, "essay");

        assert_eq!(sessions.save(id, &mut store), Ok(0));
        assert_eq!(sessions.mode(id), EditMode::Viewing);

        let task = store.task(id).expect("task");
        assert_eq!(task.name, "essay v2");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.note, "keep me");
    }

    #[test]
    fn cancel_discards_draft() {
        let (mut store, id) = store_with_task();
        let mut sessions = EditSessions::new();

        sessions.begin(store.task(id).expect("task")).name = "changed".to_string();
        assert!(sessions.cancel(id));
        assert!(!sessions.cancel(id));
        assert_eq!(sessions.mode(id), EditMode::Viewing);

        assert_eq!(sessions.save(id, &mut store), Err(StoreError::UnknownTask(id)));
        assert_eq!(store.task(id).expect("task").name, "essay");
    }

    #[test]
    fn begin_twice_keeps_existing_draft() {
        let (store, id) = store_with_task();
        let mut sessions = EditSessions::new();

        sessions.begin(store.task(id).expect("task")).tag = "draft-tag".to_string();
        let again = sessions.begin(store.task(id).expect("task"));
        assert_eq!(again.tag, "draft-tag");
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn invalid_draft_stays_open() {
        let (mut store, id) = store_with_task();
        let mut sessions = EditSessions::new();

        sessions.begin(store.task(id).expect("task")).name = " ".to_string();
        assert_eq!(
            sessions.save(id, &mut store),
            Err(StoreError::EmptyName { kind: "task" })
        );
        assert_eq!(sessions.mode(id), EditMode::Editing);
    }

    #[test]
    fn saving_removed_task_discards_session() {
        let (mut store, id) = store_with_task();
        let mut sessions = EditSessions::new();

        sessions.begin(store.task(id).expect("task"));
        store.remove_task(id).expect("remove");

        assert_eq!(sessions.save(id, &mut store), Err(StoreError::UnknownTask(id)));
        assert!(sessions.is_empty());
    }
}
