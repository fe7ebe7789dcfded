use std::sync::Arc;

use parking_lot::Mutex;

use crate::store::TaskStore;

/// Cloneable handle that runs each store operation under one lock, for
/// callers that reach the store from more than one thread.
#[derive(Debug, Clone, Default)]
pub struct SharedTaskStore {
    inner: Arc<Mutex<TaskStore>>,
}

impl SharedTaskStore {
    pub fn new(store: TaskStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut TaskStore) -> R) -> R {
        let mut store = self.inner.lock();
        f(&mut store)
    }

    pub fn snapshot(&self) -> TaskStore {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::NaiveDate;

    use super::SharedTaskStore;
    use crate::store::TaskStore;
    use crate::task::NewTask;

    #[test]
    fn concurrent_adds_are_all_kept() {
        let shared = SharedTaskStore::new(TaskStore::new());
        let deadline = NaiveDate::from_ymd_opt(2024, 1, 10).expect("date");

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for n in 0..25 {
                        shared
                            .with(|store| store.add_task(NewTask::new(format!("{worker}-{n}"), deadline)))
                            .expect("add task");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker finished");
        }

        let store = shared.snapshot();
        assert_eq!(store.len(), 100);
        let handles_unique = store
            .tasks()
            .iter()
            .map(|task| task.id)
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(handles_unique.len(), 100);
    }
}
