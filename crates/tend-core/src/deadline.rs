use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::task::Task;

pub const DEFAULT_WARNING_DAYS: i64 = 2;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeadlineEntry {
    pub index: usize,
    pub id: Uuid,
    pub name: String,
    pub days_remaining: i64,
}

/// Result of one deadline evaluation. Nothing is remembered between
/// evaluations, so calling again re-emits the same entries.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DeadlineReport {
    pub today: Option<NaiveDate>,
    pub warnings: Vec<DeadlineEntry>,
    pub due_today: Vec<DeadlineEntry>,
}

impl DeadlineReport {
    /// Warns on open tasks with at most `window_days` left (overdue
    /// included) and flags those due exactly on `today`.
    #[tracing::instrument(skip(tasks), fields(count = tasks.len()))]
    pub fn evaluate(tasks: &[Task], today: NaiveDate, window_days: i64) -> Self {
        let mut report = Self {
            today: Some(today),
            ..Self::default()
        };

        for (index, task) in tasks.iter().enumerate() {
            if task.status.is_completed() {
                continue;
            }

            let days_remaining = task.days_remaining(today);
            let entry = DeadlineEntry {
                index,
                id: task.id,
                name: task.name.clone(),
                days_remaining,
            };

            if days_remaining == 0 {
                report.due_today.push(entry.clone());
            }
            if days_remaining <= window_days {
                report.warnings.push(entry);
            }
        }

        tracing::debug!(
            warnings = report.warnings.len(),
            due_today = report.due_today.len(),
            "evaluated deadlines"
        );
        report
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.due_today.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DEFAULT_WARNING_DAYS, DeadlineReport};
    use crate::task::{NewTask, Status, Task};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn task(name: &str, deadline: NaiveDate, status: Status) -> Task {
        Task::from_new(NewTask::new(name, deadline).status(status))
    }

    #[test]
    fn due_today_is_both_warning_and_notification() {
        let today = date(2024, 1, 10);
        let tasks = vec![task("essay", today, Status::InProgress)];

        let report = DeadlineReport::evaluate(&tasks, today, DEFAULT_WARNING_DAYS);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].days_remaining, 0);
        assert_eq!(report.due_today.len(), 1);
        assert_eq!(report.due_today[0].name, "essay");
    }

    #[test]
    fn completed_tasks_are_ignored() {
        let today = date(2024, 1, 10);
        let tasks = vec![task("essay", today, Status::Completed)];

        let report = DeadlineReport::evaluate(&tasks, today, DEFAULT_WARNING_DAYS);
        assert!(report.is_empty());
    }

    #[test]
    fn window_is_inclusive_and_covers_overdue() {
        let today = date(2024, 1, 10);
        let tasks = vec![
            task("two days", date(2024, 1, 12), Status::NotStarted),
            task("three days", date(2024, 1, 13), Status::NotStarted),
            task("overdue", date(2024, 1, 5), Status::InProgress),
        ];

        let report = DeadlineReport::evaluate(&tasks, today, DEFAULT_WARNING_DAYS);
        let names: Vec<&str> = report.warnings.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["two days", "overdue"]);
        assert_eq!(report.warnings[0].index, 0);
        assert_eq!(report.warnings[1].index, 2);
        assert_eq!(report.warnings[1].days_remaining, -5);
        assert!(report.due_today.is_empty());
    }

    #[test]
    fn evaluation_has_no_memory() {
        let today = date(2024, 1, 10);
        let tasks = vec![task("essay", today, Status::NotStarted)];

        let first = DeadlineReport::evaluate(&tasks, today, DEFAULT_WARNING_DAYS);
        let second = DeadlineReport::evaluate(&tasks, today, DEFAULT_WARNING_DAYS);
        assert_eq!(first, second);
    }
}
