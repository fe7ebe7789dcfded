use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    NotStarted,
    InProgress,
    Completed,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    pub fn is_completed(self) -> bool {
        self == Status::Completed
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_literal(s).as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            _ => Err(StoreError::InvalidEnumValue {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_literal(s).as_str() {
            "notstarted" | "todo" => Ok(Status::NotStarted),
            "inprogress" | "started" => Ok(Status::InProgress),
            "completed" | "done" => Ok(Status::Completed),
            _ => Err(StoreError::InvalidEnumValue {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Lowercases and drops separators so `Not Started`, `not_started` and
/// `NotStarted` all compare equal.
pub(crate) fn normalize_literal(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub priority: Priority,
    pub tag: String,
    pub status: Status,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

impl Task {
    pub fn from_new(new: NewTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            priority: new.priority,
            tag: new.tag,
            status: new.status,
            deadline: new.deadline,
            note: new.note,
            attachment: new.attachment,
        }
    }

    /// Whole days from `today` until the deadline; negative once overdue.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days()
    }

    /// Snapshot of the fields an edit may change.
    pub fn edit_draft(&self) -> TaskEdit {
        TaskEdit {
            name: self.name.clone(),
            priority: self.priority,
            tag: self.tag.clone(),
            status: self.status,
            deadline: self.deadline,
        }
    }

    pub(crate) fn apply_edit(&mut self, edit: TaskEdit) {
        self.name = edit.name;
        self.priority = edit.priority;
        self.tag = edit.tag;
        self.status = edit.status;
        self.deadline = edit.deadline;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub priority: Priority,
    pub tag: String,
    pub status: Status,
    pub deadline: NaiveDate,
    pub note: String,
    pub attachment: Option<Attachment>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, deadline: NaiveDate) -> Self {
        Self {
            name: name.into(),
            priority: Priority::Low,
            tag: String::new(),
            status: Status::NotStarted,
            deadline,
            note: String::new(),
            attachment: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// The five fields an edit overwrites. Note and attachment are not part of
/// an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub name: String,
    pub priority: Priority,
    pub tag: String,
    pub status: Status,
    pub deadline: NaiveDate,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{NewTask, Priority, Status, Task};
    use crate::error::StoreError;

    #[test]
    fn parses_literals_in_several_spellings() {
        assert_eq!("High".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("medium".parse::<Priority>(), Ok(Priority::Medium));
        assert_eq!("Not Started".parse::<Status>(), Ok(Status::NotStarted));
        assert_eq!("in_progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("Completed".parse::<Status>(), Ok(Status::Completed));
    }

    #[test]
    fn rejects_unknown_literals() {
        assert_eq!(
            "urgent".parse::<Priority>(),
            Err(StoreError::InvalidEnumValue {
                kind: "priority",
                value: "urgent".to_string()
            })
        );
        assert!("finished".parse::<Status>().is_err());
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for status in Status::ALL {
            assert_eq!(status.label().parse::<Status>(), Ok(status));
        }
        for priority in Priority::ALL {
            assert_eq!(priority.to_string().parse::<Priority>(), Ok(priority));
        }
    }

    #[test]
    fn days_remaining_goes_negative_when_overdue() {
        let deadline = NaiveDate::from_ymd_opt(2024, 1, 10).expect("date");
        let task = Task::from_new(NewTask::new("essay", deadline));

        let before = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");
        let after = NaiveDate::from_ymd_opt(2024, 1, 13).expect("date");
        assert_eq!(task.days_remaining(before), 2);
        assert_eq!(task.days_remaining(deadline), 0);
        assert_eq!(task.days_remaining(after), -3);
    }
}
