use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task index {index} is out of range (have {len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("habit index {index} is out of range (have {len} habits)")]
    HabitIndexOutOfRange { index: usize, len: usize },

    #[error("no task with id {0}")]
    UnknownTask(Uuid),

    #[error("no habit with id {0}")]
    UnknownHabit(Uuid),

    #[error("invalid {kind} value: {value:?}")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("{kind} name cannot be empty")]
    EmptyName { kind: &'static str },

    #[error("unsupported attachment type: {file_name} (accepted: pdf, docx, txt, jpg, png)")]
    UnsupportedAttachment { file_name: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
