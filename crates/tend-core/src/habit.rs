use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::task::normalize_literal;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_literal(s).as_str() {
            "daily" | "day" | "d" => Ok(Frequency::Daily),
            "weekly" | "week" | "w" => Ok(Frequency::Weekly),
            "monthly" | "month" | "m" => Ok(Frequency::Monthly),
            _ => Err(StoreError::InvalidEnumValue {
                kind: "frequency",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            frequency,
            start_date,
        }
    }
}

impl Habit {
    pub fn from_new(new: NewHabit) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            frequency: new.frequency,
            start_date: new.start_date,
            completed: false,
        }
    }
}
