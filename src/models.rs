//! Domain records for the meeting/task-tracking schema.
//!
//! These mirror the relational tables the crate reads and writes. Junction
//! tables (task↔member, meeting↔topic, ...) carry no independent identity
//! and never appear here as structs; they surface only through join reads
//! and link operations on the [`crate::store::Store`] seam.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A committee member. `chat_id` is the external chat identity; `None`
/// means the account has not been linked yet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub chat_id: Option<i64>,
    pub role: Option<String>,
    pub subgroup: Option<String>,
    pub email: Option<String>,
}

/// Task status. Stored values outside the two known states (including
/// NULL) normalize to `Incomplete`; [`TaskStatus::from_stored`] is the one
/// place that normalization happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Complete,
    #[default]
    Incomplete,
}

impl TaskStatus {
    /// Normalize a raw stored value.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("complete") => TaskStatus::Complete,
            _ => TaskStatus::Incomplete,
        }
    }

    /// Strict parse for user-supplied status values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "complete" => Some(TaskStatus::Complete),
            "incomplete" => Some(TaskStatus::Incomplete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Complete => "complete",
            TaskStatus::Incomplete => "incomplete",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter accepted by task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Complete,
    Incomplete,
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(StatusFilter::All),
            "complete" => Some(StatusFilter::Complete),
            "incomplete" => Some(StatusFilter::Incomplete),
            _ => None,
        }
    }

    /// True when a task's normalized status passes this filter.
    pub fn accepts(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Complete => status == TaskStatus::Complete,
            StatusFilter::Incomplete => status == TaskStatus::Incomplete,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Meeting {
    pub id: i64,
    pub name: String,
    /// Meeting type/category ("weekly sync", "committee", ...).
    pub kind: Option<String>,
    pub summary: Option<String>,
    pub ingested_at: Option<DateTime<Utc>>,
}

impl Meeting {
    /// Calendar date of ingestion, the date shown in meeting payloads.
    pub fn date(&self) -> Option<NaiveDate> {
        self.ingested_at.map(|ts| ts.date_naive())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// ---- insert payloads ----

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTopic {
    pub name: String,
    pub description: Option<String>,
}

// ---- join-read projections ----

/// Task summary as shown inside meeting/project/member payloads.
#[derive(Debug, Clone)]
pub struct TaskBrief {
    pub name: String,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
}

/// Member summary as shown inside project payloads.
#[derive(Debug, Clone)]
pub struct MemberBrief {
    pub name: String,
    pub role: Option<String>,
}

/// Meeting summary as shown inside topic payloads.
#[derive(Debug, Clone)]
pub struct MeetingBrief {
    pub name: String,
    pub kind: Option<String>,
}
