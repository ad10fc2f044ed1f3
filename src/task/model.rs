#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Menu order, which is also the display sort order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Position in the High < Medium < Low display order.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    /// High -> Medium -> Low -> High. Three applications are the identity;
    /// one application never is.
    #[must_use]
    pub fn cycled(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// The persisted task record. `id` is the storage key and never changes;
/// every mutating operation stamps `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub content: String,
    pub priority: Priority,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<OffsetDateTime>,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
    pub archived: bool,
}

impl Task {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            priority: Priority::default(),
            deadline: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            archived: false,
        }
    }

    pub fn complete(&mut self) {
        let now = OffsetDateTime::now_utc();
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn uncomplete(&mut self) {
        self.completed_at = None;
        self.touch();
    }

    pub fn archive(&mut self) {
        self.archived = true;
        self.touch();
    }

    pub fn unarchive(&mut self) {
        self.archived = false;
        self.touch();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.touch();
    }

    pub fn cycle_priority(&mut self) {
        self.priority = self.priority.cycled();
        self.touch();
    }

    pub fn set_deadline(&mut self, deadline: Option<OffsetDateTime>) {
        self.deadline = deadline;
        self.touch();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    /// True iff a deadline is set, the task is not completed, and the
    /// deadline lies strictly before `now`. Completed tasks are never
    /// overdue.
    #[must_use]
    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        match self.deadline {
            Some(deadline) => self.completed_at.is_none() && deadline < now,
            None => false,
        }
    }

    /// First line of the content, used by the condensed list view.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.content.lines().next().unwrap_or("")
    }

    /// First 8 characters of the id, used in commit messages.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}
