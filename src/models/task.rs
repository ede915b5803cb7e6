use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// A unit of work in the tracker.
///
/// Tasks carry the poll responses collected by the server-side reminder
/// scheduler; the timeline view is derived entirely from those responses and
/// the task status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub project_id: Option<i64>,
    pub workgroup_id: Option<i64>,
    pub created_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Reminder cadence; both must be set for the scheduler to poll.
    pub poll_interval_days: Option<i64>,
    /// Reminder time of day as "HH:MM".
    pub poll_time: Option<String>,
    pub last_polled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee_ids: Vec<i64>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub poll_responses: Vec<PollResponse>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Poll responses sorted ascending by poll timestamp.
    ///
    /// The timeline layout engine requires this ordering and never reorders
    /// its input, so the sort happens here on the owning side.
    pub fn sorted_poll_responses(&self) -> Vec<PollResponse> {
        let mut responses = self.poll_responses.clone();
        responses.sort_by_key(|r| r.polled_at);
        responses
    }
}

/// The lifecycle status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Review,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "in_progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Display label. Total over the enum so a new status cannot silently
    /// render as a default string.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In progress",
            Self::Review => "On review",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// One assignee's reply (or non-reply) to an automated reminder.
///
/// Immutable once recorded; ordered by `polled_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub polled_at: DateTime<Utc>,
    /// The assignee's answer text; absent when the reminder went unanswered.
    pub response_text: Option<String>,
    /// Task status at the moment of the poll, as reported by the server.
    /// Kept as a raw string so an unknown historical value cannot fail
    /// deserialization of a whole task list.
    pub status_at_poll: Option<String>,
    pub user: Option<User>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<i64>,
    pub workgroup_id: Option<i64>,
    #[serde(default)]
    pub assignee_ids: Vec<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub poll_interval_days: Option<i64>,
    pub poll_time: Option<String>,
}

/// Input for updating a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<i64>,
    pub workgroup_id: Option<i64>,
    pub assignee_ids: Option<Vec<i64>>,
    pub due_date: Option<DateTime<Utc>>,
    pub poll_interval_days: Option<i64>,
    pub poll_time: Option<String>,
}
