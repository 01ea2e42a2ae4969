use crate::persistence::RepositoryError;
use crate::task::{ScheduleId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field key recorded when a task's end date changes.
pub const FIELD_END_AT: &str = "end_at";

/// One field-level change record. The log is append-only and written outside
/// this crate; the core only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeHistoryEntry {
    pub task_id: TaskId,
    pub field_changed: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
}

pub trait ChangeHistoryLog {
    fn list(&self, schedule_id: ScheduleId) -> Result<Vec<ChangeHistoryEntry>, RepositoryError>;
}
