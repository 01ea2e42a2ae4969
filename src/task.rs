use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;
pub type ScheduleId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Closed tasks are exempt from date-based overdue checks.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub id: TaskId,
    pub schedule_id: ScheduleId,
    pub name: String,
    pub order_index: u32,
    pub is_summary: bool,
    pub duration_days: Option<i64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub parent_id: Option<TaskId>,
    pub responsible: Option<String>,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub predecessors: Vec<TaskId>,
}

impl ScheduleTask {
    pub fn new(
        id: TaskId,
        schedule_id: ScheduleId,
        name: impl Into<String>,
        order_index: u32,
    ) -> Self {
        Self {
            id,
            schedule_id,
            name: name.into(),
            order_index,
            is_summary: false,
            duration_days: None,
            start_at: None,
            end_at: None,
            parent_id: None,
            responsible: None,
            status: TaskStatus::Pending,
            notes: None,
            predecessors: Vec::new(),
        }
    }

    pub fn from_new(id: TaskId, schedule_id: ScheduleId, fields: NewTask) -> Self {
        Self {
            id,
            schedule_id,
            name: fields.name,
            order_index: fields.order_index,
            is_summary: fields.is_summary,
            duration_days: fields.duration_days,
            start_at: fields.start_at,
            end_at: fields.end_at,
            parent_id: fields.parent_id,
            responsible: fields.responsible,
            status: fields.status,
            notes: fields.notes,
            predecessors: fields.predecessors,
        }
    }

    /// Human-facing rank: one-based where order_index is zero-based.
    pub fn display_id(&self) -> u32 {
        self.order_index + 1
    }
}

/// Field set accepted by `TaskRepository::create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub order_index: u32,
    pub is_summary: bool,
    pub duration_days: Option<i64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub parent_id: Option<TaskId>,
    pub responsible: Option<String>,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub predecessors: Vec<TaskId>,
}

/// Partial update for `TaskRepository::update`. Nullable columns use a nested
/// Option: `Some(None)` clears, `None` leaves untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub order_index: Option<u32>,
    pub is_summary: Option<bool>,
    pub duration_days: Option<Option<i64>>,
    pub start_at: Option<Option<DateTime<Utc>>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
    pub parent_id: Option<Option<TaskId>>,
    pub responsible: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub notes: Option<Option<String>>,
    pub predecessors: Option<Vec<TaskId>>,
}

impl TaskPatch {
    /// Start, end, and duration changes are candidate rollup triggers.
    pub fn affects_rollup(&self) -> bool {
        self.start_at.is_some() || self.end_at.is_some() || self.duration_days.is_some()
    }

    pub fn apply_to(&self, task: &mut ScheduleTask) {
        if let Some(ref name) = self.name {
            task.name = name.clone();
        }
        if let Some(order_index) = self.order_index {
            task.order_index = order_index;
        }
        if let Some(is_summary) = self.is_summary {
            task.is_summary = is_summary;
        }
        if let Some(duration_days) = self.duration_days {
            task.duration_days = duration_days;
        }
        if let Some(start_at) = self.start_at {
            task.start_at = start_at;
        }
        if let Some(end_at) = self.end_at {
            task.end_at = end_at;
        }
        if let Some(parent_id) = self.parent_id {
            task.parent_id = parent_id;
        }
        if let Some(ref responsible) = self.responsible {
            task.responsible = responsible.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(ref notes) = self.notes {
            task.notes = notes.clone();
        }
        if let Some(ref predecessors) = self.predecessors {
            task.predecessors = predecessors.clone();
        }
    }
}
