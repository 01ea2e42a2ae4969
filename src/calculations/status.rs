use crate::calendar::BusinessCalendar;
use crate::history::{ChangeHistoryEntry, FIELD_END_AT};
use crate::task::{ScheduleTask, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// End-date change count at which a task counts as chronically rescheduled.
pub const RESCHEDULE_LIMIT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueSeverity {
    OnTrack,
    Late,
    Rescheduled,
    LateAndRescheduled,
}

/// Per-task overdue signals. The two inputs stay separate so consumers can
/// weight "chronically rescheduled" differently from "simply late".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHealth {
    pub task_id: TaskId,
    pub overdue_by_reschedule: bool,
    pub overdue_by_date: bool,
    pub is_overdue: bool,
    pub severity: OverdueSeverity,
}

/// End-date change tallies per task, from the external history log.
pub fn end_date_change_counts(entries: &[ChangeHistoryEntry]) -> HashMap<TaskId, usize> {
    let mut counts = HashMap::new();
    for entry in entries {
        if entry.field_changed == FIELD_END_AT {
            *counts.entry(entry.task_id).or_insert(0) += 1;
        }
    }
    counts
}

pub fn evaluate_task(
    task: &ScheduleTask,
    end_date_changes: usize,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> TaskHealth {
    // Reschedule signal is independent of current dates and status.
    let overdue_by_reschedule = end_date_changes >= RESCHEDULE_LIMIT;

    let closed = task.status.is_closed();
    let overdue_by_date = !closed
        && task
            .end_at
            .is_some_and(|end| end < calendar.end_of_business_day(now));

    let is_overdue = !closed && (overdue_by_reschedule || overdue_by_date);
    let severity = if !is_overdue {
        OverdueSeverity::OnTrack
    } else {
        match (overdue_by_date, overdue_by_reschedule) {
            (true, true) => OverdueSeverity::LateAndRescheduled,
            (true, false) => OverdueSeverity::Late,
            _ => OverdueSeverity::Rescheduled,
        }
    };

    TaskHealth {
        task_id: task.id,
        overdue_by_reschedule,
        overdue_by_date,
        is_overdue,
        severity,
    }
}

pub fn evaluate(
    tasks: &[ScheduleTask],
    entries: &[ChangeHistoryEntry],
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Vec<TaskHealth> {
    let counts = end_date_change_counts(entries);
    tasks
        .iter()
        .map(|task| {
            evaluate_task(
                task,
                counts.get(&task.id).copied().unwrap_or(0),
                calendar,
                now,
            )
        })
        .collect()
}
