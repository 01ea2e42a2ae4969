use super::status::TaskHealth;
use crate::calendar::BusinessCalendar;
use crate::task::{ScheduleTask, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overdue share of all tasks above which the schedule turns red, percent.
pub const OVERDUE_SHARE_LIMIT: f64 = 30.0;

/// Calendar days past the end date beyond which a single overdue task turns
/// the schedule red.
pub const LATE_DAYS_LIMIT: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Gray,
    Green,
    Yellow,
    Red,
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightColor::Gray => "gray",
            LightColor::Green => "green",
            LightColor::Yellow => "yellow",
            LightColor::Red => "red",
        };
        write!(f, "{name}")
    }
}

/// Schedule-level health indicator with the offending task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficLight {
    pub color: LightColor,
    pub reason: String,
    pub offending: Vec<TaskId>,
}

pub fn aggregate(
    tasks: &[ScheduleTask],
    health: &[TaskHealth],
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> TrafficLight {
    if tasks.is_empty() {
        return TrafficLight {
            color: LightColor::Gray,
            reason: "no tasks registered".to_string(),
            offending: Vec::new(),
        };
    }

    let offending: Vec<TaskId> = health
        .iter()
        .filter(|h| h.is_overdue)
        .map(|h| h.task_id)
        .collect();
    if offending.is_empty() {
        return TrafficLight {
            color: LightColor::Green,
            reason: "no overdue tasks".to_string(),
            offending,
        };
    }

    let share = offending.len() as f64 * 100.0 / tasks.len() as f64;

    // Only date-based lateness feeds the absolute clause; the reschedule
    // signal alone never marks a task deeply late.
    let deeply_late = tasks
        .iter()
        .zip(health)
        .filter(|(task, h)| {
            h.overdue_by_date
                && task
                    .end_at
                    .is_some_and(|end| calendar.calendar_days_between(end, now) > LATE_DAYS_LIMIT)
        })
        .count();

    let mut reasons = Vec::new();
    if share > OVERDUE_SHARE_LIMIT {
        reasons.push(format!(
            "{share:.0}% of tasks are overdue (limit {OVERDUE_SHARE_LIMIT:.0}%)"
        ));
    }
    if deeply_late > 0 {
        reasons.push(format!(
            "{deeply_late} task(s) more than {LATE_DAYS_LIMIT} days past their end date"
        ));
    }

    if reasons.is_empty() {
        TrafficLight {
            color: LightColor::Yellow,
            reason: format!(
                "{} of {} tasks overdue, within tolerance",
                offending.len(),
                tasks.len()
            ),
            offending,
        }
    } else {
        TrafficLight {
            color: LightColor::Red,
            reason: reasons.join("; "),
            offending,
        }
    }
}
