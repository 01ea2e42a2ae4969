use chrono::{DateTime, TimeZone, Utc};
use wbs_engine::calculations::{status, traffic};
use wbs_engine::{BusinessCalendar, LightColor, ScheduleTask, TaskId, TaskStatus};

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

// Wednesday 2024-06-12, midday in São Paulo
fn now() -> DateTime<Utc> {
    utc(2024, 6, 12, 15)
}

fn on_time(id: TaskId) -> ScheduleTask {
    let mut task = ScheduleTask::new(id, 1, format!("task {id}"), id as u32);
    task.status = TaskStatus::InProgress;
    task.end_at = Some(utc(2024, 6, 28, 21));
    task
}

fn late_by(id: TaskId, days: u32) -> ScheduleTask {
    let mut task = on_time(id);
    // 18:00 São Paulo `days` calendar days before now
    task.end_at = Some(utc(2024, 6, 12 - days, 21));
    task
}

fn light_for(tasks: &[ScheduleTask]) -> traffic::TrafficLight {
    let cal = BusinessCalendar::default();
    let health = status::evaluate(tasks, &[], &cal, now());
    traffic::aggregate(tasks, &health, &cal, now())
}

#[test]
fn empty_schedule_is_gray() {
    let light = light_for(&[]);
    assert_eq!(light.color, LightColor::Gray);
    assert_eq!(light.reason, "no tasks registered");
    assert!(light.offending.is_empty());
}

#[test]
fn no_overdue_tasks_is_green() {
    let tasks: Vec<ScheduleTask> = (1..=10).map(on_time).collect();
    let light = light_for(&tasks);
    assert_eq!(light.color, LightColor::Green);
    assert!(light.offending.is_empty());
}

#[test]
fn forty_percent_overdue_is_red_even_when_barely_late() {
    let mut tasks: Vec<ScheduleTask> = (1..=6).map(on_time).collect();
    for id in 7..=10 {
        tasks.push(late_by(id, 2));
    }
    let light = light_for(&tasks);

    assert_eq!(light.color, LightColor::Red);
    assert!(light.reason.contains('%'), "reason: {}", light.reason);
    assert_eq!(light.offending, vec![7, 8, 9, 10]);
}

#[test]
fn one_deeply_late_task_is_red_despite_low_share() {
    let mut tasks: Vec<ScheduleTask> = (1..=9).map(on_time).collect();
    tasks.push(late_by(10, 8));
    let light = light_for(&tasks);

    assert_eq!(light.color, LightColor::Red);
    assert!(
        light.reason.contains("past their end date"),
        "reason: {}",
        light.reason
    );
    assert_eq!(light.offending, vec![10]);
}

#[test]
fn few_mildly_late_tasks_are_yellow() {
    let mut tasks: Vec<ScheduleTask> = (1..=8).map(on_time).collect();
    tasks.push(late_by(9, 3));
    tasks.push(late_by(10, 3));
    let light = light_for(&tasks);

    assert_eq!(light.color, LightColor::Yellow);
    assert_eq!(light.offending, vec![9, 10]);
}

#[test]
fn seven_days_late_is_still_within_the_absolute_limit() {
    let mut tasks: Vec<ScheduleTask> = (1..=9).map(on_time).collect();
    tasks.push(late_by(10, 7));
    assert_eq!(light_for(&tasks).color, LightColor::Yellow);
}

#[test]
fn both_red_clauses_concatenate_their_reasons() {
    let mut tasks: Vec<ScheduleTask> = (1..=6).map(on_time).collect();
    for id in 7..=10 {
        tasks.push(late_by(id, 9));
    }
    let light = light_for(&tasks);

    assert_eq!(light.color, LightColor::Red);
    assert!(light.reason.contains('%'), "reason: {}", light.reason);
    assert!(
        light.reason.contains("past their end date"),
        "reason: {}",
        light.reason
    );
    assert!(light.reason.contains("; "), "reason: {}", light.reason);
}

#[test]
fn reschedule_only_overdue_counts_for_share_but_not_depth() {
    use wbs_engine::{ChangeHistoryEntry, FIELD_END_AT};

    let cal = BusinessCalendar::default();
    // Future end date, chronically rescheduled: overdue, but never "deeply late"
    let tasks: Vec<ScheduleTask> = vec![on_time(1)];
    let entry = |_| ChangeHistoryEntry {
        task_id: 1,
        field_changed: FIELD_END_AT.to_string(),
        previous_value: None,
        new_value: None,
        changed_at: now(),
        changed_by: None,
    };
    let entries: Vec<ChangeHistoryEntry> = (0..2).map(entry).collect();
    let health = status::evaluate(&tasks, &entries, &cal, now());
    let light = traffic::aggregate(&tasks, &health, &cal, now());

    // 1 of 1 overdue => share clause fires; the absolute clause must not
    assert_eq!(light.color, LightColor::Red);
    assert!(!light.reason.contains("past their end date"));
}
