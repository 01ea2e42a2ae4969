use chrono::{DateTime, TimeZone, Utc};
use wbs_engine::calculations::status::{evaluate, evaluate_task};
use wbs_engine::{
    BusinessCalendar, ChangeHistoryEntry, FIELD_END_AT, OverdueSeverity, ScheduleTask, TaskId,
    TaskStatus,
};

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

// Wednesday 2024-06-12, midday in São Paulo
fn now() -> DateTime<Utc> {
    utc(2024, 6, 12, 15)
}

fn task(id: TaskId, status: TaskStatus, end_at: Option<DateTime<Utc>>) -> ScheduleTask {
    let mut task = ScheduleTask::new(id, 1, format!("task {id}"), id as u32);
    task.status = status;
    task.end_at = end_at;
    task
}

fn end_change(task_id: TaskId) -> ChangeHistoryEntry {
    ChangeHistoryEntry {
        task_id,
        field_changed: FIELD_END_AT.to_string(),
        previous_value: Some("2024-06-01".to_string()),
        new_value: Some("2024-06-20".to_string()),
        changed_at: utc(2024, 6, 2, 12),
        changed_by: Some("planner".to_string()),
    }
}

#[test]
fn past_end_date_marks_open_task_overdue() {
    let cal = BusinessCalendar::default();
    let late = task(1, TaskStatus::InProgress, Some(utc(2024, 6, 10, 21)));
    let health = evaluate_task(&late, 0, &cal, now());

    assert!(health.overdue_by_date);
    assert!(!health.overdue_by_reschedule);
    assert!(health.is_overdue);
    assert_eq!(health.severity, OverdueSeverity::Late);
}

#[test]
fn due_earlier_today_already_counts_as_overdue() {
    let cal = BusinessCalendar::default();
    // Due 18:00 São Paulo today: strictly earlier than the end of the local day
    let due_today = task(1, TaskStatus::Pending, Some(utc(2024, 6, 12, 21)));
    let health = evaluate_task(&due_today, 0, &cal, now());

    assert!(health.overdue_by_date);
    assert!(health.is_overdue);
}

#[test]
fn due_tomorrow_is_not_overdue() {
    let cal = BusinessCalendar::default();
    let due_tomorrow = task(1, TaskStatus::Pending, Some(utc(2024, 6, 13, 21)));
    let health = evaluate_task(&due_tomorrow, 0, &cal, now());

    assert!(!health.overdue_by_date);
    assert!(!health.is_overdue);
    assert_eq!(health.severity, OverdueSeverity::OnTrack);
}

#[test]
fn closed_tasks_are_exempt_from_date_overdue() {
    let cal = BusinessCalendar::default();
    for status in [TaskStatus::Done, TaskStatus::Cancelled] {
        let closed = task(1, status, Some(utc(2024, 6, 1, 21)));
        let health = evaluate_task(&closed, 0, &cal, now());
        assert!(!health.overdue_by_date);
        assert!(!health.is_overdue);
    }
}

#[test]
fn two_end_date_changes_flag_a_future_task() {
    let cal = BusinessCalendar::default();
    // End date is comfortably in the future; history alone flags it
    let rescheduled = task(7, TaskStatus::InProgress, Some(utc(2024, 6, 28, 21)));
    let entries = vec![end_change(7), end_change(7)];
    let health = evaluate(&[rescheduled], &entries, &cal, now());

    assert!(health[0].overdue_by_reschedule);
    assert!(!health[0].overdue_by_date);
    assert!(health[0].is_overdue);
    assert_eq!(health[0].severity, OverdueSeverity::Rescheduled);
}

#[test]
fn a_single_end_date_change_is_not_chronic() {
    let cal = BusinessCalendar::default();
    let once = task(7, TaskStatus::InProgress, Some(utc(2024, 6, 28, 21)));
    let health = evaluate(&[once], &[end_change(7)], &cal, now());
    assert!(!health[0].overdue_by_reschedule);
    assert!(!health[0].is_overdue);
}

#[test]
fn changes_to_other_fields_do_not_count() {
    let cal = BusinessCalendar::default();
    let mut entry = end_change(7);
    entry.field_changed = "name".to_string();
    let t = task(7, TaskStatus::Pending, Some(utc(2024, 6, 28, 21)));
    let health = evaluate(&[t], &[entry, end_change(7)], &cal, now());
    assert!(!health[0].overdue_by_reschedule);
}

#[test]
fn reschedule_signal_stays_raw_on_closed_tasks() {
    let cal = BusinessCalendar::default();
    let done = task(7, TaskStatus::Done, Some(utc(2024, 6, 1, 21)));
    let entries = vec![end_change(7), end_change(7)];
    let health = evaluate(&[done], &entries, &cal, now());

    // Both signals stay visible to consumers, but the task is not overdue
    assert!(health[0].overdue_by_reschedule);
    assert!(!health[0].is_overdue);
    assert_eq!(health[0].severity, OverdueSeverity::OnTrack);
}

#[test]
fn late_and_rescheduled_combine_into_the_worst_severity() {
    let cal = BusinessCalendar::default();
    let t = task(7, TaskStatus::InProgress, Some(utc(2024, 6, 10, 21)));
    let entries = vec![end_change(7), end_change(7), end_change(7)];
    let health = evaluate(&[t], &entries, &cal, now());
    assert_eq!(health[0].severity, OverdueSeverity::LateAndRescheduled);
}

#[test]
fn a_task_without_end_date_is_never_date_overdue() {
    let cal = BusinessCalendar::default();
    let open_ended = task(1, TaskStatus::InProgress, None);
    let health = evaluate_task(&open_ended, 0, &cal, now());
    assert!(!health.overdue_by_date);
    assert!(!health.is_overdue);
}
