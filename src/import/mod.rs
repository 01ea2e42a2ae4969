use crate::calendar::{BusinessCalendar, day_end_time, day_start_time};
use crate::persistence::{RepositoryError, TaskRepository};
use crate::task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch, TaskStatus};
use crate::task_validation::ValidationError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

pub mod file;

pub use file::{ImportFileError, load_import_rows_from_csv};

/// Day zero of the spreadsheet date-serial scheme.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One spreadsheet row, raw field values as exported. Identifiers are
/// caller-assigned and only meaningful within one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub external_code: String,
    pub external_id: String,
    pub name: String,
    pub external_parent_id: String,
    pub status: String,
    pub duration: String,
    pub duration_alt: String,
    pub start: String,
    pub end: String,
    pub responsible: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRowError {
    /// One-based position in the file.
    pub row: usize,
    pub error: ValidationError,
}

impl fmt::Display for ImportRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub created: Vec<ScheduleTask>,
    pub linked: usize,
    pub row_errors: Vec<ImportRowError>,
}

/// Two-pass reconciliation of externally-identified rows into persisted
/// tasks. Pass 1 creates every importable row in file order; pass 2 resolves
/// parent links through the pass-1 id map. Row-level problems accumulate;
/// only repository failures abort.
pub struct ImportReconciler<'a, R: TaskRepository> {
    repository: &'a mut R,
    schedule_id: ScheduleId,
    calendar: &'a BusinessCalendar,
}

impl<'a, R: TaskRepository> ImportReconciler<'a, R> {
    pub fn new(
        repository: &'a mut R,
        schedule_id: ScheduleId,
        calendar: &'a BusinessCalendar,
    ) -> Self {
        Self {
            repository,
            schedule_id,
            calendar,
        }
    }

    pub fn execute(
        mut self,
        rows: &[ImportRow],
        now: DateTime<Utc>,
    ) -> Result<ImportReport, RepositoryError> {
        let mut row_errors = Vec::new();
        let (created, by_external) = self.create_pass(rows, now, &mut row_errors)?;
        let linked = self.link_pass(rows, &by_external, &mut row_errors)?;

        info!(
            created = created.len(),
            linked,
            errors = row_errors.len(),
            "bulk import reconciled"
        );
        Ok(ImportReport {
            created,
            linked,
            row_errors,
        })
    }

    fn create_pass(
        &mut self,
        rows: &[ImportRow],
        now: DateTime<Utc>,
        row_errors: &mut Vec<ImportRowError>,
    ) -> Result<(Vec<ScheduleTask>, HashMap<i64, TaskId>), RepositoryError> {
        let existing = self.repository.list(self.schedule_id)?;
        let mut next_index = existing
            .iter()
            .map(|task| task.order_index + 1)
            .max()
            .unwrap_or(0);
        let (default_start, default_end) = self.calendar.default_task_window(now);

        let mut created = Vec::new();
        let mut by_external: HashMap<i64, TaskId> = HashMap::new();

        for (pos, row) in rows.iter().enumerate() {
            let row_no = pos + 1;
            if row.name.trim().is_empty() {
                row_errors.push(ImportRowError {
                    row: row_no,
                    error: ValidationError::EmptyName,
                });
                continue;
            }
            let external_id = match parse_external_id(&row.external_id) {
                Ok(id) => id,
                Err(error) => {
                    row_errors.push(ImportRowError { row: row_no, error });
                    continue;
                }
            };

            let start_at = parse_import_date(&row.start, self.calendar, day_start_time())
                .unwrap_or(default_start);
            let duration = parse_duration(&row.duration).or_else(|| parse_duration(&row.duration_alt));
            let end_at = parse_import_date(&row.end, self.calendar, day_end_time())
                .or_else(|| duration.map(|days| self.calendar.end_for_duration(start_at, days)))
                .unwrap_or(default_end);
            let duration_days =
                duration.unwrap_or_else(|| self.calendar.working_days_between(start_at, end_at));

            let fields = NewTask {
                name: row.name.trim().to_string(),
                order_index: next_index,
                duration_days: Some(duration_days),
                start_at: Some(start_at),
                end_at: Some(end_at),
                responsible: non_empty(&row.responsible),
                status: normalize_status(&row.status),
                ..NewTask::default()
            };
            let task = self.repository.create(self.schedule_id, fields)?;
            by_external.insert(external_id, task.id);
            created.push(task);
            next_index += 1;
        }

        Ok((created, by_external))
    }

    fn link_pass(
        &mut self,
        rows: &[ImportRow],
        by_external: &HashMap<i64, TaskId>,
        row_errors: &mut Vec<ImportRowError>,
    ) -> Result<usize, RepositoryError> {
        let mut linked = 0;
        for (pos, row) in rows.iter().enumerate() {
            let Ok(child_ext) = parse_external_id(&row.external_id) else {
                continue;
            };
            let Some(&child_id) = by_external.get(&child_ext) else {
                continue;
            };
            if row.external_parent_id.trim().is_empty() {
                continue;
            }
            // An unresolvable parent reference leaves the task unparented,
            // silently; a self-reference is a recorded validation error.
            let Ok(parent_ext) = parse_external_id(&row.external_parent_id) else {
                continue;
            };
            if parent_ext == child_ext {
                row_errors.push(ImportRowError {
                    row: pos + 1,
                    error: ValidationError::SelfParent(child_id),
                });
                continue;
            }
            let Some(&parent_id) = by_external.get(&parent_ext) else {
                continue;
            };

            self.repository.update(
                child_id,
                &TaskPatch {
                    parent_id: Some(Some(parent_id)),
                    ..TaskPatch::default()
                },
            )?;
            self.repository.update(
                parent_id,
                &TaskPatch {
                    is_summary: Some(true),
                    ..TaskPatch::default()
                },
            )?;
            linked += 1;
        }
        Ok(linked)
    }
}

/// Case-insensitive substring normalization of the spreadsheet status text.
pub fn normalize_status(raw: &str) -> TaskStatus {
    let lower = raw.trim().to_lowercase();
    if lower.contains("andamento") || lower.contains("fazendo") {
        TaskStatus::InProgress
    } else if lower.contains("conclu") {
        TaskStatus::Done
    } else if lower.contains("cancel") {
        TaskStatus::Cancelled
    } else {
        TaskStatus::Pending
    }
}

pub fn parse_external_id(raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }
    // Spreadsheets export integer cells as "3.0".
    if let Ok(value) = raw.parse::<f64>() {
        if value.fract() == 0.0 && value.is_finite() {
            return Ok(value as i64);
        }
    }
    Err(ValidationError::MalformedExternalId(raw.to_string()))
}

/// Accepts a numeric date serial (day count since 1899-12-30 plus fractional
/// time) or the textual forms `dd/mm/yyyy hh:mm` and `dd/mm/yyyy`. Values
/// without a time of day take `fallback_time`. Anything else is None.
pub fn parse_import_date(
    raw: &str,
    calendar: &BusinessCalendar,
    fallback_time: NaiveTime,
) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(serial) = raw.parse::<f64>() {
        return parse_date_serial(serial, calendar, fallback_time);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M") {
        return Some(calendar.localize(naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(calendar.instant_at(date, fallback_time));
    }
    None
}

fn parse_date_serial(
    serial: f64,
    calendar: &BusinessCalendar,
    fallback_time: NaiveTime,
) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial <= 0.0 || serial >= 200_000.0 {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    let date = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    let fraction = serial.fract();
    if fraction > 0.0 {
        let seconds = (fraction * SECONDS_PER_DAY).round() as i64;
        let naive = date.and_hms_opt(0, 0, 0)? + Duration::seconds(seconds);
        Some(calendar.localize(naive))
    } else {
        Some(calendar.instant_at(date, fallback_time))
    }
}

fn parse_duration(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let days = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|value| value.trunc() as i64))?;
    (days >= 0).then_some(days)
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
