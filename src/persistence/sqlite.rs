use super::{RepositoryError, RepositoryResult, TaskRepository};
use crate::history::{ChangeHistoryEntry, ChangeHistoryLog};
use crate::task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch, TaskStatus};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// Sqlite-backed repository plus change-history reader. The change_history
/// table is populated outside this crate; only reads happen here.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> RepositoryResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self { connection })
    }

    fn initialize_schema(connection: &Connection) -> RepositoryResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                schedule_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                is_summary INTEGER NOT NULL DEFAULT 0,
                duration_days INTEGER,
                start_at TEXT,
                end_at TEXT,
                parent_id INTEGER,
                responsible TEXT,
                status TEXT NOT NULL,
                notes TEXT,
                predecessors TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_schedule
                ON tasks (schedule_id, order_index);
            CREATE TABLE IF NOT EXISTS change_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL,
                field_changed TEXT NOT NULL,
                previous_value TEXT,
                new_value TEXT,
                changed_at TEXT NOT NULL,
                changed_by TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_history_task
                ON change_history (task_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn fetch_task(&self, id: TaskId) -> RepositoryResult<Option<ScheduleTask>> {
        let mut stmt = self.connection.prepare(
            "SELECT id, schedule_id, name, order_index, is_summary, duration_days,
                    start_at, end_at, parent_id, responsible, status, notes, predecessors
             FROM tasks WHERE id = ?1",
        )?;
        let raw = stmt
            .query_row(params![id], RawTask::from_row)
            .optional()?;
        raw.map(RawTask::into_task).transpose()
    }

    fn store_task(&mut self, task: &ScheduleTask) -> RepositoryResult<()> {
        let changed = self.connection.execute(
            "UPDATE tasks SET
                name = ?2, order_index = ?3, is_summary = ?4, duration_days = ?5,
                start_at = ?6, end_at = ?7, parent_id = ?8, responsible = ?9,
                status = ?10, notes = ?11, predecessors = ?12
             WHERE id = ?1",
            params![
                task.id,
                task.name,
                task.order_index,
                task.is_summary,
                task.duration_days,
                task.start_at.map(format_instant),
                task.end_at.map(format_instant),
                task.parent_id,
                task.responsible,
                task.status.as_str(),
                task.notes,
                serde_json::to_string(&task.predecessors)?,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(task.id));
        }
        Ok(())
    }
}

impl TaskRepository for SqliteStore {
    fn list(&self, schedule_id: ScheduleId) -> RepositoryResult<Vec<ScheduleTask>> {
        let mut stmt = self.connection.prepare(
            "SELECT id, schedule_id, name, order_index, is_summary, duration_days,
                    start_at, end_at, parent_id, responsible, status, notes, predecessors
             FROM tasks WHERE schedule_id = ?1 ORDER BY order_index, id",
        )?;
        let rows = stmt.query_map(params![schedule_id], RawTask::from_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    fn create(&mut self, schedule_id: ScheduleId, fields: NewTask) -> RepositoryResult<ScheduleTask> {
        self.connection.execute(
            "INSERT INTO tasks (schedule_id, name, order_index, is_summary, duration_days,
                                start_at, end_at, parent_id, responsible, status, notes,
                                predecessors)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                schedule_id,
                fields.name,
                fields.order_index,
                fields.is_summary,
                fields.duration_days,
                fields.start_at.map(format_instant),
                fields.end_at.map(format_instant),
                fields.parent_id,
                fields.responsible,
                fields.status.as_str(),
                fields.notes,
                serde_json::to_string(&fields.predecessors)?,
            ],
        )?;
        let id = self.connection.last_insert_rowid();
        Ok(ScheduleTask::from_new(id, schedule_id, fields))
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> RepositoryResult<()> {
        let mut task = self
            .fetch_task(id)?
            .ok_or(RepositoryError::NotFound(id))?;
        patch.apply_to(&mut task);
        self.store_task(&task)
    }

    fn delete(&mut self, id: TaskId) -> RepositoryResult<()> {
        let changed = self
            .connection
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}

impl ChangeHistoryLog for SqliteStore {
    fn list(&self, schedule_id: ScheduleId) -> Result<Vec<ChangeHistoryEntry>, RepositoryError> {
        let mut stmt = self.connection.prepare(
            "SELECT h.task_id, h.field_changed, h.previous_value, h.new_value,
                    h.changed_at, h.changed_by
             FROM change_history h
             JOIN tasks t ON t.id = h.task_id
             WHERE t.schedule_id = ?1
             ORDER BY h.changed_at, h.id",
        )?;
        let rows = stmt.query_map(params![schedule_id], |row| {
            Ok((
                row.get::<_, TaskId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (task_id, field_changed, previous_value, new_value, changed_at, changed_by) = row?;
            entries.push(ChangeHistoryEntry {
                task_id,
                field_changed,
                previous_value,
                new_value,
                changed_at: parse_instant(&changed_at)?,
                changed_by,
            });
        }
        Ok(entries)
    }
}

struct RawTask {
    id: TaskId,
    schedule_id: ScheduleId,
    name: String,
    order_index: u32,
    is_summary: bool,
    duration_days: Option<i64>,
    start_at: Option<String>,
    end_at: Option<String>,
    parent_id: Option<TaskId>,
    responsible: Option<String>,
    status: String,
    notes: Option<String>,
    predecessors: String,
}

impl RawTask {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            schedule_id: row.get(1)?,
            name: row.get(2)?,
            order_index: row.get(3)?,
            is_summary: row.get(4)?,
            duration_days: row.get(5)?,
            start_at: row.get(6)?,
            end_at: row.get(7)?,
            parent_id: row.get(8)?,
            responsible: row.get(9)?,
            status: row.get(10)?,
            notes: row.get(11)?,
            predecessors: row.get(12)?,
        })
    }

    fn into_task(self) -> RepositoryResult<ScheduleTask> {
        let status = TaskStatus::from_str(&self.status)
            .ok_or_else(|| RepositoryError::InvalidData(format!("unknown status '{}'", self.status)))?;
        Ok(ScheduleTask {
            id: self.id,
            schedule_id: self.schedule_id,
            name: self.name,
            order_index: self.order_index,
            is_summary: self.is_summary,
            duration_days: self.duration_days,
            start_at: self.start_at.as_deref().map(parse_instant).transpose()?,
            end_at: self.end_at.as_deref().map(parse_instant).transpose()?,
            parent_id: self.parent_id,
            responsible: self.responsible,
            status,
            notes: self.notes,
            predecessors: serde_json::from_str(&self.predecessors)?,
        })
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

fn parse_instant(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| RepositoryError::InvalidData(format!("invalid timestamp '{raw}': {err}")))
}
