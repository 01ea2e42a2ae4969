use crate::calculations::rollup::{self, RollupSummary};
use crate::calculations::status::{self, TaskHealth};
use crate::calculations::traffic::{self, TrafficLight};
use crate::calendar::BusinessCalendar;
use crate::history::ChangeHistoryLog;
use crate::import::{ImportReconciler, ImportReport, ImportRow, ImportRowError};
use crate::persistence::{RepositoryError, TaskRepository};
use crate::task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch};
use crate::task_validation::{self, ValidationError};
use crate::tree::{CyclicHierarchy, would_create_cycle};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum EngineError {
    Validation(ValidationError),
    Cycle(CyclicHierarchy),
    NotFound(TaskId),
    Repository(RepositoryError),
    ImportRejected(Vec<ImportRowError>),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(err) => write!(f, "{err}"),
            EngineError::Cycle(err) => write!(f, "{err}"),
            EngineError::NotFound(id) => write!(f, "task {id} not found"),
            EngineError::Repository(err) => write!(f, "repository failure: {err}"),
            EngineError::ImportRejected(errors) => write!(
                f,
                "import produced no tasks ({} row error(s))",
                errors.len()
            ),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CyclicHierarchy> for EngineError {
    fn from(value: CyclicHierarchy) -> Self {
        Self::Cycle(value)
    }
}

impl From<RepositoryError> for EngineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// One schedule's engine: hierarchy maintenance, rollups, health signals,
/// and bulk import, over an injected repository and change-history log.
///
/// All derivations run against the repository snapshot taken at the start of
/// the operation; callers invoke `recompute_rollups` explicitly after a
/// mutation batch.
pub struct ScheduleEngine<R, H> {
    schedule_id: ScheduleId,
    repository: R,
    history: H,
    calendar: BusinessCalendar,
}

impl<R: TaskRepository, H: ChangeHistoryLog> ScheduleEngine<R, H> {
    pub fn new(schedule_id: ScheduleId, repository: R, history: H) -> Self {
        Self::with_calendar(schedule_id, repository, history, BusinessCalendar::default())
    }

    pub fn with_calendar(
        schedule_id: ScheduleId,
        repository: R,
        history: H,
        calendar: BusinessCalendar,
    ) -> Self {
        Self {
            schedule_id,
            repository,
            history,
            calendar,
        }
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn tasks(&self) -> Result<Vec<ScheduleTask>, EngineError> {
        Ok(self.repository.list(self.schedule_id)?)
    }

    pub fn task(&self, id: TaskId) -> Result<ScheduleTask, EngineError> {
        self.tasks()?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(EngineError::NotFound(id))
    }

    pub fn create_task(
        &mut self,
        name: &str,
        parent_id: Option<TaskId>,
    ) -> Result<ScheduleTask, EngineError> {
        self.create_task_at(name, parent_id, Utc::now())
    }

    /// Append a task with the default 08:00–18:00 window on the creation day
    /// and the next free order_index.
    pub fn create_task_at(
        &mut self,
        name: &str,
        parent_id: Option<TaskId>,
        now: DateTime<Utc>,
    ) -> Result<ScheduleTask, EngineError> {
        task_validation::validate_name(name)?;
        let tasks = self.repository.list(self.schedule_id)?;
        if let Some(parent) = parent_id {
            if !tasks.iter().any(|task| task.id == parent) {
                return Err(ValidationError::UnknownParent(parent).into());
            }
        }

        let order_index = tasks
            .iter()
            .map(|task| task.order_index + 1)
            .max()
            .unwrap_or(0);
        let (start_at, end_at) = self.calendar.default_task_window(now);
        let fields = NewTask {
            name: name.trim().to_string(),
            order_index,
            start_at: Some(start_at),
            end_at: Some(end_at),
            parent_id,
            ..NewTask::default()
        };
        let task = self.repository.create(self.schedule_id, fields)?;
        if let Some(parent) = parent_id {
            self.mark_summary(parent)?;
        }
        Ok(task)
    }

    /// Field-level mutation. Re-parenting is validated — including cycle
    /// rejection — before anything is written.
    pub fn update_task(&mut self, id: TaskId, patch: &TaskPatch) -> Result<(), EngineError> {
        if let Some(ref name) = patch.name {
            task_validation::validate_name(name)?;
        }
        if let Some(Some(days)) = patch.duration_days {
            if days < 0 {
                return Err(ValidationError::NegativeDuration(days).into());
            }
        }
        if let Some(new_parent) = patch.parent_id {
            self.check_parent_assignment(id, new_parent)?;
        }

        self.repository.update(id, patch)?;
        if let Some(Some(parent)) = patch.parent_id {
            self.mark_summary(parent)?;
        }
        if patch.affects_rollup() {
            debug!(task = id, "date fields changed, rollup recomputation pending");
        }
        Ok(())
    }

    pub fn set_parent(
        &mut self,
        id: TaskId,
        parent_id: Option<TaskId>,
    ) -> Result<(), EngineError> {
        self.update_task(
            id,
            &TaskPatch {
                parent_id: Some(parent_id),
                ..TaskPatch::default()
            },
        )
    }

    /// Orphaning of children is the caller's concern.
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), EngineError> {
        Ok(self.repository.delete(id)?)
    }

    /// Raise summary end dates to their descendant maxima and persist the
    /// raises. Idempotent: a second run over unchanged data writes nothing.
    pub fn recompute_rollups(&mut self) -> Result<RollupSummary, EngineError> {
        let tasks = self.repository.list(self.schedule_id)?;
        let updates = rollup::recompute_rollups(&tasks)?;
        for update in &updates {
            self.repository.update(
                update.task_id,
                &TaskPatch {
                    end_at: Some(Some(update.new_end)),
                    ..TaskPatch::default()
                },
            )?;
        }
        Ok(RollupSummary {
            task_count: tasks.len(),
            updates,
        })
    }

    pub fn health(&self) -> Result<Vec<TaskHealth>, EngineError> {
        self.health_at(Utc::now())
    }

    pub fn health_at(&self, now: DateTime<Utc>) -> Result<Vec<TaskHealth>, EngineError> {
        let tasks = self.repository.list(self.schedule_id)?;
        let entries = self.history.list(self.schedule_id)?;
        Ok(status::evaluate(&tasks, &entries, &self.calendar, now))
    }

    pub fn traffic_light(&self) -> Result<TrafficLight, EngineError> {
        self.traffic_light_at(Utc::now())
    }

    pub fn traffic_light_at(&self, now: DateTime<Utc>) -> Result<TrafficLight, EngineError> {
        let tasks = self.repository.list(self.schedule_id)?;
        let entries = self.history.list(self.schedule_id)?;
        let health = status::evaluate(&tasks, &entries, &self.calendar, now);
        Ok(traffic::aggregate(&tasks, &health, &self.calendar, now))
    }

    pub fn bulk_import(&mut self, rows: &[ImportRow]) -> Result<ImportReport, EngineError> {
        self.bulk_import_at(rows, Utc::now())
    }

    /// Two-pass spreadsheet reconciliation. Row-level problems accumulate in
    /// the report; an import that creates nothing is rejected wholesale with
    /// that list; repository failures abort.
    pub fn bulk_import_at(
        &mut self,
        rows: &[ImportRow],
        now: DateTime<Utc>,
    ) -> Result<ImportReport, EngineError> {
        let report = ImportReconciler::new(&mut self.repository, self.schedule_id, &self.calendar)
            .execute(rows, now)?;
        if report.created.is_empty() && !rows.is_empty() {
            return Err(EngineError::ImportRejected(report.row_errors));
        }
        Ok(report)
    }

    fn check_parent_assignment(
        &self,
        id: TaskId,
        new_parent: Option<TaskId>,
    ) -> Result<(), EngineError> {
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if parent == id {
            return Err(ValidationError::SelfParent(id).into());
        }
        let tasks = self.repository.list(self.schedule_id)?;
        if !tasks.iter().any(|task| task.id == id) {
            return Err(EngineError::NotFound(id));
        }
        if !tasks.iter().any(|task| task.id == parent) {
            return Err(ValidationError::UnknownParent(parent).into());
        }
        if would_create_cycle(&tasks, id, parent) {
            warn!(task = id, parent, "parent assignment rejected, would cycle");
            return Err(CyclicHierarchy { task_id: id }.into());
        }
        Ok(())
    }

    fn mark_summary(&mut self, parent: TaskId) -> Result<(), RepositoryError> {
        self.repository.update(
            parent,
            &TaskPatch {
                is_summary: Some(true),
                ..TaskPatch::default()
            },
        )
    }
}
