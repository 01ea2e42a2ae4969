use super::{RepositoryError, RepositoryResult, TaskRepository};
use crate::history::{ChangeHistoryEntry, ChangeHistoryLog};
use crate::task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch};
use std::collections::{BTreeMap, HashMap};

/// Map-backed repository for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: BTreeMap<TaskId, ScheduleTask>,
    next_id: TaskId,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn list(&self, schedule_id: ScheduleId) -> RepositoryResult<Vec<ScheduleTask>> {
        let mut tasks: Vec<ScheduleTask> = self
            .tasks
            .values()
            .filter(|task| task.schedule_id == schedule_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.order_index, task.id));
        Ok(tasks)
    }

    fn create(&mut self, schedule_id: ScheduleId, fields: NewTask) -> RepositoryResult<ScheduleTask> {
        self.next_id += 1;
        let task = ScheduleTask::from_new(self.next_id, schedule_id, fields);
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> RepositoryResult<()> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        patch.apply_to(task);
        Ok(())
    }

    fn delete(&mut self, id: TaskId) -> RepositoryResult<()> {
        self.tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }
}

/// Append-only change log held in memory. `record` stands in for the
/// external writer; the engine only ever reads through `ChangeHistoryLog`.
#[derive(Debug, Default)]
pub struct InMemoryChangeLog {
    entries: HashMap<ScheduleId, Vec<ChangeHistoryEntry>>,
}

impl InMemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, schedule_id: ScheduleId, entry: ChangeHistoryEntry) {
        self.entries.entry(schedule_id).or_default().push(entry);
    }
}

impl ChangeHistoryLog for InMemoryChangeLog {
    fn list(&self, schedule_id: ScheduleId) -> Result<Vec<ChangeHistoryEntry>, RepositoryError> {
        Ok(self.entries.get(&schedule_id).cloned().unwrap_or_default())
    }
}
