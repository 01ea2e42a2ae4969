use crate::task::{ScheduleTask, TaskId};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    SelfParent(TaskId),
    UnknownParent(TaskId),
    MalformedExternalId(String),
    NegativeDuration(i64),
    DuplicateId(TaskId),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "task name must not be empty"),
            ValidationError::SelfParent(id) => {
                write!(f, "task {id} cannot be its own parent")
            }
            ValidationError::UnknownParent(id) => {
                write!(f, "referenced parent task {id} does not exist")
            }
            ValidationError::MalformedExternalId(raw) => {
                write!(f, "malformed external id '{raw}'")
            }
            ValidationError::NegativeDuration(days) => {
                write!(f, "duration must not be negative (got {days})")
            }
            ValidationError::DuplicateId(id) => write!(f, "duplicate task id {id}"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

pub fn validate_task(task: &ScheduleTask) -> Result<(), ValidationError> {
    validate_name(&task.name)?;
    if task.parent_id == Some(task.id) {
        return Err(ValidationError::SelfParent(task.id));
    }
    if let Some(days) = task.duration_days {
        if days < 0 {
            return Err(ValidationError::NegativeDuration(days));
        }
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[ScheduleTask]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(ValidationError::DuplicateId(task.id));
        }
        validate_task(task)?;
    }
    Ok(())
}
