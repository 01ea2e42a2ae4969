use crate::task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch};
use serde_json::Error as SerdeJsonError;
use std::fmt;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound(TaskId),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Serialization(SerdeJsonError),
    InvalidData(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::NotFound(id) => write!(f, "task {id} not found"),
            #[cfg(feature = "sqlite")]
            RepositoryError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            RepositoryError::Serialization(err) => write!(f, "serialization error: {err}"),
            RepositoryError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for RepositoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<SerdeJsonError> for RepositoryError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence contract consumed by the engine. Implementations report
/// missing ids as `RepositoryError::NotFound` instead of no-op-ing, and
/// return `list` ordered by `order_index`.
pub trait TaskRepository {
    fn list(&self, schedule_id: ScheduleId) -> RepositoryResult<Vec<ScheduleTask>>;
    fn create(&mut self, schedule_id: ScheduleId, fields: NewTask) -> RepositoryResult<ScheduleTask>;
    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> RepositoryResult<()>;
    fn delete(&mut self, id: TaskId) -> RepositoryResult<()>;
}

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{InMemoryChangeLog, InMemoryTaskRepository};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
