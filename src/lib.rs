pub mod calculations;
pub mod calendar;
pub mod history;
pub mod import;
pub mod persistence;
pub mod schedule;
pub mod task;
pub mod tree;
pub(crate) mod task_validation;

pub use calculations::rollup::{RollupSummary, RollupUpdate, recompute_rollups};
pub use calculations::status::{OverdueSeverity, RESCHEDULE_LIMIT, TaskHealth};
pub use calculations::traffic::{LATE_DAYS_LIMIT, LightColor, OVERDUE_SHARE_LIMIT, TrafficLight};
pub use calendar::{BUSINESS_DAY_HOURS, BusinessCalendar};
pub use history::{ChangeHistoryEntry, ChangeHistoryLog, FIELD_END_AT};
pub use import::{
    ImportFileError, ImportReconciler, ImportReport, ImportRow, ImportRowError,
    load_import_rows_from_csv, normalize_status,
};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStore;
pub use persistence::{
    InMemoryChangeLog, InMemoryTaskRepository, RepositoryError, TaskRepository,
};
pub use schedule::{EngineError, ScheduleEngine};
pub use task::{NewTask, ScheduleId, ScheduleTask, TaskId, TaskPatch, TaskStatus};
pub use task_validation::ValidationError;
pub use tree::{CyclicHierarchy, TaskForest, TreeBuilder, would_create_cycle};
