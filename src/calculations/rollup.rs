use crate::task::{ScheduleTask, TaskId};
use crate::tree::{CyclicHierarchy, TreeBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One parent end-date raise produced by a rollup pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupUpdate {
    pub task_id: TaskId,
    pub previous_end: Option<DateTime<Utc>>,
    pub new_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupSummary {
    pub task_count: usize,
    pub updates: Vec<RollupUpdate>,
}

impl RollupSummary {
    pub fn updated_count(&self) -> usize {
        self.updates.len()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("raised={}", self.updates.len()));
        if let Some(latest) = self.updates.iter().map(|u| u.new_end).max() {
            parts.push(format!("latest_end={}", latest.format("%Y-%m-%d")));
        }
        parts.join(", ")
    }
}

/// Recompute summary end dates from a snapshot of one schedule's tasks.
///
/// Children are processed before their ancestors, so one pass reaches the
/// fixed point: each parent with descendants is raised to the maximum end
/// date over its entire subtree. The raise is monotonic — a parent whose
/// stored end already sits at or past the descendant maximum keeps its own
/// value, and parents without descendants are never touched.
///
/// Returns the raises to persist; the caller applies them through the
/// repository after its mutation batch.
pub fn recompute_rollups(tasks: &[ScheduleTask]) -> Result<Vec<RollupUpdate>, CyclicHierarchy> {
    let forest = TreeBuilder::new(tasks).build()?;
    let mut effective: HashMap<TaskId, Option<DateTime<Utc>>> =
        tasks.iter().map(|task| (task.id, task.end_at)).collect();

    let mut updates = Vec::new();
    for id in forest.post_order() {
        let children = forest.children(id);
        if children.is_empty() {
            continue;
        }
        let candidate = children
            .iter()
            .filter_map(|child| effective.get(child).copied().flatten())
            .max();
        let Some(candidate) = candidate else {
            continue;
        };
        let current = effective.get(&id).copied().flatten();
        if current.is_none_or(|cur| candidate > cur) {
            updates.push(RollupUpdate {
                task_id: id,
                previous_end: current,
                new_end: candidate,
            });
            effective.insert(id, Some(candidate));
        }
    }

    debug!(
        tasks = tasks.len(),
        raised = updates.len(),
        "rollup pass converged"
    );
    Ok(updates)
}
