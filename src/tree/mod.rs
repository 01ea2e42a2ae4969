use crate::task::{ScheduleTask, TaskId};
use std::collections::HashMap;
use std::fmt;

pub mod builder;

pub use builder::{TreeBuilder, would_create_cycle};

/// A parent assignment was, or would become, reachable from itself.
/// Rejected before any mutation; traversals never rely on depth limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicHierarchy {
    pub task_id: TaskId,
}

impl fmt::Display for CyclicHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} is part of a parent-reference cycle",
            self.task_id
        )
    }
}

impl std::error::Error for CyclicHierarchy {}

#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub task: ScheduleTask,
    pub children: Vec<TaskId>,
}

/// Arena-style forest over one schedule's tasks: an id → node map plus the
/// root list, children ordered by `order_index`.
#[derive(Debug, Clone, Default)]
pub struct TaskForest {
    pub(crate) nodes: HashMap<TaskId, TreeNode>,
    pub(crate) roots: Vec<TaskId>,
}

impl TaskForest {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn task(&self, id: TaskId) -> Option<&ScheduleTask> {
        self.nodes.get(&id).map(|node| &node.task)
    }

    pub fn children(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Structural parent signal; the `is_summary` flag is only advisory.
    pub fn has_children(&self, id: TaskId) -> bool {
        !self.children(id).is_empty()
    }

    /// Every task id with children first, ancestors after their descendants.
    pub fn post_order(&self) -> Vec<TaskId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(TaskId, bool)> =
            self.roots.iter().rev().map(|&id| (id, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.children(id).iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }
}
