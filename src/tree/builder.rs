use super::{CyclicHierarchy, TaskForest, TreeNode};
use crate::task::{ScheduleTask, TaskId};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

pub struct TreeBuilder<'a> {
    tasks: &'a [ScheduleTask],
}

impl<'a> TreeBuilder<'a> {
    pub fn new(tasks: &'a [ScheduleTask]) -> Self {
        Self { tasks }
    }

    /// Build the forest in one pass over the flat task list. A task whose
    /// `parent_id` resolves inside the set becomes that task's child; a null
    /// or unresolvable `parent_id` makes a root. Any task reachable from
    /// itself through `parent_id` is a hard error.
    pub fn build(&self) -> Result<TaskForest, CyclicHierarchy> {
        self.check_cycles()?;

        let ids: HashSet<TaskId> = self.tasks.iter().map(|task| task.id).collect();
        let mut nodes: HashMap<TaskId, TreeNode> = self
            .tasks
            .iter()
            .map(|task| {
                (
                    task.id,
                    TreeNode {
                        task: task.clone(),
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        let mut roots = Vec::new();
        for task in self.tasks {
            match task.parent_id.filter(|parent| ids.contains(parent)) {
                Some(parent) => {
                    if let Some(node) = nodes.get_mut(&parent) {
                        node.children.push(task.id);
                    }
                }
                None => roots.push(task.id),
            }
        }

        let rank: HashMap<TaskId, u32> = self
            .tasks
            .iter()
            .map(|task| (task.id, task.order_index))
            .collect();
        roots.sort_by_key(|id| rank.get(id).copied().unwrap_or(u32::MAX));
        for node in nodes.values_mut() {
            node.children
                .sort_by_key(|id| rank.get(id).copied().unwrap_or(u32::MAX));
        }

        Ok(TaskForest { nodes, roots })
    }

    fn check_cycles(&self) -> Result<(), CyclicHierarchy> {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::new();

        for task in self.tasks {
            let node_ix = graph.add_node(task.id);
            id_to_index.insert(task.id, node_ix);
        }
        for task in self.tasks {
            if let Some(parent) = task.parent_id {
                if let (Some(&child_ix), Some(&parent_ix)) =
                    (id_to_index.get(&task.id), id_to_index.get(&parent))
                {
                    graph.add_edge(child_ix, parent_ix, ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CyclicHierarchy {
                task_id: graph[cycle.node_id()],
            }),
        }
    }
}

/// Would assigning `new_parent` as the parent of `task_id` close a cycle?
/// Walks the ancestor chain iteratively; the visited set guards against
/// pre-existing cycles in the input.
pub fn would_create_cycle(tasks: &[ScheduleTask], task_id: TaskId, new_parent: TaskId) -> bool {
    if task_id == new_parent {
        return true;
    }
    let parents: HashMap<TaskId, Option<TaskId>> = tasks
        .iter()
        .map(|task| (task.id, task.parent_id))
        .collect();

    let mut visited = HashSet::new();
    let mut current = Some(new_parent);
    while let Some(ancestor) = current {
        if ancestor == task_id {
            return true;
        }
        if !visited.insert(ancestor) {
            return false;
        }
        current = parents.get(&ancestor).copied().flatten();
    }
    false
}
