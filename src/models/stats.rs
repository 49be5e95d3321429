//! Read-side aggregates over a set of tasks.

use serde::{Deserialize, Serialize};

use super::{TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

/// Statistics over every task of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: i64,
    pub overdue_tasks: i64,
    pub tasks_by_status: Vec<StatusCount>,
    pub tasks_by_priority: Vec<PriorityCount>,
}

/// Statistics over the tasks of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: i64,
    pub overdue_tasks: i64,
    pub tasks_by_status: Vec<StatusCount>,
}

/// Percentage of `completed` in `total`, rounded half up; zero for an empty set.
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed * 200 + total) / (total * 2)
}

fn completed_count(by_status: &[StatusCount]) -> i64 {
    by_status
        .iter()
        .filter(|c| c.status == TaskStatus::Completed)
        .map(|c| c.count)
        .sum()
}

impl TaskStats {
    pub fn from_counts(
        mut by_status: Vec<StatusCount>,
        mut by_priority: Vec<PriorityCount>,
        overdue: i64,
    ) -> Self {
        by_status.sort_by_key(|c| c.status);
        by_priority.sort_by_key(|c| c.priority);

        let total: i64 = by_status.iter().map(|c| c.count).sum();
        let completed = completed_count(&by_status);

        Self {
            total_tasks: total,
            completed_tasks: completed,
            completion_rate: completion_rate(completed, total),
            overdue_tasks: overdue,
            tasks_by_status: by_status,
            tasks_by_priority: by_priority,
        }
    }
}

impl ProjectStats {
    pub fn from_counts(mut by_status: Vec<StatusCount>, overdue: i64) -> Self {
        by_status.sort_by_key(|c| c.status);

        let total: i64 = by_status.iter().map(|c| c.count).sum();
        let completed = completed_count(&by_status);

        Self {
            total_tasks: total,
            completed_tasks: completed,
            completion_rate: completion_rate(completed, total),
            overdue_tasks: overdue,
            tasks_by_status: by_status,
        }
    }
}
