//! Task and subtask model, plus the dependency-graph grouping used to
//! compute a valid parallel execution order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Task priority levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Critical => write!(f, "critical"),
        }
    }
}

/// Task status. Strictly forward-moving, except that `Failed` is reachable
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Analyzing,
    Decomposed,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Analyzing => write!(f, "analyzing"),
            TaskStatus::Decomposed => write!(f, "decomposed"),
            TaskStatus::Assigned => write!(f, "assigned"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A subtask derived from task analysis.
///
/// Structure is immutable after decomposition; only the assignment field
/// and the metadata map (used to pass pipeline context between execution
/// steps) are mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    /// Unique identifier.
    pub id: Uuid,
    /// Free-text description of what the subtask does.
    pub description: String,
    /// Required capability tags. Matching uses set semantics; order is
    /// irrelevant.
    pub required_capabilities: Vec<String>,
    /// Identifiers of other subtasks in the same task that must be
    /// scheduled first. Must not contain the subtask's own id.
    pub dependencies: Vec<Uuid>,
    /// Priority level.
    pub priority: TaskPriority,
    /// Estimated complexity, conventionally on a 1-10 scale (not clamped).
    pub estimated_complexity: f64,
    /// Decomposition confidence, 0-1 scale.
    pub confidence: f64,
    /// Agent this subtask is assigned to, set during assembly/execution.
    pub assigned_agent_id: Option<String>,
    /// Free-form metadata; carries pipeline context between steps.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SubTask {
    /// Create a new subtask with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            required_capabilities: Vec::new(),
            dependencies: Vec::new(),
            priority: TaskPriority::default(),
            estimated_complexity: 1.0,
            confidence: 1.0,
            assigned_agent_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the required capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    /// Add a dependency on another subtask.
    pub fn with_dependency(mut self, id: Uuid) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Set the decomposition confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the estimated complexity.
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.estimated_complexity = complexity;
        self
    }
}

/// A task to be executed by an assembled agent team.
///
/// Owned exclusively by the caller that created it; the graph grouping
/// below only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: Uuid,
    /// Free-text description.
    pub description: String,
    /// Optional additional context.
    pub context: Option<String>,
    /// Priority level.
    pub priority: TaskPriority,
    /// Current status.
    pub status: TaskStatus,
    /// Subtasks in insertion order (not execution order).
    pub subtasks: Vec<SubTask>,
    /// Aggregated required capability tags: union over description-level
    /// extraction and all subtask tags.
    pub required_capabilities: Vec<String>,
    /// Free-form constraints.
    pub constraints: HashMap<String, serde_json::Value>,
    /// Free-form metadata.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            context: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            subtasks: Vec::new(),
            required_capabilities: Vec::new(),
            constraints: HashMap::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the task context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set the task priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the aggregated required capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    /// Append a subtask.
    pub fn add_subtask(&mut self, subtask: SubTask) {
        self.subtasks.push(subtask);
        self.updated_at = Utc::now();
    }

    /// Group subtasks by execution order: each group can run concurrently,
    /// groups must execute in the returned order.
    ///
    /// Repeatedly selects all unscheduled subtasks whose dependencies are
    /// either absent from the task or already scheduled. When no subtask
    /// qualifies (dependency cycle), all remaining subtasks are scheduled
    /// as one final group instead of failing; this guarantees termination
    /// but signals a degenerate ordering, so a diagnostic is logged.
    ///
    /// Pure: has no side effects on the task.
    pub fn execution_order(&self) -> Vec<Vec<&SubTask>> {
        if self.subtasks.is_empty() {
            return Vec::new();
        }

        let mut remaining: HashSet<Uuid> = self.subtasks.iter().map(|s| s.id).collect();
        let mut groups = Vec::new();

        while !remaining.is_empty() {
            let mut ready: Vec<&SubTask> = self
                .subtasks
                .iter()
                .filter(|s| remaining.contains(&s.id))
                .filter(|s| s.dependencies.iter().all(|d| !remaining.contains(d)))
                .collect();

            if ready.is_empty() {
                // Dependency cycle: schedule everything left as one group.
                log::warn!(
                    "dependency cycle among {} subtasks of task {}; scheduling them as a single final group",
                    remaining.len(),
                    self.id
                );
                ready = self
                    .subtasks
                    .iter()
                    .filter(|s| remaining.contains(&s.id))
                    .collect();
            }

            for subtask in &ready {
                remaining.remove(&subtask.id);
            }
            groups.push(ready);
        }

        groups
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task(id={}, status={}, subtasks={})",
            self.id,
            self.status,
            self.subtasks.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_task_has_no_groups() {
        let task = Task::new("nothing to do");
        assert!(task.execution_order().is_empty());
    }

    #[test]
    fn test_independent_subtasks_form_one_group() {
        let mut task = Task::new("independent work");
        task.add_subtask(SubTask::new("a"));
        task.add_subtask(SubTask::new("b"));
        task.add_subtask(SubTask::new("c"));

        let groups = task.execution_order();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_chain_dependencies_are_layered() {
        let mut task = Task::new("chained work");
        let a = SubTask::new("a");
        let b = SubTask::new("b").with_dependency(a.id);
        let c = SubTask::new("c").with_dependency(b.id);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        task.add_subtask(a);
        task.add_subtask(b);
        task.add_subtask(c);

        let groups = task.execution_order();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0][0].id, a_id);
        assert_eq!(groups[1][0].id, b_id);
        assert_eq!(groups[2][0].id, c_id);
    }

    #[test]
    fn test_diamond_dependencies_flatten_once() {
        // a -> {b, c} -> d
        let mut task = Task::new("diamond");
        let a = SubTask::new("a");
        let b = SubTask::new("b").with_dependency(a.id);
        let c = SubTask::new("c").with_dependency(a.id);
        let d = SubTask::new("d").with_dependency(b.id).with_dependency(c.id);
        task.add_subtask(a);
        task.add_subtask(b);
        task.add_subtask(c);
        task.add_subtask(d);

        let groups = task.execution_order();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].len(), 2);

        // Every subtask appears exactly once, and never before its deps.
        let mut seen: HashSet<Uuid> = HashSet::new();
        for group in &groups {
            for subtask in group {
                assert!(seen.insert(subtask.id));
            }
            for subtask in group {
                for dep in &subtask.dependencies {
                    assert!(seen.contains(dep));
                }
            }
        }
        assert_eq!(seen.len(), task.subtasks.len());
    }

    #[test]
    fn test_cycle_collapses_into_final_group() {
        let mut task = Task::new("cyclic");
        let root = SubTask::new("root");
        let mut x = SubTask::new("x");
        let mut y = SubTask::new("y");
        y.dependencies.push(x.id);
        x.dependencies.push(y.id);
        task.add_subtask(root);
        task.add_subtask(x);
        task.add_subtask(y);

        let groups = task.execution_order();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        // The interdependent pair collapses into one terminal group.
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn test_dangling_dependency_counts_as_satisfied() {
        let mut task = Task::new("dangling");
        let ghost = Uuid::new_v4();
        task.add_subtask(SubTask::new("a").with_dependency(ghost));

        let groups = task.execution_order();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 1);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }
}
