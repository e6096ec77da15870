//! Execution engine: runs a decomposed task against an assembled team
//! under one of four topologies, with per-subtask timeout, retry, and
//! result aggregation.

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::task::{SubTask, Task};
use crate::team::{AgentTeam, TeamMember};

/// Status of a subtask result or an overall execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Execution topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
    Hierarchical,
    Pipeline,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Hierarchical => "hierarchical",
            ExecutionMode::Pipeline => "pipeline",
        };
        write!(f, "{s}")
    }
}

/// Outcome of one subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskResult {
    pub subtask_id: Uuid,
    pub status: ExecutionStatus,
    pub agent_id: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

/// Aggregated view over a set of subtask results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_subtasks: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub outputs: Vec<String>,
    pub errors: Vec<String>,
}

/// Full record of one task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub task_id: Uuid,
    pub status: ExecutionStatus,
    pub mode: ExecutionMode,
    pub subtask_results: Vec<SubTaskResult>,
    pub summary: Option<ExecutionSummary>,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Boxed future returned by an agent handler. Ok is the subtask output,
/// Err a failure message.
pub type HandlerFuture = BoxFuture<'static, Result<String, String>>;

/// Handler invoked with the subtask being executed.
pub type AgentHandler = Arc<dyn Fn(SubTask) -> HandlerFuture + Send + Sync>;

/// Fallback handler invoked with the subtask and the executing agent's
/// name when no per-agent handler is registered.
pub type DefaultHandler = Arc<dyn Fn(SubTask, String) -> HandlerFuture + Send + Sync>;

/// Runs subtasks against team members.
pub struct AgentExecutor {
    team: AgentTeam,
    mode: ExecutionMode,
    timeout: Duration,
    retry_on_failure: bool,
    max_retries: u32,
    handlers: HashMap<String, AgentHandler>,
    default_handler: Option<DefaultHandler>,
}

impl AgentExecutor {
    pub fn new(team: AgentTeam) -> Self {
        Self {
            team,
            mode: ExecutionMode::Sequential,
            timeout: Duration::from_secs(300),
            retry_on_failure: true,
            max_retries: 2,
            handlers: HashMap::new(),
            default_handler: None,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry_on_failure: bool, max_retries: u32) -> Self {
        self.retry_on_failure = retry_on_failure;
        self.max_retries = max_retries;
        self
    }

    /// Register a handler for one agent id.
    pub fn register_handler(&mut self, agent_id: impl Into<String>, handler: AgentHandler) {
        self.handlers.insert(agent_id.into(), handler);
    }

    /// Register the fallback handler used when an agent has no handler
    /// of its own.
    pub fn register_default_handler(&mut self, handler: DefaultHandler) {
        self.default_handler = Some(handler);
    }

    pub fn team(&self) -> &AgentTeam {
        &self.team
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Execute the task's subtasks under the configured topology.
    ///
    /// A task with no subtasks executes to zero results and a zeroed
    /// summary; decomposition is the analyzer's business, not the
    /// engine's.
    pub async fn execute(&self, task: &mut Task) -> TaskExecution {
        let started = Instant::now();
        let started_at = Utc::now();

        let results = match self.mode {
            ExecutionMode::Sequential => self.run_sequential(&task.subtasks).await,
            ExecutionMode::Parallel => self.run_parallel(&task.subtasks).await,
            ExecutionMode::Hierarchical => self.run_hierarchical(&task.subtasks).await,
            ExecutionMode::Pipeline => self.run_pipeline(task).await,
        };

        let summary = aggregate(&results);
        let status = if summary.failed == 0 {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        for result in &results {
            if let Some(subtask) = task.subtasks.iter_mut().find(|s| s.id == result.subtask_id) {
                subtask.assigned_agent_id = Some(result.agent_id.clone());
            }
        }
        task.status = match status {
            ExecutionStatus::Completed => crate::task::TaskStatus::Completed,
            _ => crate::task::TaskStatus::Failed,
        };

        TaskExecution {
            task_id: task.id,
            status,
            mode: self.mode,
            subtask_results: results,
            errors: summary.errors.clone(),
            summary: Some(summary),
            started_at,
            completed_at: Some(Utc::now()),
            duration_ms: Some(started.elapsed().as_millis() as u64),
            metadata: HashMap::new(),
        }
    }

    /// Run subtasks one at a time, in order. Without retry, the first
    /// failure stops execution early; unattempted subtasks get no result.
    async fn run_sequential(&self, subtasks: &[SubTask]) -> Vec<SubTaskResult> {
        let mut results = Vec::with_capacity(subtasks.len());
        for subtask in subtasks {
            let result = self.dispatch(subtask).await;
            let failed = result.status == ExecutionStatus::Failed;
            results.push(result);
            if failed && !self.retry_on_failure {
                break;
            }
        }
        results
    }

    /// Run all subtasks concurrently. A panicking handler fails its own
    /// subtask without taking down the rest.
    async fn run_parallel(&self, subtasks: &[SubTask]) -> Vec<SubTaskResult> {
        let futures = subtasks
            .iter()
            .map(|subtask| AssertUnwindSafe(self.dispatch(subtask)).catch_unwind());
        join_all(futures)
            .await
            .into_iter()
            .zip(subtasks)
            .map(|(outcome, subtask)| match outcome {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("handler panicked for subtask {}", subtask.id);
                    failed_result(subtask, "none", "handler panicked")
                }
            })
            .collect()
    }

    /// The leader delegates: each subtask goes to the member with the
    /// highest capability overlap, falling back to the leader itself.
    /// Without a leader this degrades to sequential execution.
    async fn run_hierarchical(&self, subtasks: &[SubTask]) -> Vec<SubTaskResult> {
        let Some(leader) = self.team.leader().cloned() else {
            return self.run_sequential(subtasks).await;
        };
        let mut results = Vec::with_capacity(subtasks.len());
        for subtask in subtasks {
            let delegate = self
                .find_best_agent(subtask)
                .cloned()
                .unwrap_or_else(|| leader.clone());
            results.push(self.execute_with_agent(subtask, &delegate).await);
        }
        results
    }

    /// Run subtasks in order, feeding each one the accumulated outputs
    /// of its predecessors through metadata. Stops on the first failure;
    /// later stages get no result.
    async fn run_pipeline(&self, task: &mut Task) -> Vec<SubTaskResult> {
        let mut results = Vec::with_capacity(task.subtasks.len());
        let mut previous_outputs: Vec<String> = Vec::new();
        for index in 0..task.subtasks.len() {
            {
                let subtask = &mut task.subtasks[index];
                subtask.metadata.insert(
                    "pipeline_context".into(),
                    serde_json::Value::String(previous_outputs.join("\n")),
                );
                subtask.metadata.insert(
                    "previous_results".into(),
                    serde_json::json!(previous_outputs),
                );
            }
            let result = self.dispatch(&task.subtasks[index]).await;
            let failed = result.status == ExecutionStatus::Failed;
            if let Some(output) = &result.output {
                previous_outputs.push(output.clone());
            }
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }

    /// Pick an agent for the subtask and run it, retrying on failure up
    /// to the configured limit.
    async fn dispatch(&self, subtask: &SubTask) -> SubTaskResult {
        let Some(member) = self.find_best_agent(subtask) else {
            return failed_result(subtask, "none", &ExecutionError::NoSuitableAgent.to_string());
        };
        let member = member.clone();

        let mut result = self.execute_with_agent(subtask, &member).await;
        if self.retry_on_failure {
            let mut attempts = 0;
            while result.status == ExecutionStatus::Failed && attempts < self.max_retries {
                attempts += 1;
                log::debug!(
                    "retrying subtask {} (attempt {attempts}/{})",
                    subtask.id,
                    self.max_retries
                );
                result = self.execute_with_agent(subtask, &member).await;
            }
        }
        result
    }

    /// Run one subtask with one agent, bounded by the timeout.
    async fn execute_with_agent(&self, subtask: &SubTask, member: &TeamMember) -> SubTaskResult {
        let agent_id = member.capability.agent_id.clone();
        let agent_name = member.capability.agent_name.clone();
        let started = Instant::now();
        let started_at = Utc::now();

        let future: HandlerFuture = if let Some(handler) = self.handlers.get(&agent_id) {
            handler(subtask.clone())
        } else if let Some(default) = &self.default_handler {
            default(subtask.clone(), agent_name.clone())
        } else {
            let description = subtask.description.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(format!("[{agent_name}] executed: {description}"))
            }
            .boxed()
        };

        let outcome = tokio::time::timeout(self.timeout, future).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (status, output, error) = match outcome {
            Ok(Ok(output)) => {
                let output = if output.is_empty() { None } else { Some(output) };
                (ExecutionStatus::Completed, output, None)
            }
            Ok(Err(message)) => (
                ExecutionStatus::Failed,
                None,
                Some(ExecutionError::Handler { message }.to_string()),
            ),
            Err(_) => {
                let seconds = self.timeout.as_secs_f64();
                (
                    ExecutionStatus::Failed,
                    None,
                    Some(ExecutionError::Timeout { seconds }.to_string()),
                )
            }
        };

        SubTaskResult {
            subtask_id: subtask.id,
            status,
            agent_id,
            output,
            error,
            started_at,
            completed_at: Some(Utc::now()),
            duration_ms: Some(duration_ms),
        }
    }

    /// Member whose capability tags overlap the subtask's the most.
    /// Ties keep the earlier member. A subtask with no required tags
    /// goes to the first member; a tagged subtask no member overlaps
    /// yields no candidate.
    fn find_best_agent(&self, subtask: &SubTask) -> Option<&TeamMember> {
        if subtask.required_capabilities.is_empty() {
            return self.team.members.first();
        }
        let mut best: Option<(&TeamMember, usize)> = None;
        for member in &self.team.members {
            let overlap = member
                .capability
                .capabilities
                .iter()
                .filter(|tag| subtask.required_capabilities.contains(tag))
                .count();
            if overlap > 0 && best.map_or(true, |(_, n)| overlap > n) {
                best = Some((member, overlap));
            }
        }
        best.map(|(member, _)| member)
    }
}

fn failed_result(subtask: &SubTask, agent_id: &str, error: &str) -> SubTaskResult {
    let now = Utc::now();
    SubTaskResult {
        subtask_id: subtask.id,
        status: ExecutionStatus::Failed,
        agent_id: agent_id.to_string(),
        output: None,
        error: Some(error.to_string()),
        started_at: now,
        completed_at: Some(now),
        duration_ms: Some(0),
    }
}

/// Runs a series of tasks against one executor and keeps their
/// execution records by task id.
pub struct ExecutionContext {
    executor: AgentExecutor,
    executions: HashMap<Uuid, TaskExecution>,
}

/// Counts over an execution context's recorded runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSummary {
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
}

impl ExecutionContext {
    pub fn new(executor: AgentExecutor) -> Self {
        Self {
            executor,
            executions: HashMap::new(),
        }
    }

    /// Execute a task and record its outcome, replacing any earlier run
    /// of the same task.
    pub async fn run(&mut self, task: &mut Task) -> TaskExecution {
        let execution = self.executor.execute(task).await;
        self.executions.insert(task.id, execution.clone());
        execution
    }

    pub fn execution(&self, task_id: Uuid) -> Option<&TaskExecution> {
        self.executions.get(&task_id)
    }

    pub fn summary(&self) -> ContextSummary {
        let completed = self
            .executions
            .values()
            .filter(|e| e.status == ExecutionStatus::Completed)
            .count();
        ContextSummary {
            total_tasks: self.executions.len(),
            completed,
            failed: self.executions.len() - completed,
        }
    }
}

/// Fold subtask results into a summary. An empty slice yields a zeroed
/// summary with a success rate of 0.0.
pub fn aggregate(results: &[SubTaskResult]) -> ExecutionSummary {
    let successful = results
        .iter()
        .filter(|r| r.status == ExecutionStatus::Completed)
        .count();
    let failed = results
        .iter()
        .filter(|r| r.status == ExecutionStatus::Failed)
        .count();
    let success_rate = if results.is_empty() {
        0.0
    } else {
        successful as f64 / results.len() as f64
    };
    ExecutionSummary {
        total_subtasks: results.len(),
        successful,
        failed,
        success_rate,
        outputs: results.iter().filter_map(|r| r.output.clone()).collect(),
        errors: results
            .iter()
            .filter(|r| r.status == ExecutionStatus::Failed)
            .filter_map(|r| r.error.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::AgentCapability;
    use crate::team::{AgentRole, AgentTeam, TeamKind, TeamMember};
    use parking_lot::Mutex;

    fn member(agent_id: &str, caps: &[&str], role: AgentRole) -> TeamMember {
        let capability = AgentCapability::new(agent_id, agent_id, "test agent")
            .with_capabilities(caps.iter().map(|c| c.to_string()).collect());
        let mut m = TeamMember::new(capability, 0.9);
        m.role = role;
        m
    }

    fn team_of(members: Vec<TeamMember>) -> AgentTeam {
        let mut team = AgentTeam::new("test-team", TeamKind::Ephemeral);
        for m in members {
            team.add_member(m);
        }
        team
    }

    fn two_subtask_task() -> Task {
        let mut task = Task::new("build and verify");
        task.add_subtask(SubTask::new("collect input").with_capabilities(vec!["research".into()]));
        task.add_subtask(SubTask::new("write report").with_capabilities(vec!["writing".into()]));
        task
    }

    #[tokio::test]
    async fn test_sequential_runs_in_order_and_succeeds() {
        let team = team_of(vec![member("a", &["research", "writing"], AgentRole::Leader)]);
        let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        let mut executor = AgentExecutor::new(team);
        executor.register_handler(
            "a",
            Arc::new(move |subtask: SubTask| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(subtask.description.clone());
                    Ok(format!("done: {}", subtask.description))
                }
                .boxed()
            }),
        );

        let mut task = two_subtask_task();
        let execution = executor.execute(&mut task).await;

        assert_eq!(execution.status, ExecutionStatus::Completed);
        let summary = execution.summary.unwrap();
        assert_eq!(summary.total_subtasks, 2);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(*order.lock(), vec!["collect input", "write report"]);
        assert_eq!(task.status, crate::task::TaskStatus::Completed);
        assert!(task.subtasks.iter().all(|s| s.assigned_agent_id.is_some()));
    }

    #[tokio::test]
    async fn test_sequential_without_retry_stops_early() {
        let team = team_of(vec![member("a", &["research", "writing"], AgentRole::Leader)]);
        let mut executor = AgentExecutor::new(team).with_retry(false, 0);
        executor.register_handler(
            "a",
            Arc::new(|subtask: SubTask| {
                async move {
                    if subtask.description.contains("collect") {
                        Err("upstream unavailable".to_string())
                    } else {
                        Ok("ok".to_string())
                    }
                }
                .boxed()
            }),
        );

        let mut task = two_subtask_task();
        let execution = executor.execute(&mut task).await;

        assert_eq!(execution.status, ExecutionStatus::Failed);
        // The unattempted second subtask has no result at all.
        assert_eq!(execution.subtask_results.len(), 1);
        assert_eq!(execution.subtask_results[0].status, ExecutionStatus::Failed);
        let summary = execution.summary.unwrap();
        assert_eq!(summary.total_subtasks, 1);
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, vec!["upstream unavailable".to_string()]);
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = attempts.clone();
        let mut executor = AgentExecutor::new(team).with_retry(true, 2);
        executor.register_handler(
            "a",
            Arc::new(move |_subtask: SubTask| {
                let counter = counter.clone();
                async move {
                    let mut n = counter.lock();
                    *n += 1;
                    if *n < 2 {
                        Err("flaky".to_string())
                    } else {
                        Ok("recovered".to_string())
                    }
                }
                .boxed()
            }),
        );

        let mut task = Task::new("one flaky job");
        task.add_subtask(SubTask::new("flaky step"));
        let execution = executor.execute(&mut task).await;
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(*attempts.lock(), 2);
    }

    #[tokio::test]
    async fn test_parallel_isolates_failures_and_panics() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let mut executor = AgentExecutor::new(team)
            .with_mode(ExecutionMode::Parallel)
            .with_retry(false, 0);
        executor.register_handler(
            "a",
            Arc::new(|subtask: SubTask| {
                async move {
                    match subtask.description.as_str() {
                        "boom" => panic!("handler exploded"),
                        "fail" => Err("deliberate".to_string()),
                        other => Ok(format!("ok: {other}")),
                    }
                }
                .boxed()
            }),
        );

        let mut task = Task::new("mixed batch");
        task.add_subtask(SubTask::new("fine"));
        task.add_subtask(SubTask::new("fail"));
        task.add_subtask(SubTask::new("boom"));

        let execution = executor.execute(&mut task).await;
        let summary = execution.summary.unwrap();
        assert_eq!(summary.total_subtasks, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(
            execution.subtask_results[2].error.as_deref(),
            Some("handler panicked")
        );
    }

    #[tokio::test]
    async fn test_timeout_fails_the_subtask() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let mut executor = AgentExecutor::new(team)
            .with_timeout(Duration::from_millis(20))
            .with_retry(false, 0);
        executor.register_handler(
            "a",
            Arc::new(|_subtask: SubTask| {
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok("too late".to_string())
                }
                .boxed()
            }),
        );

        let started = Instant::now();
        let mut task = Task::new("slow job");
        task.add_subtask(SubTask::new("slow step"));
        let execution = executor.execute(&mut task).await;

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(execution.status, ExecutionStatus::Failed);
        let error = execution.subtask_results[0].error.clone().unwrap();
        assert!(error.starts_with("Timeout after"), "got: {error}");
    }

    #[tokio::test]
    async fn test_pipeline_threads_context_and_stops_on_failure() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let mut executor = AgentExecutor::new(team)
            .with_mode(ExecutionMode::Pipeline)
            .with_retry(false, 0);
        executor.register_handler(
            "a",
            Arc::new(|subtask: SubTask| {
                async move {
                    if subtask.description == "break" {
                        Err("pipeline burst".to_string())
                    } else {
                        Ok(format!("stage {}", subtask.description))
                    }
                }
                .boxed()
            }),
        );

        let mut task = Task::new("staged work");
        task.add_subtask(SubTask::new("one"));
        task.add_subtask(SubTask::new("two"));
        task.add_subtask(SubTask::new("break"));
        task.add_subtask(SubTask::new("never"));

        let execution = executor.execute(&mut task).await;

        // Stage two saw stage one's output.
        let context = task.subtasks[1]
            .metadata
            .get("pipeline_context")
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(context, "stage one");
        let previous = task.subtasks[2]
            .metadata
            .get("previous_results")
            .and_then(|v| v.as_array())
            .unwrap();
        assert_eq!(previous.len(), 2);

        // The stage after the failure was never attempted and has no
        // result; the aggregate counts only what actually ran.
        assert_eq!(execution.subtask_results.len(), 3);
        let summary = execution.summary.unwrap();
        assert_eq!(summary.total_subtasks, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.errors, vec!["pipeline burst".to_string()]);
    }

    #[tokio::test]
    async fn test_hierarchical_delegates_by_capability_overlap() {
        let team = team_of(vec![
            member("lead", &["coordination"], AgentRole::Leader),
            member("writer", &["writing"], AgentRole::Specialist),
            member("analyst", &["research"], AgentRole::Specialist),
        ]);
        let executor = AgentExecutor::new(team).with_mode(ExecutionMode::Hierarchical);

        let mut task = two_subtask_task();
        task.add_subtask(SubTask::new("sign off").with_capabilities(vec!["negotiation".into()]));
        let execution = executor.execute(&mut task).await;

        assert_eq!(execution.subtask_results[0].agent_id, "analyst");
        assert_eq!(execution.subtask_results[1].agent_id, "writer");
        // Nobody covers the third subtask, so the leader takes it.
        assert_eq!(execution.subtask_results[2].agent_id, "lead");
        // Simulated outputs carry the agent name.
        let output = execution.subtask_results[0].output.clone().unwrap();
        assert_eq!(output, "[analyst] executed: collect input");
    }

    #[tokio::test]
    async fn test_empty_team_yields_no_suitable_agent() {
        let executor = AgentExecutor::new(team_of(vec![])).with_retry(false, 0);
        let mut task = Task::new("orphan work");
        task.add_subtask(SubTask::new("orphan step"));
        let execution = executor.execute(&mut task).await;

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let result = &execution.subtask_results[0];
        assert_eq!(result.agent_id, "none");
        assert_eq!(result.error.as_deref(), Some("No suitable agent found"));
    }

    #[tokio::test]
    async fn test_unmatched_requirements_fail_dispatch() {
        // One member with tags {"x"} cannot cover a subtask requiring
        // {"z"}: dispatch must record the failure, not hand the work to
        // the first member anyway.
        let team = team_of(vec![member("only", &["x"], AgentRole::Leader)]);
        let executor = AgentExecutor::new(team).with_retry(false, 0);

        let mut task = Task::new("mismatched work");
        task.add_subtask(SubTask::new("needs z").with_capabilities(vec!["z".into()]));
        let execution = executor.execute(&mut task).await;

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let result = &execution.subtask_results[0];
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.agent_id, "none");
        assert_eq!(result.error.as_deref(), Some("No suitable agent found"));
        assert!(result.output.is_none());
    }

    #[tokio::test]
    async fn test_empty_task_executes_to_zero_results() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let executor = AgentExecutor::new(team);
        let mut task = Task::new("whole thing at once");
        let execution = executor.execute(&mut task).await;

        // The engine never invents subtasks on the caller's task.
        assert!(task.subtasks.is_empty());
        assert!(execution.subtask_results.is_empty());
        let summary = execution.summary.unwrap();
        assert_eq!(summary.total_subtasks, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(execution.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn test_execution_context_tracks_runs() {
        let team = team_of(vec![member("a", &[], AgentRole::Leader)]);
        let mut executor = AgentExecutor::new(team).with_retry(false, 0);
        executor.register_handler(
            "a",
            Arc::new(|subtask: SubTask| {
                async move {
                    if subtask.description == "bad" {
                        Err("no".to_string())
                    } else {
                        Ok("fine".to_string())
                    }
                }
                .boxed()
            }),
        );
        let mut context = ExecutionContext::new(executor);

        let mut good = Task::new("good");
        good.add_subtask(SubTask::new("good"));
        let mut bad = Task::new("bad");
        bad.add_subtask(SubTask::new("bad"));
        context.run(&mut good).await;
        context.run(&mut bad).await;

        let summary = context.summary();
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert!(context.execution(good.id).is_some());
        assert!(context.execution(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_aggregate_empty_results() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_subtasks, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.outputs.is_empty());
    }
}
