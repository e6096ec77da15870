//! Task analysis: capability extraction and task decomposition.
//!
//! The natural-language decomposition oracle is an external collaborator
//! consumed through the [`DecompositionProvider`] trait. When no provider
//! is configured, or the provider fails, deterministic fallbacks apply:
//! keyword-table capability extraction and a single-subtask decomposition
//! mirroring the parent task.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::error::AnalysisError;
use crate::task::{SubTask, Task, TaskStatus};

/// Contract for external natural-language task analysis.
#[async_trait]
pub trait DecompositionProvider: Send + Sync {
    /// Extract required capability tags from a task description.
    async fn extract_capabilities(&self, description: &str)
        -> Result<Vec<String>, AnalysisError>;

    /// Propose up to `max_subtasks` subtask candidates for the task, each
    /// carrying a confidence score.
    async fn decompose(
        &self,
        task: &Task,
        max_subtasks: usize,
    ) -> Result<Vec<SubTask>, AnalysisError>;
}

/// Capability name -> trigger keywords, matched case-insensitively as
/// substrings against the task description.
static CAPABILITY_KEYWORDS: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        ("code generation", vec!["code", "generate", "implement", "build", "create"]),
        ("data analysis", vec!["analyze", "data", "statistics", "insights", "metrics"]),
        ("research", vec!["research", "investigate", "find", "search", "explore"]),
        ("writing", vec!["write", "draft", "compose", "edit"]),
        ("translation", vec!["translate", "localize", "language"]),
        ("web scraping", vec!["scrape", "crawl", "extract", "web"]),
        ("api integration", vec!["api", "integrate", "connect", "endpoint"]),
        ("testing", vec!["test", "validate", "verify", "qa"]),
        ("debugging", vec!["debug", "fix", "troubleshoot", "error"]),
        ("optimization", vec!["optimize", "improve", "performance", "efficient"]),
        ("documentation", vec!["document", "docs", "specification"]),
        ("design", vec!["design", "ui", "ux", "interface", "visual"]),
        ("project management", vec!["manage", "plan", "coordinate", "organize"]),
    ]
});

/// Tag applied when no keyword matches the description.
pub const DEFAULT_CAPABILITY: &str = "general assistance";

/// Analyzes tasks: extracts required capabilities and decomposes them
/// into subtasks, filtering candidates by confidence.
pub struct TaskAnalyzer {
    provider: Option<Arc<dyn DecompositionProvider>>,
    /// Whether to decompose tasks into subtasks at all.
    pub enable_decomposition: bool,
    /// Maximum subtask candidates requested from the provider.
    pub max_subtasks: usize,
    /// Candidates below this confidence are rejected.
    pub confidence_threshold: f64,
}

impl Default for TaskAnalyzer {
    fn default() -> Self {
        Self {
            provider: None,
            enable_decomposition: true,
            max_subtasks: 10,
            confidence_threshold: 0.7,
        }
    }
}

impl TaskAnalyzer {
    /// Create an analyzer without an external provider; fallbacks only.
    pub fn new(enable_decomposition: bool, max_subtasks: usize, confidence_threshold: f64) -> Self {
        Self {
            provider: None,
            enable_decomposition,
            max_subtasks,
            confidence_threshold,
        }
    }

    /// Attach an external decomposition provider.
    pub fn with_provider(mut self, provider: Arc<dyn DecompositionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Analyze a task in place: extract required capabilities, decompose
    /// into confidence-filtered subtasks, and advance the status from
    /// `Pending` through `Analyzing` to `Decomposed`.
    pub async fn analyze(&self, task: &mut Task) {
        task.status = TaskStatus::Analyzing;

        task.required_capabilities = self.extract_capabilities(&task.description).await;

        if self.enable_decomposition {
            let candidates = self.decompose(task).await;
            task.subtasks = candidates
                .into_iter()
                .filter(|s| s.confidence >= self.confidence_threshold)
                .collect();

            // Aggregate: task-level tags are the union of the extracted
            // tags and every subtask's tags.
            for subtask in &task.subtasks {
                for tag in &subtask.required_capabilities {
                    if !task.required_capabilities.contains(tag) {
                        task.required_capabilities.push(tag.clone());
                    }
                }
            }
        }

        task.status = TaskStatus::Decomposed;
        task.updated_at = Utc::now();
    }

    /// Extract capability tags, falling back to the keyword table when
    /// the provider is absent or fails.
    async fn extract_capabilities(&self, description: &str) -> Vec<String> {
        if let Some(provider) = &self.provider {
            match provider.extract_capabilities(description).await {
                Ok(capabilities) if !capabilities.is_empty() => return capabilities,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("capability extraction provider failed: {e}");
                }
            }
        }
        keyword_extraction(description)
    }

    /// Decompose a task, falling back to a single subtask mirroring the
    /// parent when the provider is absent or fails.
    async fn decompose(&self, task: &Task) -> Vec<SubTask> {
        if let Some(provider) = &self.provider {
            match provider.decompose(task, self.max_subtasks).await {
                Ok(subtasks) => return subtasks,
                Err(e) => {
                    log::warn!("decomposition provider failed: {e}");
                }
            }
        }
        fallback_decomposition(task)
    }

    /// Confidence-weighted mean of subtask complexity; 5.0 when the task
    /// has no subtasks or zero total confidence.
    pub fn estimate_complexity(&self, task: &Task) -> f64 {
        if task.subtasks.is_empty() {
            return 5.0;
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for subtask in &task.subtasks {
            weighted_sum += subtask.estimated_complexity * subtask.confidence;
            total_weight += subtask.confidence;
        }

        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            5.0
        }
    }
}

/// Keyword-table capability extraction over a lowercased description.
pub fn keyword_extraction(description: &str) -> Vec<String> {
    let description_lower = description.to_lowercase();
    let mut capabilities: Vec<String> = CAPABILITY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| description_lower.contains(kw)))
        .map(|(name, _)| (*name).to_string())
        .collect();

    if capabilities.is_empty() {
        capabilities.push(DEFAULT_CAPABILITY.to_string());
    }
    capabilities
}

/// Deterministic fallback decomposition: one subtask mirroring the parent
/// task with confidence 0.5.
pub fn fallback_decomposition(task: &Task) -> Vec<SubTask> {
    vec![SubTask::new(task.description.clone())
        .with_capabilities(task.required_capabilities.clone())
        .with_complexity(5.0)
        .with_confidence(0.5)]
}
