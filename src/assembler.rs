//! Team assembly: search for candidates, select members through the
//! matcher, and assign roles.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::matcher::{select_members, MatcherConfig, SelectionStrategy};
use crate::registry::CapabilityRegistry;
use crate::search::{SearchHit, SearchProvider};
use crate::task::Task;
use crate::team::{AgentRole, TeamMember};

/// Similarity score reported for candidates found through the registry
/// text-search fallback.
const FALLBACK_SCORE: f64 = 1.0;

/// Configuration for team assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblerConfig {
    /// Minimum acceptable team size; underflow is reported as an
    /// undersized member list, never as an error.
    pub min_team_size: usize,
    /// Maximum team size.
    pub max_team_size: usize,
    /// Preferred team size; twice this many candidates are requested
    /// from search to leave room for selection.
    pub optimal_team_size: usize,
    /// Member-selection strategy.
    pub strategy: SelectionStrategy,
    /// Whether to assign roles after selection.
    pub enable_role_assignment: bool,
    /// Similarity floor passed to the search provider and the matcher.
    pub min_similarity: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            min_team_size: 1,
            max_team_size: 10,
            optimal_team_size: 3,
            strategy: SelectionStrategy::default(),
            enable_role_assignment: true,
            min_similarity: 0.3,
        }
    }
}

/// Assembles agent teams for tasks.
///
/// Uses the external search provider when one is configured and
/// initialized, otherwise falls back to substring search over the local
/// capability registry.
pub struct TeamAssembler {
    search: Option<Arc<dyn SearchProvider>>,
    registry: Arc<RwLock<CapabilityRegistry>>,
    config: AssemblerConfig,
}

impl TeamAssembler {
    /// Create an assembler over the given registry.
    pub fn new(registry: Arc<RwLock<CapabilityRegistry>>, config: AssemblerConfig) -> Self {
        Self {
            search: None,
            registry,
            config,
        }
    }

    /// Attach an external search provider.
    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    /// Assembly configuration.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble a team for the task: search, select, assign roles.
    ///
    /// An empty or undersized result means assembly underflow; the
    /// caller decides whether to proceed.
    pub async fn assemble(&self, task: &Task) -> Vec<TeamMember> {
        let top_k = self.config.optimal_team_size * 2;
        let hits = self.search_candidates(task, top_k).await;
        if hits.is_empty() {
            log::debug!("no candidates found for task {}", task.id);
            return Vec::new();
        }

        let matcher_config = MatcherConfig {
            min_team_size: self.config.min_team_size,
            max_team_size: self.config.max_team_size,
            min_similarity: self.config.min_similarity,
        };
        let members = select_members(task, &hits, self.config.strategy, &matcher_config);

        if self.config.enable_role_assignment {
            assign_roles(members)
        } else {
            members
        }
    }

    /// Query the search provider, or fall back to the registry when the
    /// provider is missing, uninitialized, or failing.
    ///
    /// The fallback scores by query-token overlap against each
    /// capability's search text rather than requiring the whole query
    /// string to appear as a substring; multi-word task queries would
    /// otherwise never match. All fallback hits carry a fixed score.
    async fn search_candidates(&self, task: &Task, top_k: usize) -> Vec<SearchHit> {
        let query = build_search_query(task);

        if let Some(provider) = &self.search {
            if provider.is_initialized() {
                match provider
                    .search(&query, top_k, self.config.min_similarity)
                    .await
                {
                    Ok(hits) => return hits,
                    Err(e) => {
                        log::warn!("search provider failed, using registry fallback: {e}");
                    }
                }
            }
        }

        // Token overlap against each capability's search text. Whole-query
        // substring matching would almost never hit for multi-word tasks.
        let query_lower = query.to_lowercase();
        let tokens: Vec<&str> = query_lower.split_whitespace().collect();
        let registry = self.registry.read();
        let mut scored: Vec<(usize, SearchHit)> = registry
            .list_active()
            .into_iter()
            .filter_map(|capability| {
                let text = capability.to_search_text().to_lowercase();
                let overlap = tokens.iter().filter(|t| text.contains(**t)).count();
                (overlap > 0).then(|| {
                    (
                        overlap,
                        SearchHit {
                            capability: capability.clone(),
                            score: FALLBACK_SCORE,
                            distance: 0.0,
                        },
                    )
                })
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);
        scored.into_iter().map(|(_, hit)| hit).collect()
    }
}

/// Build a search query from the task description, its required tags,
/// and every subtask's description and tags.
pub fn build_search_query(task: &Task) -> String {
    let mut parts = vec![task.description.clone()];
    parts.extend(task.required_capabilities.iter().cloned());
    for subtask in &task.subtasks {
        parts.push(subtask.description.clone());
        parts.extend(subtask.required_capabilities.iter().cloned());
    }
    parts.join(" ")
}

/// Assign roles as a pure function of the score-sorted member list.
///
/// One member becomes leader; two become leader and executor; with three
/// or more, the highest score leads, the second coordinates, the lowest
/// reviews, and everyone else stays a specialist. Idempotent: re-running
/// on an already-assigned list yields the same roles.
pub fn assign_roles(mut members: Vec<TeamMember>) -> Vec<TeamMember> {
    if members.is_empty() {
        return members;
    }

    members.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let last = members.len() - 1;
    for (i, member) in members.iter_mut().enumerate() {
        member.role = match i {
            0 => AgentRole::Leader,
            _ if i == last && last >= 2 => AgentRole::Reviewer,
            1 if last == 1 => AgentRole::Executor,
            1 => AgentRole::Coordinator,
            _ => AgentRole::Specialist,
        };
    }
    members
}

/// Assign every subtask to the member with the highest fractional
/// overlap between the member's capability tags and the subtask's
/// required tags. Ties break by encounter order; zero overlap leaves the
/// subtask unassigned.
pub fn reassign_subtasks(members: &mut [TeamMember], task: &Task) {
    for subtask in &task.subtasks {
        let required: HashSet<&str> = subtask
            .required_capabilities
            .iter()
            .map(String::as_str)
            .collect();
        if required.is_empty() {
            continue;
        }

        let mut best: Option<usize> = None;
        let mut best_overlap = 0.0;
        for (i, member) in members.iter().enumerate() {
            let matched = member
                .capability
                .capabilities
                .iter()
                .filter(|c| required.contains(c.as_str()))
                .count();
            if matched == 0 {
                continue;
            }
            let overlap = matched as f64 / required.len() as f64;
            if overlap > best_overlap {
                best_overlap = overlap;
                best = Some(i);
            }
        }

        if let Some(i) = best {
            members[i].assigned_subtasks.push(subtask.id);
        }
    }
}
