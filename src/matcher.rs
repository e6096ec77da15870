//! Capability matching: pure scoring strategies that turn ranked search
//! hits into a bounded set of team members.
//!
//! Every strategy is deterministic for identical inputs (stable sorts,
//! stable iteration order) so team assembly stays reproducible.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::search::SearchHit;
use crate::task::Task;
use crate::team::TeamMember;

/// Strategy used to select team members from ranked candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Trust the external similarity ranking; filter, truncate, backfill.
    #[default]
    Similarity,
    /// Re-score candidates by similarity times a requirement-match weight.
    Weighted,
    /// Greedily cover the union of required tags.
    Greedy,
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStrategy::Similarity => write!(f, "similarity"),
            SelectionStrategy::Weighted => write!(f, "weighted"),
            SelectionStrategy::Greedy => write!(f, "greedy"),
        }
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" => Ok(SelectionStrategy::Similarity),
            "weighted" => Ok(SelectionStrategy::Weighted),
            "greedy" => Ok(SelectionStrategy::Greedy),
            other => Err(format!("unknown selection strategy: {other}")),
        }
    }
}

/// Bounds and thresholds applied by every strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Backfill is attempted until the team reaches this size.
    pub min_team_size: usize,
    /// Hard upper bound on team size.
    pub max_team_size: usize,
    /// Candidates scoring below this are filtered by the similarity
    /// strategy.
    pub min_similarity: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_team_size: 1,
            max_team_size: 10,
            min_similarity: 0.3,
        }
    }
}

/// Score multiplier applied when a candidate's tags intersect the task's
/// required tags under the weighted strategy.
const REQUIREMENT_MATCH_WEIGHT: f64 = 1.5;

/// Rank candidates against a task's requirements under the selected
/// strategy. Pure: no side effects on the task or the hits.
pub fn select_members(
    task: &Task,
    hits: &[SearchHit],
    strategy: SelectionStrategy,
    config: &MatcherConfig,
) -> Vec<TeamMember> {
    if hits.is_empty() {
        return Vec::new();
    }
    match strategy {
        SelectionStrategy::Similarity => select_by_similarity(hits, config),
        SelectionStrategy::Weighted => select_weighted(task, hits, config),
        SelectionStrategy::Greedy => select_greedy(task, hits, config),
    }
}

/// Candidates are assumed pre-ranked by similarity: drop anything below
/// the threshold, truncate to the maximum size, then backfill from the
/// remaining ranking until the minimum size is met.
fn select_by_similarity(hits: &[SearchHit], config: &MatcherConfig) -> Vec<TeamMember> {
    let mut members: Vec<TeamMember> = hits
        .iter()
        .filter(|h| h.score >= config.min_similarity)
        .take(config.max_team_size)
        .map(|h| TeamMember::new(h.capability.clone(), h.score))
        .collect();

    backfill(&mut members, hits, config.min_team_size);
    members.truncate(config.max_team_size);
    members
}

/// Recompute each score as `similarity x weight`, where the weight is
/// boosted when the candidate's tags intersect the task's required tags.
/// Category relevance is an extension point, currently a no-op.
fn select_weighted(task: &Task, hits: &[SearchHit], config: &MatcherConfig) -> Vec<TeamMember> {
    let required: HashSet<&str> = task
        .required_capabilities
        .iter()
        .map(String::as_str)
        .collect();

    let mut weighted: Vec<(&SearchHit, f64)> = hits
        .iter()
        .map(|hit| {
            let mut weight = 1.0;
            if hit
                .capability
                .capabilities
                .iter()
                .any(|c| required.contains(c.as_str()))
            {
                weight *= REQUIREMENT_MATCH_WEIGHT;
            }
            // Category relevance weighting: extension point, no-op.
            weight *= 1.0;
            (hit, hit.score * weight)
        })
        .collect();

    // Stable sort keeps the original ranking for equal weighted scores.
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut members = Vec::new();
    let mut selected: HashSet<&str> = HashSet::new();
    for (hit, score) in weighted {
        if members.len() >= config.max_team_size {
            break;
        }
        if selected.insert(hit.capability.agent_id.as_str()) {
            members.push(TeamMember::new(hit.capability.clone(), score));
        }
    }
    members
}

/// Iterate candidates in their given order, accepting only those whose
/// tags intersect the still-uncovered union of required tags across the
/// task and its subtasks; backfill without regard to coverage if the
/// result is below the minimum size.
fn select_greedy(task: &Task, hits: &[SearchHit], config: &MatcherConfig) -> Vec<TeamMember> {
    let mut uncovered: HashSet<String> = task.required_capabilities.iter().cloned().collect();
    for subtask in &task.subtasks {
        uncovered.extend(subtask.required_capabilities.iter().cloned());
    }

    let mut members = Vec::new();
    for hit in hits {
        if members.len() >= config.max_team_size {
            break;
        }
        if hit
            .capability
            .capabilities
            .iter()
            .any(|c| uncovered.contains(c))
        {
            for tag in &hit.capability.capabilities {
                uncovered.remove(tag);
            }
            members.push(TeamMember::new(hit.capability.clone(), hit.score));
        }
    }

    backfill(&mut members, hits, config.min_team_size);
    members
}

/// Append unselected candidates from the original ranking until the
/// minimum team size is met or candidates are exhausted.
fn backfill(members: &mut Vec<TeamMember>, hits: &[SearchHit], min_team_size: usize) {
    if members.len() >= min_team_size {
        return;
    }
    let mut selected: HashSet<String> = members
        .iter()
        .map(|m| m.capability.agent_id.clone())
        .collect();
    for hit in hits {
        if members.len() >= min_team_size {
            break;
        }
        if selected.insert(hit.capability.agent_id.clone()) {
            members.push(TeamMember::new(hit.capability.clone(), hit.score));
        }
    }
}
