//! Team lifecycle management: the active-team registry and the
//! time-bounded reuse cache for persistent and hybrid teams.
//!
//! The active set and the cache are shared mutable state across
//! potentially concurrent task executions; one mutex per manager
//! serializes all mutations (assembly and dissolution are rare and cheap
//! enough that finer-grained locking buys nothing).

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::assembler::TeamAssembler;
use crate::task::Task;
use crate::team::{AgentTeam, TeamKind, TeamStatus};

/// Configuration for the team manager.
#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    /// Default kind for newly created teams.
    pub kind: TeamKind,
    /// A cached team is only reused while it still has at least this
    /// many members.
    pub min_team_size: usize,
    /// Teams never grow beyond this many members.
    pub max_team_size: usize,
    /// Reuse-cache time to live, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            kind: TeamKind::Ephemeral,
            min_team_size: 1,
            max_team_size: 10,
            cache_ttl_secs: 3600,
        }
    }
}

/// Statistics over the reuse cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub total_accesses: u64,
}

struct CacheEntry {
    team: AgentTeam,
    cached_at: DateTime<Utc>,
    accesses: u64,
}

/// Time-bounded cache mapping task signatures to assembled teams.
struct TeamCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl TeamCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn get(&mut self, signature: &str) -> Option<AgentTeam> {
        let expired = match self.entries.get(signature) {
            Some(entry) => Utc::now() - entry.cached_at > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(signature);
            return None;
        }
        self.entries.get_mut(signature).map(|entry| {
            entry.accesses += 1;
            entry.team.clone()
        })
    }

    fn put(&mut self, signature: String, team: AgentTeam) {
        self.entries.insert(
            signature,
            CacheEntry {
                team,
                cached_at: Utc::now(),
                accesses: 0,
            },
        );
    }

    fn invalidate(&mut self, signature: &str) {
        self.entries.remove(signature);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            total_accesses: self.entries.values().map(|e| e.accesses).sum(),
        }
    }
}

/// Statistics over active teams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub total_teams: usize,
    pub by_status: HashMap<String, usize>,
    pub by_kind: HashMap<String, usize>,
    pub cache: CacheStats,
}

struct ManagerState {
    kind: TeamKind,
    active: HashMap<Uuid, AgentTeam>,
    cache: TeamCache,
}

/// Owns all active teams and the reuse cache. Sole mutator of team
/// status and membership after assembly.
pub struct TeamManager {
    assembler: TeamAssembler,
    config: ManagerConfig,
    state: Mutex<ManagerState>,
}

impl TeamManager {
    /// Create a manager that builds fresh teams with the given assembler.
    pub fn new(assembler: TeamAssembler, config: ManagerConfig) -> Self {
        let ttl = Duration::seconds(config.cache_ttl_secs as i64);
        Self {
            assembler,
            config,
            state: Mutex::new(ManagerState {
                kind: config.kind,
                active: HashMap::new(),
                cache: TeamCache::new(ttl),
            }),
        }
    }

    /// Create a team for the task.
    ///
    /// Ephemeral teams are always assembled fresh. For persistent and
    /// hybrid kinds, unless `force_new`, the reuse cache is consulted
    /// first: a non-expired entry whose team still meets the minimum
    /// member count is reactivated and returned without re-assembly;
    /// otherwise a new team is assembled, activated, and cached under
    /// the task's signature (overwriting any prior entry).
    pub async fn create_team(
        &self,
        task: &Task,
        name: Option<String>,
        force_new: bool,
    ) -> AgentTeam {
        let signature = task_signature(task);
        let kind = self.state.lock().kind;
        let reusable = matches!(kind, TeamKind::Persistent | TeamKind::Hybrid);

        if reusable && !force_new {
            let mut state = self.state.lock();
            if let Some(mut team) = state.cache.get(&signature) {
                if team.member_count() >= self.config.min_team_size {
                    log::debug!("reusing cached team {} for signature {}", team.id, signature);
                    team.status = TeamStatus::Active;
                    team.touch();
                    state.active.insert(team.id, team.clone());
                    return team;
                }
            }
        }

        // Assemble outside the lock; assembly may await external search.
        let members = self.assembler.assemble(task).await;

        let mut team = AgentTeam::new(
            name.unwrap_or_else(|| format!("team-{}", &Uuid::new_v4().simple().to_string()[..8])),
            kind,
        );
        for member in members {
            team.add_member(member);
        }
        team.status = TeamStatus::Active;

        let mut state = self.state.lock();
        state.active.insert(team.id, team.clone());
        if reusable {
            state.cache.put(signature, team.clone());
        }
        team
    }

    /// Look up an active team by id. `None` means no such team.
    pub fn get_team(&self, team_id: Uuid) -> Option<AgentTeam> {
        self.state.lock().active.get(&team_id).cloned()
    }

    /// List active teams, optionally filtered by status. Order is not
    /// guaranteed; callers sort if they care.
    pub fn list_teams(&self, status: Option<TeamStatus>) -> Vec<AgentTeam> {
        let state = self.state.lock();
        state
            .active
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect()
    }

    /// Dissolve a team: mark it dissolving, record the reason and time
    /// in metadata, and drop it from the active set. Returns false when
    /// the id is unknown.
    ///
    /// Persistent teams intentionally remain reachable through the
    /// reuse cache after dissolution of the active registration.
    pub fn dissolve_team(&self, team_id: Uuid, reason: Option<&str>) -> bool {
        let mut state = self.state.lock();
        let Some(mut team) = state.active.remove(&team_id) else {
            return false;
        };
        team.status = TeamStatus::Dissolving;
        team.metadata.insert(
            "dissolve_reason".into(),
            serde_json::Value::String(reason.unwrap_or("completed").to_string()),
        );
        team.metadata.insert(
            "dissolved_at".into(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );
        log::debug!("dissolved team {} ({})", team_id, reason.unwrap_or("completed"));
        true
    }

    /// Append a task to an existing team, refresh its activity, and grow
    /// it with newly assembled members not already present, up to the
    /// configured maximum. Existing members are never removed or
    /// reassigned. Returns false when the id is unknown.
    pub async fn add_task_to_team(&self, team_id: Uuid, task: &Task) -> bool {
        if !self.state.lock().active.contains_key(&team_id) {
            return false;
        }

        let new_members = self.assembler.assemble(task).await;

        let mut state = self.state.lock();
        let Some(team) = state.active.get_mut(&team_id) else {
            return false;
        };
        team.tasks.push(task.id);
        team.touch();

        for member in new_members {
            if team.member_count() >= self.config.max_team_size {
                break;
            }
            let already_present = team
                .members
                .iter()
                .any(|m| m.capability.agent_id == member.capability.agent_id);
            if !already_present {
                team.add_member(member);
            }
        }
        true
    }

    /// Mark a team idle. Returns false when the id is unknown.
    pub fn mark_idle(&self, team_id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.active.get_mut(&team_id) {
            Some(team) => {
                team.status = TeamStatus::Idle;
                true
            }
            None => false,
        }
    }

    /// Dissolve every idle team whose last activity is older than the
    /// timeout. Returns the number of teams dissolved.
    pub fn cleanup_idle_teams(&self, idle_timeout_secs: u64) -> usize {
        let cutoff = Utc::now() - Duration::seconds(idle_timeout_secs as i64);
        let stale: Vec<Uuid> = {
            let state = self.state.lock();
            state
                .active
                .values()
                .filter(|t| t.status == TeamStatus::Idle && t.last_active_at < cutoff)
                .map(|t| t.id)
                .collect()
        };
        for team_id in &stale {
            self.dissolve_team(*team_id, Some("idle_timeout"));
        }
        stale.len()
    }

    /// Current default team kind.
    pub fn kind(&self) -> TeamKind {
        self.state.lock().kind
    }

    /// Change the default team kind. Switching to ephemeral clears the
    /// reuse cache.
    pub fn set_kind(&self, kind: TeamKind) {
        let mut state = self.state.lock();
        state.kind = kind;
        if kind == TeamKind::Ephemeral {
            state.cache.clear();
        }
    }

    /// Drop a cached team by task signature.
    pub fn invalidate_cached(&self, signature: &str) {
        self.state.lock().cache.invalidate(signature);
    }

    /// Statistics over active teams and the cache.
    pub fn team_stats(&self) -> TeamStats {
        let state = self.state.lock();
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut by_kind: HashMap<String, usize> = HashMap::new();
        for team in state.active.values() {
            *by_status
                .entry(format!("{:?}", team.status).to_lowercase())
                .or_default() += 1;
            *by_kind
                .entry(format!("{:?}", team.kind).to_lowercase())
                .or_default() += 1;
        }
        TeamStats {
            total_teams: state.active.len(),
            by_status,
            by_kind,
            cache: state.cache.stats(),
        }
    }

    /// Dissolve all teams and clear the cache.
    pub fn shutdown(&self) {
        let ids: Vec<Uuid> = {
            let state = self.state.lock();
            state.active.keys().copied().collect()
        };
        for team_id in ids {
            self.dissolve_team(team_id, Some("shutdown"));
        }
        self.state.lock().cache.clear();
    }
}

/// Deterministic task signature used as the reuse-cache key: the sorted
/// required-capability tags joined by `:`, followed by the description
/// length.
///
/// Intentionally coarse: cheap to compute, but unrelated tasks with the
/// same tags and description length collide and may share a cached team.
pub fn task_signature(task: &Task) -> String {
    let mut tags = task.required_capabilities.clone();
    tags.sort();
    format!("{}:{}", tags.join(":"), task.description.len())
}
