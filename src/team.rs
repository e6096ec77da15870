//! Team model: members with assigned roles and the team lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::capability::AgentCapability;

/// Roles agents can play in a team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Leader,
    Coordinator,
    #[default]
    Specialist,
    Executor,
    Reviewer,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Leader => write!(f, "leader"),
            AgentRole::Coordinator => write!(f, "coordinator"),
            AgentRole::Specialist => write!(f, "specialist"),
            AgentRole::Executor => write!(f, "executor"),
            AgentRole::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// Team kind: how long the team is expected to live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamKind {
    /// One task, dissolved immediately afterwards.
    #[default]
    Ephemeral,
    /// Cached and reused across tasks with a matching signature.
    Persistent,
    /// Reused like persistent, dissolved like ephemeral when idle.
    Hybrid,
}

/// Team status.
///
/// `Forming` becomes `Active` automatically on successful assembly;
/// `Active` and `Idle` alternate with activity tracking; dissolution
/// (`Dissolving` then `Dissolved`) is terminal and irreversible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[default]
    Forming,
    Active,
    Idle,
    Dissolving,
    Dissolved,
}

/// A team member: a capability-holder reference with an assigned role,
/// a strategy-dependent match score, and its assigned subtasks.
///
/// Never persisted independently; its lifetime is bound to the owning
/// team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Snapshot of the member's capability profile.
    pub capability: AgentCapability,
    /// Assigned role.
    pub role: AgentRole,
    /// Match score, higher is better (scale depends on strategy).
    pub score: f64,
    /// Identifiers of subtasks assigned to this member.
    pub assigned_subtasks: Vec<Uuid>,
}

impl TeamMember {
    /// Create a member with the default specialist role.
    pub fn new(capability: AgentCapability, score: f64) -> Self {
        Self {
            capability,
            role: AgentRole::default(),
            score,
            assigned_subtasks: Vec::new(),
        }
    }
}

/// An assembled agent team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTeam {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Lifecycle kind.
    pub kind: TeamKind,
    /// Current status.
    pub status: TeamStatus,
    /// Members in score order after assembly.
    pub members: Vec<TeamMember>,
    /// Identifiers of tasks this team has served.
    pub tasks: Vec<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity time.
    pub last_active_at: DateTime<Utc>,
    /// Free-form metadata; records dissolution reason and time.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentTeam {
    /// Create a new forming team.
    pub fn new(name: impl Into<String>, kind: TeamKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            status: TeamStatus::default(),
            members: Vec::new(),
            tasks: Vec::new(),
            created_at: now,
            last_active_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Add a member and refresh the activity timestamp.
    pub fn add_member(&mut self, member: TeamMember) {
        self.members.push(member);
        self.last_active_at = Utc::now();
    }

    /// Remove a member by agent id. Returns false when absent.
    pub fn remove_member(&mut self, agent_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.capability.agent_id != agent_id);
        if self.members.len() < before {
            self.last_active_at = Utc::now();
            true
        } else {
            false
        }
    }

    /// The member holding the leader role, falling back to the first
    /// member when no leader was assigned.
    pub fn leader(&self) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.role == AgentRole::Leader)
            .or_else(|| self.members.first())
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether the team is currently active.
    pub fn is_active(&self) -> bool {
        self.status == TeamStatus::Active
    }

    /// Refresh the activity timestamp.
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(agent_id: &str, role: AgentRole) -> TeamMember {
        let mut m = TeamMember::new(AgentCapability::new(agent_id, agent_id, "test"), 1.0);
        m.role = role;
        m
    }

    #[test]
    fn test_add_and_remove_member() {
        let mut team = AgentTeam::new("squad", TeamKind::Ephemeral);
        team.add_member(member("a", AgentRole::Specialist));
        assert_eq!(team.member_count(), 1);

        assert!(team.remove_member("a"));
        assert!(!team.remove_member("a"));
        assert_eq!(team.member_count(), 0);
    }

    #[test]
    fn test_leader_lookup_falls_back_to_first_member() {
        let mut team = AgentTeam::new("squad", TeamKind::Ephemeral);
        assert!(team.leader().is_none());

        team.add_member(member("first", AgentRole::Specialist));
        team.add_member(member("boss", AgentRole::Leader));

        let leader = team.leader().unwrap();
        assert_eq!(leader.capability.agent_id, "boss");

        team.remove_member("boss");
        let fallback = team.leader().unwrap();
        assert_eq!(fallback.capability.agent_id, "first");
    }
}
