//! Agent capability model.
//!
//! A capability describes what an external agent can do. This core never
//! stores authoritative copies of agents themselves, only capability
//! snapshots referenced by stable agent id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Categories of agent capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    Reasoning,
    Creation,
    Analysis,
    Execution,
    Coordination,
    #[default]
    Specialized,
}

/// An agent's capability profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    /// Unique identifier for this capability record.
    pub id: Uuid,
    /// Stable identifier of the agent offering the capability.
    pub agent_id: String,
    /// Display name of the agent.
    pub agent_name: String,
    /// Free-text description of what the agent does.
    pub description: String,
    /// Capability tags the agent offers.
    pub capabilities: Vec<String>,
    /// Category of the capability.
    pub category: CapabilityCategory,
    /// Keyword tags used by text search.
    pub keywords: Vec<String>,
    /// Free-form metadata.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Record version, bumped on update.
    pub version: u32,
    /// Whether the agent is active and eligible for matching.
    pub is_active: bool,
}

impl AgentCapability {
    /// Create a new capability record for an agent.
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            category: CapabilityCategory::default(),
            keywords: Vec::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            version: 1,
            is_active: true,
        }
    }

    /// Set the capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: CapabilityCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the keyword tags.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Concatenate the searchable fields into one text blob.
    pub fn to_search_text(&self) -> String {
        let mut parts = vec![self.agent_name.clone(), self.description.clone()];
        parts.extend(self.capabilities.iter().cloned());
        parts.extend(self.keywords.iter().cloned());
        parts.join(" ")
    }

    /// Mark the record as updated, bumping version and timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_includes_all_fields() {
        let cap = AgentCapability::new("coder-1", "Coder", "Writes production code")
            .with_capabilities(vec!["code generation".into()])
            .with_keywords(vec!["rust".into()]);

        let text = cap.to_search_text();
        assert!(text.contains("Coder"));
        assert!(text.contains("production code"));
        assert!(text.contains("code generation"));
        assert!(text.contains("rust"));
    }

    #[test]
    fn test_touch_bumps_version() {
        let mut cap = AgentCapability::new("a", "A", "agent");
        assert_eq!(cap.version, 1);
        cap.touch();
        assert_eq!(cap.version, 2);
    }
}
