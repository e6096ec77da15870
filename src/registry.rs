//! In-memory capability registry.
//!
//! Holds transient capability snapshots keyed by record id with a
//! secondary agent-id index, and provides the text-containment search
//! used as the fallback corpus when no search provider is configured.
//! Iteration order is insertion order so matching stays deterministic.

use std::collections::HashMap;
use uuid::Uuid;

use crate::capability::{AgentCapability, CapabilityCategory};

/// Registry of agent capabilities.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<Uuid, AgentCapability>,
    agent_index: HashMap<String, Uuid>,
    // Insertion order of record ids; keeps list/search output stable.
    order: Vec<Uuid>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. Returns the record id.
    ///
    /// Registering a second capability for the same agent id replaces the
    /// previous record.
    pub fn register(&mut self, capability: AgentCapability) -> Uuid {
        if let Some(previous) = self.agent_index.get(&capability.agent_id).copied() {
            log::debug!(
                "replacing capability record for agent {}",
                capability.agent_id
            );
            self.capabilities.remove(&previous);
            self.order.retain(|id| *id != previous);
        }

        let id = capability.id;
        self.agent_index.insert(capability.agent_id.clone(), id);
        self.capabilities.insert(id, capability);
        self.order.push(id);
        id
    }

    /// Unregister a capability by record id. Returns false when absent.
    pub fn unregister(&mut self, capability_id: Uuid) -> bool {
        match self.capabilities.remove(&capability_id) {
            Some(capability) => {
                self.agent_index.remove(&capability.agent_id);
                self.order.retain(|id| *id != capability_id);
                true
            }
            None => false,
        }
    }

    /// Get a capability by record id.
    pub fn get(&self, capability_id: Uuid) -> Option<&AgentCapability> {
        self.capabilities.get(&capability_id)
    }

    /// Get a capability by agent id.
    pub fn get_by_agent_id(&self, agent_id: &str) -> Option<&AgentCapability> {
        self.agent_index
            .get(agent_id)
            .and_then(|id| self.capabilities.get(id))
    }

    /// Replace an existing capability record, bumping its version.
    /// Returns false when the record id is unknown.
    pub fn update(&mut self, mut capability: AgentCapability) -> bool {
        if !self.capabilities.contains_key(&capability.id) {
            return false;
        }
        capability.touch();
        self.capabilities.insert(capability.id, capability);
        true
    }

    /// List all capabilities in insertion order.
    pub fn list_all(&self) -> Vec<&AgentCapability> {
        self.order
            .iter()
            .filter_map(|id| self.capabilities.get(id))
            .collect()
    }

    /// List all active capabilities in insertion order.
    pub fn list_active(&self) -> Vec<&AgentCapability> {
        self.list_all()
            .into_iter()
            .filter(|c| c.is_active)
            .collect()
    }

    /// List capabilities with the given category.
    pub fn list_by_category(&self, category: CapabilityCategory) -> Vec<&AgentCapability> {
        self.list_all()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Case-insensitive substring search over each capability's search
    /// text and keywords. Active records only, at most `limit` results.
    pub fn search_by_text(&self, query: &str, limit: usize) -> Vec<&AgentCapability> {
        let query_lower = query.to_lowercase();
        let mut results = Vec::new();

        for capability in self.list_active() {
            let text_match = capability
                .to_search_text()
                .to_lowercase()
                .contains(&query_lower);
            let keyword_match = capability
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&query_lower));

            if text_match || keyword_match {
                results.push(capability);
                if results.len() >= limit {
                    break;
                }
            }
        }

        results
    }

    /// Number of registered capabilities.
    pub fn count(&self) -> usize {
        self.capabilities.len()
    }

    /// Remove all capabilities.
    pub fn clear(&mut self) {
        self.capabilities.clear();
        self.agent_index.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(agent_id: &str, description: &str) -> AgentCapability {
        AgentCapability::new(agent_id, agent_id.to_uppercase(), description)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CapabilityRegistry::new();
        let capability = cap("coder", "writes code");
        let id = registry.register(capability);

        assert_eq!(registry.count(), 1);
        assert!(registry.get(id).is_some());
        assert_eq!(
            registry.get_by_agent_id("coder").map(|c| c.agent_id.as_str()),
            Some("coder")
        );
    }

    #[test]
    fn test_register_replaces_same_agent() {
        let mut registry = CapabilityRegistry::new();
        registry.register(cap("coder", "v1"));
        registry.register(cap("coder", "v2"));

        assert_eq!(registry.count(), 1);
        assert_eq!(
            registry.get_by_agent_id("coder").map(|c| c.description.as_str()),
            Some("v2")
        );
    }

    #[test]
    fn test_unregister() {
        let mut registry = CapabilityRegistry::new();
        let id = registry.register(cap("coder", "writes code"));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.count(), 0);
        assert!(registry.get_by_agent_id("coder").is_none());
    }

    #[test]
    fn test_list_by_category() {
        let mut registry = CapabilityRegistry::new();
        registry.register(cap("a", "x").with_category(CapabilityCategory::Reasoning));
        registry.register(cap("b", "x").with_category(CapabilityCategory::Creation));
        registry.register(cap("c", "x").with_category(CapabilityCategory::Reasoning));

        assert_eq!(
            registry.list_by_category(CapabilityCategory::Reasoning).len(),
            2
        );
    }

    #[test]
    fn test_search_is_insertion_ordered() {
        let mut registry = CapabilityRegistry::new();
        registry.register(cap("first", "rust systems work"));
        registry.register(cap("second", "rust web work"));
        registry.register(cap("third", "python work"));

        let results = registry.search_by_text("rust", 5);
        let ids: Vec<&str> = results.iter().map(|c| c.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let limited = registry.search_by_text("rust", 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].agent_id, "first");
    }

    #[test]
    fn test_search_skips_inactive() {
        let mut registry = CapabilityRegistry::new();
        let mut inactive = cap("ghost", "rust work");
        inactive.is_active = false;
        registry.register(inactive);

        assert!(registry.search_by_text("rust", 5).is_empty());
    }

    #[test]
    fn test_search_matches_keywords() {
        let mut registry = CapabilityRegistry::new();
        registry.register(
            cap("scraper", "collects pages").with_keywords(vec!["crawler".into()]),
        );

        assert_eq!(registry.search_by_text("crawl", 5).len(), 1);
    }
}
