//! Search provider contract.
//!
//! The nearest-neighbor/embedding search that finds agents by semantic
//! similarity lives outside this crate; it is consumed only through the
//! [`SearchProvider`] trait. Provider selection happens at construction
//! time: components hold an `Option<Arc<dyn SearchProvider>>` and fall
//! back to registry text search when it is `None` or uninitialized.

use async_trait::async_trait;

use crate::capability::AgentCapability;
use crate::error::SearchError;

/// A ranked candidate returned by a search provider.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Snapshot of the matched capability.
    pub capability: AgentCapability,
    /// Similarity score, higher is better.
    pub score: f64,
    /// Raw distance reported by the backing index, lower is better.
    pub distance: f64,
}

impl SearchHit {
    /// Create a hit with the given similarity score.
    pub fn new(capability: AgentCapability, score: f64) -> Self {
        Self {
            capability,
            score,
            distance: 1.0 - score,
        }
    }
}

/// Contract for external similarity search over agent capabilities.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Whether the provider is ready to answer queries.
    fn is_initialized(&self) -> bool;

    /// Return up to `top_k` candidates for the query, ranked by
    /// descending similarity, dropping anything below `min_similarity`.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// A provider backed by a fixed in-memory corpus of pre-scored hits.
///
/// Answers every query with the same ranking, filtered by score and
/// truncated to `top_k`. Useful for tests and demos that need
/// deterministic search behavior without a real vector index.
#[derive(Debug, Default)]
pub struct StaticSearchProvider {
    hits: Vec<SearchHit>,
}

impl StaticSearchProvider {
    /// Create a provider over the given ranked hits.
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn search(
        &self,
        _query: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SearchHit>, SearchError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| h.score >= min_similarity)
            .take(top_k)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::AgentCapability;

    fn hit(agent_id: &str, score: f64) -> SearchHit {
        SearchHit::new(
            AgentCapability::new(agent_id, agent_id, "test agent"),
            score,
        )
    }

    #[tokio::test]
    async fn test_static_provider_filters_and_truncates() {
        let provider =
            StaticSearchProvider::new(vec![hit("a", 0.9), hit("b", 0.5), hit("c", 0.2)]);

        let hits = provider.search("anything", 2, 0.3).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].capability.agent_id, "a");
        assert_eq!(hits[1].capability.agent_id, "b");

        let strict = provider.search("anything", 10, 0.8).await.unwrap();
        assert_eq!(strict.len(), 1);
    }
}
