//! Top-level facade wiring the analyzer, assembler, team manager, and
//! executor together behind one entry point.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::analyzer::{DecompositionProvider, TaskAnalyzer};
use crate::assembler::{AssemblerConfig, TeamAssembler};
use crate::capability::AgentCapability;
use crate::config::Config;
use crate::error::SearchError;
use crate::executor::AgentExecutor;
use crate::manager::{ManagerConfig, TeamManager, TeamStats};
use crate::registry::CapabilityRegistry;
use crate::search::{SearchHit, SearchProvider};
use crate::task::Task;
use crate::team::{AgentTeam, TeamStatus};

/// One-stop entry point: register agents, analyze tasks, build teams,
/// and obtain executors for them.
pub struct DynamicAssembler {
    config: Config,
    registry: Arc<RwLock<CapabilityRegistry>>,
    analyzer: TaskAnalyzer,
    manager: TeamManager,
    search: Option<Arc<dyn SearchProvider>>,
}

impl DynamicAssembler {
    /// Build with registry-backed candidate search only.
    pub fn new(config: Config) -> Self {
        Self::with_providers(config, None, None)
    }

    /// Build with optional semantic-search and decomposition providers.
    pub fn with_providers(
        config: Config,
        search: Option<Arc<dyn SearchProvider>>,
        decomposition: Option<Arc<dyn DecompositionProvider>>,
    ) -> Self {
        let registry = Arc::new(RwLock::new(CapabilityRegistry::new()));

        let mut analyzer = TaskAnalyzer::new(
            config.analysis.enable_decomposition,
            config.analysis.max_subtasks,
            config.analysis.confidence_threshold,
        );
        if let Some(provider) = decomposition {
            analyzer = analyzer.with_provider(provider);
        }

        let assembler_config = AssemblerConfig {
            min_team_size: config.assembly.min_team_size,
            max_team_size: config.assembly.max_team_size,
            optimal_team_size: config.assembly.optimal_team_size,
            strategy: config.assembly.strategy,
            enable_role_assignment: config.assembly.enable_role_assignment,
            min_similarity: config.search.min_similarity,
        };
        let mut assembler = TeamAssembler::new(registry.clone(), assembler_config);
        if let Some(provider) = &search {
            assembler = assembler.with_search(provider.clone());
        }

        let manager = TeamManager::new(
            assembler,
            ManagerConfig {
                kind: config.assembly.default_kind,
                min_team_size: config.assembly.min_team_size,
                max_team_size: config.assembly.max_team_size,
                cache_ttl_secs: config.assembly.cache_ttl_secs,
            },
        );

        Self {
            config,
            registry,
            analyzer,
            manager,
            search,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register an agent's capability record, replacing any earlier
    /// record for the same agent id.
    pub fn register_agent(&self, capability: AgentCapability) -> Uuid {
        self.registry.write().register(capability)
    }

    /// Remove an agent by id. Returns false when unknown.
    pub fn unregister_agent(&self, agent_id: &str) -> bool {
        let mut registry = self.registry.write();
        match registry.get_by_agent_id(agent_id).map(|c| c.id) {
            Some(capability_id) => registry.unregister(capability_id),
            None => false,
        }
    }

    /// All active agent records, in registration order.
    pub fn list_agents(&self) -> Vec<AgentCapability> {
        self.registry.read().list_active().into_iter().cloned().collect()
    }

    /// Annotate a task in place: capability tags, subtasks, status.
    pub async fn analyze_task(&self, task: &mut Task) {
        self.analyzer.analyze(task).await;
    }

    /// Analyze the task and assemble (or reuse) a team for it.
    pub async fn build_team(&self, task: &mut Task, name: Option<String>) -> AgentTeam {
        self.analyzer.analyze(task).await;
        self.manager.create_team(task, name, false).await
    }

    /// Convenience path: description in, analyzed task and team out.
    pub async fn build_team_from_description(
        &self,
        description: impl Into<String>,
    ) -> (Task, AgentTeam) {
        let mut task = Task::new(description);
        let team = self.build_team(&mut task, None).await;
        (task, team)
    }

    pub fn get_team(&self, team_id: Uuid) -> Option<AgentTeam> {
        self.manager.get_team(team_id)
    }

    pub fn list_teams(&self, status: Option<TeamStatus>) -> Vec<AgentTeam> {
        self.manager.list_teams(status)
    }

    pub fn dissolve_team(&self, team_id: Uuid, reason: Option<&str>) -> bool {
        self.manager.dissolve_team(team_id, reason)
    }

    /// Change the kind applied to newly built teams.
    pub fn set_team_kind(&self, kind: crate::team::TeamKind) {
        self.manager.set_kind(kind);
    }

    /// Find agents matching a free-text query: the semantic provider
    /// when one is configured and initialized, otherwise substring
    /// search over the registry with a fixed score of 1.0.
    pub async fn search_agents(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
        if let Some(provider) = &self.search {
            if provider.is_initialized() {
                return provider
                    .search(query, top_k, self.config.search.min_similarity)
                    .await;
            }
        }
        let hits = self
            .registry
            .read()
            .search_by_text(query, top_k)
            .into_iter()
            .map(|capability| SearchHit::new(capability.clone(), 1.0))
            .collect();
        Ok(hits)
    }

    /// Build an executor for a team, configured from the execution
    /// section of the config.
    pub fn executor(&self, team: AgentTeam) -> AgentExecutor {
        AgentExecutor::new(team)
            .with_mode(self.config.execution.mode)
            .with_timeout(Duration::from_secs(self.config.execution.timeout_secs))
            .with_retry(
                self.config.execution.retry_on_failure,
                self.config.execution.max_retries,
            )
    }

    pub fn stats(&self) -> TeamStats {
        self.manager.team_stats()
    }

    /// Dissolve all teams and clear the team cache. Agent registrations
    /// survive shutdown.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }

    /// Shutdown plus a full registry wipe.
    pub fn clear_all(&self) {
        self.manager.shutdown();
        self.registry.write().clear();
    }
}
