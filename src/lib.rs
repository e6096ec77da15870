//! Dynamic agent assembler: analyze a task, find matching agents,
//! assemble them into a team with roles, and execute the task's
//! subtasks under a configurable topology.
//!
//! The typical flow goes through [`DynamicAssembler`]:
//!
//! ```no_run
//! use agent_assembler::{AgentCapability, Config, DynamicAssembler};
//!
//! # async fn demo() {
//! let assembler = DynamicAssembler::new(Config::default());
//! assembler.register_agent(
//!     AgentCapability::new("researcher", "Researcher", "market research")
//!         .with_capabilities(vec!["research".into()]),
//! );
//!
//! let (mut task, team) = assembler
//!     .build_team_from_description("research current market trends")
//!     .await;
//! let execution = assembler.executor(team).execute(&mut task).await;
//! println!("{:?}", execution.summary);
//! # }
//! ```

pub mod analyzer;
pub mod assembler;
pub mod capability;
pub mod config;
pub mod dynamic_assembler;
pub mod error;
pub mod executor;
pub mod manager;
pub mod matcher;
pub mod registry;
pub mod search;
pub mod task;
pub mod team;

pub use analyzer::{DecompositionProvider, TaskAnalyzer};
pub use assembler::{AssemblerConfig, TeamAssembler};
pub use capability::{AgentCapability, CapabilityCategory};
pub use config::Config;
pub use dynamic_assembler::DynamicAssembler;
pub use error::{AnalysisError, ExecutionError, SearchError};
pub use executor::{
    AgentExecutor, ExecutionContext, ExecutionMode, ExecutionStatus, ExecutionSummary,
    SubTaskResult, TaskExecution,
};
pub use manager::{ManagerConfig, TeamManager, TeamStats};
pub use matcher::{MatcherConfig, SelectionStrategy};
pub use registry::CapabilityRegistry;
pub use search::{SearchHit, SearchProvider, StaticSearchProvider};
pub use task::{SubTask, Task, TaskPriority, TaskStatus};
pub use team::{AgentRole, AgentTeam, TeamKind, TeamMember, TeamStatus};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
