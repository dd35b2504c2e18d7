//! Conversation sessions and the turn orchestrator.

pub mod registry;
pub mod turn;

pub use registry::{ConversationRegistry, Session};
pub use turn::{Orchestrator, OrchestratorConfig};
