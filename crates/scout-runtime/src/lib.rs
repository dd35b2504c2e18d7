//! # scout-runtime
//!
//! Turn orchestration for the Scout answer engine.
//!
//! - **Routing**: [`routing::Topology`] — which pipeline stages run per route,
//!   and in what order.
//! - **Processor**: [`processor::EventProcessor`] — stateful translation of
//!   stage signals into ordered [`scout_core::messages::StreamMessage`]s,
//!   with dedup, budget enforcement, and final-answer assembly.
//! - **Orchestrator**: [`orchestrator::Orchestrator`] — per-conversation
//!   exclusive turns over a bounded message channel, with a TTL-evicting
//!   conversation registry.
//! - **Pipeline boundary**: [`pipeline::TurnPipeline`] — the narrow interface
//!   the external stage executors implement; [`pipeline::ReplayPipeline`] is
//!   the deterministic stand-in used by tests and the demo binary.
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: scout-core.

#![deny(unsafe_code)]

pub mod errors;
pub mod orchestrator;
pub mod pipeline;
pub mod processor;
pub mod routing;

// Re-export main public API
pub use errors::RuntimeError;
pub use orchestrator::registry::{ConversationRegistry, Session};
pub use orchestrator::turn::{Orchestrator, OrchestratorConfig};
pub use pipeline::{BoxedPipeline, PipelineFactory, ReplayPipeline, TurnPipeline};
pub use processor::event_processor::EventProcessor;
pub use processor::step_tracker::StepTracker;
pub use routing::{Route, Stage, Topology};
