//! Pipeline boundary — the narrow interface stage executors implement.
//!
//! The orchestrator only ever sees one ordered [`PipelineSignal`] stream per
//! turn. Production implementations wrap the LLM/search/fetch executors;
//! [`ReplayPipeline`] is a deterministic stand-in for tests and demos.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use scout_core::signals::PipelineSignal;

/// A conversation-scoped pipeline instance.
///
/// One instance persists per conversation and may accumulate state across
/// turns. The returned stream owns everything it needs; implementations that
/// do real work typically spawn it and hand back a channel-backed stream.
pub trait TurnPipeline: Send + 'static {
    /// Run one turn for `task`, yielding stage signals in order.
    fn run(&mut self, task: &str) -> BoxStream<'static, PipelineSignal>;
}

/// A boxed pipeline instance, as stored by the conversation registry.
pub type BoxedPipeline = Box<dyn TurnPipeline>;

/// Creates the pipeline instance for a newly seen conversation.
pub type PipelineFactory = Arc<dyn Fn() -> BoxedPipeline + Send + Sync>;

/// Deterministic pipeline that replays scripted signal sequences.
///
/// Each call to [`TurnPipeline::run`] consumes the next script; a pipeline
/// that runs out of scripts yields an empty stream (the turn then ends by
/// stream exhaustion rather than by terminal signal).
pub struct ReplayPipeline {
    scripts: VecDeque<Vec<PipelineSignal>>,
    turns_run: usize,
}

impl ReplayPipeline {
    /// Replay the given scripts, one per turn, in order.
    #[must_use]
    pub fn new(scripts: Vec<Vec<PipelineSignal>>) -> Self {
        Self {
            scripts: scripts.into(),
            turns_run: 0,
        }
    }

    /// Replay a single script on the first turn.
    #[must_use]
    pub fn single(script: Vec<PipelineSignal>) -> Self {
        Self::new(vec![script])
    }

    /// Number of turns run against this instance so far.
    #[must_use]
    pub fn turns_run(&self) -> usize {
        self.turns_run
    }
}

impl TurnPipeline for ReplayPipeline {
    fn run(&mut self, _task: &str) -> BoxStream<'static, PipelineSignal> {
        self.turns_run += 1;
        let script = self.scripts.pop_front().unwrap_or_default();
        stream::iter(script).boxed()
    }
}
