//! Turn orchestrator — one exclusive turn per conversation, streamed over a
//! bounded channel.
//!
//! [`Orchestrator::ask`] validates the request, claims the conversation, and
//! spawns the turn onto the runtime; the caller consumes an ordered
//! [`StreamMessage`] stream. Backpressure comes from the channel bound: a
//! slow consumer pauses signal processing rather than growing a buffer, and
//! a dropped consumer aborts the turn at the next send.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use metrics::gauge;
use scout_core::messages::StreamMessage;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, instrument};

use crate::errors::RuntimeError;
use crate::orchestrator::registry::{ConversationRegistry, Session, DEFAULT_CONVERSATION_TTL};
use crate::pipeline::PipelineFactory;
use crate::processor::event_processor::{EventProcessor, PLANNING_STEP_TITLE};

/// Tuning knobs for the orchestrator.
#[derive(Clone, Copy, Debug)]
pub struct OrchestratorConfig {
    /// Bound of the per-turn message channel.
    pub channel_capacity: usize,
    /// Idle lifetime of a conversation before its state is discarded.
    pub conversation_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            conversation_ttl: DEFAULT_CONVERSATION_TTL,
        }
    }
}

/// Entry point for turns. Cheap to clone; clones share the conversation
/// registry.
#[derive(Clone)]
pub struct Orchestrator {
    registry: ConversationRegistry,
    channel_capacity: usize,
    active_turns: Arc<AtomicUsize>,
}

impl Orchestrator {
    /// Build an orchestrator with default configuration.
    #[must_use]
    pub fn new(factory: PipelineFactory) -> Self {
        Self::with_config(factory, OrchestratorConfig::default())
    }

    /// Build an orchestrator with explicit configuration.
    #[must_use]
    pub fn with_config(factory: PipelineFactory, config: OrchestratorConfig) -> Self {
        Self {
            registry: ConversationRegistry::with_ttl(factory, config.conversation_ttl),
            channel_capacity: config.channel_capacity,
            active_turns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The conversation registry backing this orchestrator.
    #[must_use]
    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    /// Run one turn for `user_message`, streaming ordered messages back.
    ///
    /// Fails fast, before any message is produced: a blank message is
    /// rejected, and a conversation already mid-turn is rejected rather
    /// than queued.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::InvalidArgument`] when `user_message` is blank,
    /// [`RuntimeError::ConversationBusy`] when the conversation is already
    /// processing a turn.
    #[instrument(skip(self, user_message), fields(conversation_id))]
    pub fn ask(
        &self,
        user_message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ReceiverStream<StreamMessage>, RuntimeError> {
        let task = user_message.trim();
        if task.is_empty() {
            return Err(RuntimeError::InvalidArgument);
        }

        let session = self.registry.open(conversation_id)?;
        tracing::Span::current().record("conversation_id", session.conversation_id());
        info!(task_len = task.len(), "starting turn");

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let task = task.to_owned();
        let active_turns = Arc::clone(&self.active_turns);
        drop(tokio::spawn(async move {
            let active = active_turns.fetch_add(1, Ordering::SeqCst) + 1;
            gauge!("scout_turns_active").set(active as f64);

            run_turn(session, &task, tx).await;

            let active = active_turns.fetch_sub(1, Ordering::SeqCst) - 1;
            gauge!("scout_turns_active").set(active as f64);
        }));

        Ok(ReceiverStream::new(rx))
    }
}

/// Drive one turn to completion.
///
/// The session must be released before the channel closes, so a consumer
/// that observes end-of-stream can immediately start the next turn on the
/// same conversation.
async fn run_turn(mut session: Session, task: &str, tx: mpsc::Sender<StreamMessage>) {
    drive_turn(&mut session, task, &tx).await;
    drop(session);
    drop(tx);
}

async fn drive_turn(session: &mut Session, task: &str, tx: &mpsc::Sender<StreamMessage>) {
    let conversation_id = session.conversation_id().to_owned();

    if tx
        .send(StreamMessage::TurnStart {
            conversation_id: conversation_id.clone(),
        })
        .await
        .is_err()
    {
        return;
    }

    let mut processor = EventProcessor::new();
    processor.set_planning_active(true);
    if tx
        .send(StreamMessage::StepStart {
            title: PLANNING_STEP_TITLE.into(),
            description: "Evaluating the best workflow for this request.".into(),
        })
        .await
        .is_err()
    {
        return;
    }

    let mut signals = session.pipeline_mut().run(task);
    while let Some(signal) = signals.next().await {
        for message in processor.process(signal) {
            // A closed receiver means the consumer went away; abandon the
            // turn.
            if tx.send(message).await.is_err() {
                debug!(conversation_id, "consumer disconnected, aborting turn");
                return;
            }
        }
        if processor.finished() {
            break;
        }
    }

    debug!(conversation_id, "turn complete");
}
