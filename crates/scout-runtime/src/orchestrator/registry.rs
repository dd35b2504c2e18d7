//! Conversation registry — pipeline instances keyed by conversation id.
//!
//! Each conversation owns one pipeline instance behind an async mutex, so a
//! conversation processes at most one turn at a time while distinct
//! conversations run concurrently. Idle entries are evicted after a TTL;
//! entries mid-turn are never evicted regardless of age.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::errors::RuntimeError;
use crate::pipeline::{BoxedPipeline, PipelineFactory};

/// Idle lifetime of a conversation before its pipeline state is discarded.
pub const DEFAULT_CONVERSATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    pipeline: Arc<AsyncMutex<BoxedPipeline>>,
    last_used: Instant,
}

/// Registry of live conversations.
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Clone)]
pub struct ConversationRegistry {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    factory: PipelineFactory,
    ttl: Duration,
}

impl ConversationRegistry {
    /// Create a registry that builds pipelines with `factory` and evicts
    /// idle conversations after [`DEFAULT_CONVERSATION_TTL`].
    #[must_use]
    pub fn new(factory: PipelineFactory) -> Self {
        Self::with_ttl(factory, DEFAULT_CONVERSATION_TTL)
    }

    /// Create a registry with an explicit idle TTL.
    #[must_use]
    pub fn with_ttl(factory: PipelineFactory, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            factory,
            ttl,
        }
    }

    /// Open a session for `conversation_id`, creating the conversation on
    /// first use. A blank or absent id starts a fresh conversation under a
    /// generated id.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ConversationBusy`] when the conversation is
    /// already processing a turn.
    pub fn open(&self, conversation_id: Option<&str>) -> Result<Session, RuntimeError> {
        let id = match conversation_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => Uuid::new_v4().simple().to_string(),
        };

        let pipeline = {
            let mut entries = self.entries.lock();
            let now = Instant::now();
            // Entries mid-turn hold their async lock, so try_lock fails and
            // they survive the sweep.
            entries.retain(|_, entry| {
                now.duration_since(entry.last_used) < self.ttl || entry.pipeline.try_lock().is_err()
            });

            let entry = entries.entry(id.clone()).or_insert_with(|| {
                debug!(conversation_id = %id, "creating conversation pipeline");
                Entry {
                    pipeline: Arc::new(AsyncMutex::new((self.factory)())),
                    last_used: now,
                }
            });
            entry.last_used = now;
            Arc::clone(&entry.pipeline)
        };

        let guard = pipeline
            .try_lock_owned()
            .map_err(|_| RuntimeError::ConversationBusy(id.clone()))?;

        Ok(Session { id, guard })
    }

    /// Number of conversations currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the registry holds no conversations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether a conversation is registered under `conversation_id`.
    #[must_use]
    pub fn contains(&self, conversation_id: &str) -> bool {
        self.entries.lock().contains_key(conversation_id)
    }
}

/// An exclusive hold on one conversation's pipeline for the duration of a
/// turn. Dropping the session releases the conversation.
pub struct Session {
    id: String,
    guard: OwnedMutexGuard<BoxedPipeline>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// The conversation id this session is bound to.
    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.id
    }

    /// Mutable access to the conversation's pipeline.
    pub fn pipeline_mut(&mut self) -> &mut BoxedPipeline {
        &mut self.guard
    }
}
