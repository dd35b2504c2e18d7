//! Runtime error types.

use thiserror::Error;

/// Errors surfaced to the caller of [`crate::Orchestrator::ask`].
///
/// Both variants are raised synchronously before any message is emitted;
/// stage-data problems are absorbed inside the event processor and never
/// interrupt a stream.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The user message was blank.
    #[error("user message must not be blank")]
    InvalidArgument,

    /// The conversation's turn lock is already held.
    #[error("conversation '{0}' is busy processing another request")]
    ConversationBusy(String),
}
