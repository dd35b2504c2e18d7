//! User-facing stream messages.
//!
//! A turn emits an append-only, ordered sequence of [`StreamMessage`] values:
//! one `turn.start`, interleaved step progress, optional answer deltas, and a
//! single final `answer`. Messages are never mutated after emission; the
//! serialized form is a tagged JSON object whose `type` field carries the
//! kind string.

use serde::{Deserialize, Serialize};

use crate::text::truncate_str;

/// Maximum snippet length kept on a [`Page`], in bytes (char-boundary safe).
pub const SNIPPET_MAX_BYTES: usize = 100;

/// A normalized citation page backing progress and answer messages.
///
/// `url` is required and non-empty; all other fields are optional and
/// omitted from the serialized form when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page URL — the identity key for deduplication.
    pub url: String,
    /// Page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short excerpt, capped at [`SNIPPET_MAX_BYTES`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Favicon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl Page {
    /// Build a normalized page from raw stage output.
    ///
    /// Trims every field, drops empty optional fields, and caps the snippet.
    /// Returns `None` when the trimmed url is empty — malformed records are
    /// omitted from their batch rather than surfaced as errors.
    pub fn build(
        url: &str,
        title: Option<&str>,
        snippet: Option<&str>,
        favicon: Option<&str>,
    ) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_owned(),
            title: non_empty(title),
            snippet: non_empty(snippet).map(|s| truncate_str(&s, SNIPPET_MAX_BYTES).to_owned()),
            favicon: non_empty(favicon),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// A progress or answer event emitted to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    /// Turn accepted; surfaces the (possibly generated) conversation id.
    #[serde(rename = "turn.start")]
    TurnStart {
        /// Conversation the turn is pinned to.
        conversation_id: String,
    },

    /// A titled step opened.
    #[serde(rename = "step.start")]
    StepStart {
        /// Step title.
        title: String,
        /// What the step is about to do.
        description: String,
    },

    /// Informational progress within an open step.
    #[serde(rename = "step.status")]
    StepStatus {
        /// Step title.
        title: String,
        /// Progress line.
        description: String,
    },

    /// A titled step closed.
    #[serde(rename = "step.end")]
    StepEnd {
        /// Step title.
        title: String,
        /// Outcome summary.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// Page fetches announced for a batch of urls.
    #[serde(rename = "step.fetch.start")]
    FetchStart {
        /// Fetch step title.
        title: String,
        /// Pages about to be fetched in depth.
        pages: Vec<Page>,
    },

    /// Page fetches finished; carries the fetched citation batch.
    #[serde(rename = "step.fetch.end")]
    FetchEnd {
        /// Fetch step title.
        title: String,
        /// Pages kept after normalization and budget enforcement.
        pages: Vec<Page>,
    },

    /// Answer composition started.
    #[serde(rename = "step.answer.start")]
    AnswerStart {
        /// Answer step title.
        title: String,
        /// Route-specific description, when a route was decided.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// Incremental answer text.
    #[serde(rename = "step.answer.delta")]
    AnswerDelta {
        /// Answer step title.
        title: String,
        /// Text fragment.
        delta: String,
    },

    /// Answer composition finished.
    #[serde(rename = "step.answer.end")]
    AnswerEnd {
        /// Answer step title.
        title: String,
    },

    /// The final answer for the turn.
    #[serde(rename = "answer")]
    Answer {
        /// Full answer text, sentinel stripped. May be empty when the
        /// pipeline produced no usable content.
        answer: String,
        /// Citation pages from the last fetch batch.
        #[serde(skip_serializing_if = "Option::is_none")]
        citations: Option<Vec<Page>>,
    },
}

impl StreamMessage {
    /// Get the message kind string (for type discrimination).
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::TurnStart { .. } => "turn.start",
            Self::StepStart { .. } => "step.start",
            Self::StepStatus { .. } => "step.status",
            Self::StepEnd { .. } => "step.end",
            Self::FetchStart { .. } => "step.fetch.start",
            Self::FetchEnd { .. } => "step.fetch.end",
            Self::AnswerStart { .. } => "step.answer.start",
            Self::AnswerDelta { .. } => "step.answer.delta",
            Self::AnswerEnd { .. } => "step.answer.end",
            Self::Answer { .. } => "answer",
        }
    }
}
