//! Pipeline stage signals.
//!
//! One ordered stream of [`PipelineSignal`] values arrives per turn from the
//! stage executors (routing, planning, search, ranking, fetching, answer
//! generation). The union is closed: every signal the orchestrator reacts to
//! is a named variant, and internal control traffic the client never sees
//! travels as [`PipelineSignal::Control`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The chosen top-level pipeline branch, decided once per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Direct reply from existing knowledge.
    QuickAnswer,
    /// Web-research pipeline: plan, search, rank, fetch, report.
    DeepDive,
    /// Hands-on programming assistance.
    Coding,
}

/// Deep-dive budget and query list, produced once per deep-dive turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Search queries ordered by usefulness.
    pub queries: Vec<String>,
    /// Maximum candidates kept in the visible ranked set.
    pub rank_top_k: u32,
    /// Maximum pages fetched in depth. Zero means "keep none"; the absence
    /// of a plan (not a zero) is what means "unbounded".
    pub fetch_page_limit: u32,
}

/// A raw search hit, before ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePage {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Search-engine snippet.
    pub snippet: String,
    /// Favicon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// A candidate selected by the ranking stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSelection {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Search-engine snippet.
    pub snippet: String,
    /// Why the ranker kept this page.
    pub reason: String,
    /// Favicon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// A page fetched in depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Favicon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    /// Search-engine snippet carried over from ranking.
    pub snippet: String,
    /// Extracted page content; falls back to the snippet when empty.
    pub detail: String,
}

/// A plain text message attributed to a pipeline source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedText {
    /// Emitting stage source label.
    pub source: String,
    /// Message text.
    pub text: String,
}

/// A stage-completion signal consumed by the event processor.
///
/// Signals arrive unordered with respect to kind (the stream itself is
/// ordered); the processor is a total function over this union and ignores
/// [`Self::Control`] without output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineSignal {
    /// Routing stage decided the pipeline branch.
    #[serde(rename = "route.decision")]
    RouteDecision {
        /// The chosen branch.
        route: Route,
    },

    /// Planning stage produced the deep-dive budget.
    #[serde(rename = "research.plan")]
    Plan {
        /// The active plan.
        plan: ResearchPlan,
    },

    /// A search is being issued for a query (results not yet available).
    #[serde(rename = "search.query")]
    SearchQuery {
        /// The query text.
        query: String,
    },

    /// Search stage returned raw candidates for a query.
    #[serde(rename = "search.candidates")]
    SearchCandidates {
        /// The query text; empty when the stage ran without one.
        query: String,
        /// Raw hits.
        candidates: Vec<CandidatePage>,
    },

    /// Ranking stage selected pages for deeper review.
    #[serde(rename = "search.ranked")]
    RankedSelections {
        /// Kept candidates with rationale.
        selections: Vec<RankedSelection>,
    },

    /// Fetch stage returned page contents.
    #[serde(rename = "search.fetched")]
    FetchedResults {
        /// Fetched pages.
        results: Vec<FetchedPage>,
    },

    /// Incremental answer text from a generating source.
    #[serde(rename = "answer.chunk")]
    Chunk {
        /// Emitting source label.
        source: String,
        /// Text fragment.
        text: String,
    },

    /// Complete non-streaming message from a source (fallback answer input).
    #[serde(rename = "agent.message")]
    Message {
        /// Emitting source label.
        source: String,
        /// Message text.
        text: String,
    },

    /// Terminal signal: the pipeline run finished.
    #[serde(rename = "turn.complete")]
    Complete {
        /// Full message history of the run, for last-resort answer recovery.
        history: Vec<SourcedText>,
    },

    /// Internal control traffic not meant for the client. Ignored.
    #[serde(rename = "control")]
    Control {
        /// Control signal kind.
        kind: String,
        /// Opaque payload.
        payload: Value,
    },
}

impl PipelineSignal {
    /// Get the signal kind string (for type discrimination).
    #[must_use]
    pub fn signal_type(&self) -> &'static str {
        match self {
            Self::RouteDecision { .. } => "route.decision",
            Self::Plan { .. } => "research.plan",
            Self::SearchQuery { .. } => "search.query",
            Self::SearchCandidates { .. } => "search.candidates",
            Self::RankedSelections { .. } => "search.ranked",
            Self::FetchedResults { .. } => "search.fetched",
            Self::Chunk { .. } => "answer.chunk",
            Self::Message { .. } => "agent.message",
            Self::Complete { .. } => "turn.complete",
            Self::Control { .. } => "control",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(Route::QuickAnswer).unwrap(),
            json!("quick_answer")
        );
        assert_eq!(
            serde_json::from_value::<Route>(json!("deep_dive")).unwrap(),
            Route::DeepDive
        );
    }

    #[test]
    fn signal_tag_matches_accessor() {
        let signal = PipelineSignal::SearchQuery {
            query: "rust channels".into(),
        };
        let value = serde_json::to_value(&signal).unwrap();
        assert_eq!(value["type"], signal.signal_type());
    }

    #[test]
    fn plan_round_trips() {
        let signal = PipelineSignal::Plan {
            plan: ResearchPlan {
                queries: vec!["a".into(), "b".into()],
                rank_top_k: 3,
                fetch_page_limit: 2,
            },
        };
        let text = serde_json::to_string(&signal).unwrap();
        let back: PipelineSignal = serde_json::from_str(&text).unwrap();
        assert_eq!(back, signal);
    }

    #[test]
    fn control_carries_opaque_payload() {
        let signal = PipelineSignal::Control {
            kind: "graph.edge_taken".into(),
            payload: json!({"from": "router", "to": "search"}),
        };
        let value = serde_json::to_value(&signal).unwrap();
        assert_eq!(value["payload"]["from"], "router");
    }
}
