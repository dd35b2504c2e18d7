//! Event processor — translates stage signals into ordered stream messages.
//!
//! A total function from `(state, PipelineSignal)` to an ordered batch of
//! [`StreamMessage`]s over one exhaustive match. All dedup sets and budget
//! state live on the processor, constructed at turn start and dropped at
//! turn end.

use std::collections::HashSet;

use scout_core::messages::{Page, StreamMessage};
use scout_core::signals::{
    FetchedPage, PipelineSignal, RankedSelection, ResearchPlan, Route, SourcedText,
};
use scout_core::text::strip_termination_sentinel;
use tracing::trace;

use crate::processor::step_tracker::StepTracker;
use crate::routing::{self, ALL_ANSWER_SOURCES};

/// Title of the route-planning step.
pub const PLANNING_STEP_TITLE: &str = "Planning the appropriate route";
/// Title of the web-search step.
pub const SEARCH_STEP_TITLE: &str = "Running web search";
/// Title of the candidate-ranking step.
pub const RANK_STEP_TITLE: &str = "Ranking candidate sources";
/// Title of the page-fetch step.
pub const FETCH_STEP_TITLE: &str = "Fetching supporting details";
/// Title of the coding step.
pub const CODING_STEP_TITLE: &str = "Working through the code";
/// Title of the answer step.
pub const ANSWER_STEP_TITLE: &str = "Answering the question";

const SEARCH_PREPARE_DESCRIPTION: &str = "Preparing deep dive web search queries.";
const CODING_DONE_DESCRIPTION: &str = "Coding approach finalized, composing the response.";

/// Per-turn translation state.
///
/// One processor is built per turn; [`Self::finished`] flips when the
/// terminal signal has been handled, after which the orchestrator stops
/// consuming the signal stream.
pub struct EventProcessor {
    planning_open: bool,
    search: StepTracker,
    rank_started: bool,
    rank_completed: bool,
    /// Urls already announced in a `step.fetch.start` batch, across the turn.
    fetch_announced: HashSet<String>,
    answer_chunks: String,
    fallback_segments: String,
    citations: Vec<Page>,
    plan: Option<ResearchPlan>,
    answer_description: Option<String>,
    answer_started: bool,
    answer_completed: bool,
    coding_open: bool,
    answer_sources: &'static [&'static str],
    finished: bool,
}

impl EventProcessor {
    /// Create the processor for a fresh turn.
    #[must_use]
    pub fn new() -> Self {
        Self {
            planning_open: false,
            search: StepTracker::new(SEARCH_STEP_TITLE),
            rank_started: false,
            rank_completed: false,
            fetch_announced: HashSet::new(),
            answer_chunks: String::new(),
            fallback_segments: String::new(),
            citations: Vec::new(),
            plan: None,
            answer_description: None,
            answer_started: false,
            answer_completed: false,
            coding_open: false,
            answer_sources: ALL_ANSWER_SOURCES,
            finished: false,
        }
    }

    /// Mark the planning step as open (the orchestrator emits its
    /// `step.start` itself, before the first signal arrives).
    pub fn set_planning_active(&mut self, active: bool) {
        self.planning_open = active;
    }

    /// Whether the terminal signal has been processed.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Translate one signal into zero or more ordered messages.
    pub fn process(&mut self, signal: PipelineSignal) -> Vec<StreamMessage> {
        trace!(kind = signal.signal_type(), "processing pipeline signal");
        match signal {
            PipelineSignal::RouteDecision { route } => self.on_route(route),
            PipelineSignal::Plan { plan } => self.on_plan(plan),
            PipelineSignal::SearchQuery { query } => self.on_search_query(&query),
            PipelineSignal::SearchCandidates { query, candidates } => {
                self.on_search_candidates(&query, candidates.len())
            }
            PipelineSignal::RankedSelections { selections } => self.on_ranked(&selections),
            PipelineSignal::FetchedResults { results } => self.on_fetched(&results),
            PipelineSignal::Chunk { source, text } => self.on_chunk(&source, text),
            PipelineSignal::Message { source, text } => self.on_message(&source, &text),
            PipelineSignal::Complete { history } => self.on_complete(&history),
            // Internal control traffic is not meant for the client.
            PipelineSignal::Control { .. } => Vec::new(),
        }
    }

    // Signal handlers ------------------------------------------------

    fn on_route(&mut self, route: Route) -> Vec<StreamMessage> {
        let mut out = Vec::new();
        self.answer_sources = routing::answer_sources(route);

        let end_description = match route {
            Route::QuickAnswer => {
                self.answer_description =
                    Some("Drafting a direct reply without additional research.".into());
                "Quick answer selected, responding directly from existing knowledge."
            }
            Route::Coding => {
                self.answer_description =
                    Some("Producing code-focused explanations and solutions.".into());
                if !self.coding_open {
                    self.coding_open = true;
                    out.push(StreamMessage::StepStart {
                        title: CODING_STEP_TITLE.into(),
                        description: "Thinking through the implementation details.".into(),
                    });
                }
                "Coding support engaged, focusing on implementation guidance."
            }
            Route::DeepDive => {
                self.answer_description =
                    Some("Synthesizing findings from external research.".into());
                out.extend(self.search.start(SEARCH_PREPARE_DESCRIPTION));
                "Deep dive selected, gathering sources for a comprehensive response."
            }
        };

        if self.planning_open {
            out.push(StreamMessage::StepEnd {
                title: PLANNING_STEP_TITLE.into(),
                description: Some(end_description.into()),
            });
            self.planning_open = false;
        }
        out
    }

    fn on_plan(&mut self, plan: ResearchPlan) -> Vec<StreamMessage> {
        self.plan = Some(plan);
        Vec::new()
    }

    fn on_search_query(&mut self, query: &str) -> Vec<StreamMessage> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if self.search.record_key(query) {
            out.extend(self.search.start(format!("Searching for \"{query}\".")));
        }
        out.extend(
            self.search
                .status(query, format!("Searching with \"{query}\".")),
        );
        out
    }

    fn on_search_candidates(&mut self, query: &str, candidate_count: usize) -> Vec<StreamMessage> {
        let query = query.trim();
        let mut out = Vec::new();

        if query.is_empty() {
            out.extend(self.search.complete(
                None,
                format!("Found {candidate_count} candidates without a specific query."),
            ));
        } else {
            if self.search.record_key(query) {
                out.extend(self.search.start(format!("Searching for \"{query}\".")));
            }
            out.extend(
                self.search
                    .status(query, format!("Searching with \"{query}\".")),
            );
            out.extend(self.search.complete(
                Some(query),
                format!("Found {candidate_count} candidates for \"{query}\"."),
            ));
        }

        out.extend(self.ensure_rank_started());
        out
    }

    fn on_ranked(&mut self, selections: &[RankedSelection]) -> Vec<StreamMessage> {
        let mut out = Vec::new();
        out.extend(self.ensure_rank_started());

        let rank_limit = self.plan.as_ref().map(|p| p.rank_top_k as usize);
        let fetch_limit = self.plan.as_ref().map(|p| p.fetch_page_limit as usize);

        let mut ranked_pages: Vec<Page> = Vec::new();
        let mut fetch_start_pages: Vec<Page> = Vec::new();
        let mut seen_urls: HashSet<&str> = HashSet::new();

        for item in selections {
            let url = item.url.trim();
            if url.is_empty() || seen_urls.contains(url) {
                continue;
            }
            let Some(page) = Page::build(
                url,
                Some(&item.title),
                Some(&item.snippet),
                item.favicon.as_deref(),
            ) else {
                continue;
            };
            let _ = seen_urls.insert(url);

            if rank_limit.is_none_or(|limit| ranked_pages.len() < limit) {
                ranked_pages.push(page.clone());
            }

            // Fetch announcement history spans the whole turn, so a later
            // ranking batch never re-announces a url.
            if !self.fetch_announced.contains(url)
                && fetch_limit.is_none_or(|limit| fetch_start_pages.len() < limit)
            {
                let _ = self.fetch_announced.insert(url.to_owned());
                fetch_start_pages.push(page);
            }
        }

        if !self.rank_completed {
            out.push(StreamMessage::StepEnd {
                title: RANK_STEP_TITLE.into(),
                description: Some(format!(
                    "Selected {} pages for deeper research.",
                    ranked_pages.len()
                )),
            });
            self.rank_completed = true;
        }

        if !fetch_start_pages.is_empty() {
            out.push(StreamMessage::FetchStart {
                title: FETCH_STEP_TITLE.into(),
                pages: fetch_start_pages,
            });
        }

        out
    }

    fn on_fetched(&mut self, results: &[FetchedPage]) -> Vec<StreamMessage> {
        let fetch_limit = self.plan.as_ref().map(|p| p.fetch_page_limit as usize);

        let mut fetched_pages: Vec<Page> = Vec::new();
        let mut seen_urls: HashSet<&str> = HashSet::new();

        for result in results {
            let url = result.url.trim();
            if url.is_empty() || seen_urls.contains(url) {
                continue;
            }
            let detail = result.detail.trim();
            let snippet = if detail.is_empty() {
                result.snippet.trim()
            } else {
                detail
            };
            let Some(page) = Page::build(
                url,
                Some(&result.title),
                Some(snippet),
                result.favicon.as_deref(),
            ) else {
                continue;
            };
            let _ = seen_urls.insert(url);

            // A limit of exactly 0 means "keep none"; absence of a plan
            // means unbounded.
            if fetch_limit == Some(0) {
                break;
            }
            if fetch_limit.is_none_or(|limit| fetched_pages.len() < limit) {
                fetched_pages.push(page);
            }
            if fetch_limit.is_some_and(|limit| fetched_pages.len() >= limit) {
                break;
            }
        }

        // Replaces, not accumulates: the answer cites the last fetch batch.
        self.citations = fetched_pages.clone();
        vec![StreamMessage::FetchEnd {
            title: FETCH_STEP_TITLE.into(),
            pages: fetched_pages,
        }]
    }

    fn on_chunk(&mut self, source: &str, text: String) -> Vec<StreamMessage> {
        if !self.is_answer_source(source) || text.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        if self.coding_open {
            out.push(StreamMessage::StepEnd {
                title: CODING_STEP_TITLE.into(),
                description: Some(CODING_DONE_DESCRIPTION.into()),
            });
            self.coding_open = false;
        }

        out.extend(self.ensure_answer_started());
        self.answer_chunks.push_str(&text);
        out.push(StreamMessage::AnswerDelta {
            title: ANSWER_STEP_TITLE.into(),
            delta: text,
        });
        out
    }

    fn on_message(&mut self, source: &str, text: &str) -> Vec<StreamMessage> {
        if self.is_answer_source(source) && !text.is_empty() {
            self.fallback_segments.push_str(text);
        }
        Vec::new()
    }

    fn on_complete(&mut self, history: &[SourcedText]) -> Vec<StreamMessage> {
        let mut out = Vec::new();

        if self.coding_open {
            out.push(StreamMessage::StepEnd {
                title: CODING_STEP_TITLE.into(),
                description: Some(CODING_DONE_DESCRIPTION.into()),
            });
            self.coding_open = false;
        }

        // Three-level fallback: streamed chunks, then non-streaming
        // messages, then a scan of the full run history.
        let mut final_answer = strip_termination_sentinel(&self.answer_chunks).to_owned();
        if final_answer.is_empty() && !self.fallback_segments.is_empty() {
            final_answer = strip_termination_sentinel(&self.fallback_segments).to_owned();
        }
        if final_answer.is_empty() {
            let joined: String = history
                .iter()
                .filter(|message| self.is_answer_source(&message.source))
                .map(|message| message.text.as_str())
                .collect();
            final_answer = strip_termination_sentinel(&joined).to_owned();
        }

        out.extend(self.ensure_answer_started());

        if !self.answer_completed {
            out.push(StreamMessage::AnswerEnd {
                title: ANSWER_STEP_TITLE.into(),
            });
            self.answer_completed = true;
        }

        out.push(StreamMessage::Answer {
            answer: final_answer,
            citations: if self.citations.is_empty() {
                None
            } else {
                Some(self.citations.clone())
            },
        });

        self.finished = true;
        out
    }

    // Helpers --------------------------------------------------------

    fn is_answer_source(&self, source: &str) -> bool {
        self.answer_sources.contains(&source)
    }

    fn ensure_answer_started(&mut self) -> Option<StreamMessage> {
        if self.answer_started {
            return None;
        }
        self.answer_started = true;
        Some(StreamMessage::AnswerStart {
            title: ANSWER_STEP_TITLE.into(),
            description: self.answer_description.clone(),
        })
    }

    fn ensure_rank_started(&mut self) -> Option<StreamMessage> {
        if self.rank_started {
            return None;
        }
        self.rank_started = true;
        Some(StreamMessage::StepStart {
            title: RANK_STEP_TITLE.into(),
            description: "Prioritizing pages to review in depth.".into(),
        })
    }
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new()
    }
}
