//! End-to-end turn flows: routing, research budgets, citations, and
//! conversation exclusivity.

use std::sync::Arc;

use assert_matches::assert_matches;
use futures::stream::BoxStream;
use futures::StreamExt;
use scout_core::messages::StreamMessage;
use scout_core::signals::{
    CandidatePage, FetchedPage, PipelineSignal, RankedSelection, ResearchPlan, Route,
};
use scout_runtime::{
    BoxedPipeline, Orchestrator, PipelineFactory, ReplayPipeline, RuntimeError, TurnPipeline,
};
use tokio::sync::Notify;

fn replay_factory(scripts: Vec<Vec<PipelineSignal>>) -> PipelineFactory {
    Arc::new(move || Box::new(ReplayPipeline::new(scripts.clone())) as BoxedPipeline)
}

fn quick_answer_script(text: &str) -> Vec<PipelineSignal> {
    vec![
        PipelineSignal::RouteDecision {
            route: Route::QuickAnswer,
        },
        PipelineSignal::Chunk {
            source: "quick_answer".into(),
            text: format!("{text} TERMINATE"),
        },
        PipelineSignal::Complete { history: vec![] },
    ]
}

fn candidate(url: &str) -> CandidatePage {
    CandidatePage {
        title: format!("Title {url}"),
        url: url.into(),
        snippet: "candidate snippet".into(),
        favicon: None,
    }
}

fn selection(url: &str) -> RankedSelection {
    RankedSelection {
        title: format!("Title {url}"),
        url: url.into(),
        snippet: "ranked snippet".into(),
        reason: "relevant".into(),
        favicon: None,
    }
}

fn fetched(url: &str, detail: &str) -> FetchedPage {
    FetchedPage {
        title: format!("Title {url}"),
        url: url.into(),
        favicon: None,
        snippet: "fetched snippet".into(),
        detail: detail.into(),
    }
}

async fn collect(orchestrator: &Orchestrator, message: &str, conv: &str) -> Vec<StreamMessage> {
    orchestrator
        .ask(message, Some(conv))
        .unwrap()
        .collect()
        .await
}

fn kinds(messages: &[StreamMessage]) -> Vec<&'static str> {
    messages.iter().map(StreamMessage::message_type).collect()
}

#[tokio::test]
async fn deep_dive_turn_streams_research_and_cites_fetched_pages() {
    let script = vec![
        PipelineSignal::RouteDecision {
            route: Route::DeepDive,
        },
        PipelineSignal::Plan {
            plan: ResearchPlan {
                queries: vec!["rust ownership".into()],
                rank_top_k: 2,
                fetch_page_limit: 2,
            },
        },
        PipelineSignal::SearchQuery {
            query: "rust ownership".into(),
        },
        PipelineSignal::SearchCandidates {
            query: "rust ownership".into(),
            candidates: vec![
                candidate("https://example.com/a"),
                candidate("https://example.com/b"),
                // Duplicate url from a second source.
                candidate("https://example.com/a"),
            ],
        },
        PipelineSignal::RankedSelections {
            selections: vec![
                selection("https://example.com/a"),
                selection("https://example.com/a"),
                selection("https://example.com/b"),
                selection("https://example.com/c"),
            ],
        },
        PipelineSignal::FetchedResults {
            results: vec![
                fetched("https://example.com/a", "Ownership moves values."),
                fetched("https://example.com/b", "Borrowing lends references."),
                fetched("https://example.com/c", "Over the fetch budget."),
            ],
        },
        PipelineSignal::Chunk {
            source: "report".into(),
            text: "Ownership is Rust's core memory model. TERMINATE".into(),
        },
        PipelineSignal::Complete { history: vec![] },
    ];

    let orchestrator = Orchestrator::new(replay_factory(vec![script]));
    let messages = collect(&orchestrator, "Explain ownership in Rust", "conv-deep").await;

    assert_eq!(
        kinds(&messages),
        [
            "turn.start",
            "step.start",        // planning
            "step.start",        // search opens on the route decision
            "step.end",          // planning closes
            "step.status",       // searching with the query
            "step.end",          // search closes with candidate count
            "step.start",        // ranking opens
            "step.end",          // ranking closes
            "step.fetch.start",  // announced within the fetch budget
            "step.fetch.end",
            "step.answer.start",
            "step.answer.delta",
            "step.answer.end",
            "answer",
        ]
    );

    // rank_top_k caps the ranked count after url dedup.
    let rank_end = &messages[7];
    assert_matches!(
        rank_end,
        StreamMessage::StepEnd { description: Some(d), .. }
            if d == "Selected 2 pages for deeper research."
    );

    assert_matches!(
        &messages[8],
        StreamMessage::FetchStart { pages, .. } if pages.len() == 2
    );

    // fetch_page_limit caps citations; deltas and the final answer agree.
    assert_matches!(
        messages.last().unwrap(),
        StreamMessage::Answer { answer, citations: Some(pages) }
            if answer == "Ownership is Rust's core memory model."
                && pages.len() == 2
                && pages[0].url == "https://example.com/a"
                && pages[1].url == "https://example.com/b"
    );
}

#[tokio::test]
async fn follow_up_turn_reuses_the_conversation_pipeline() {
    let orchestrator = Orchestrator::new(replay_factory(vec![
        quick_answer_script("First answer."),
        quick_answer_script("Second answer."),
    ]));

    let first = collect(&orchestrator, "first question", "conv-1").await;
    assert_matches!(
        first.last().unwrap(),
        StreamMessage::Answer { answer, .. } if answer == "First answer."
    );

    // Same conversation id: the second turn consumes the second script of
    // the same pipeline instance.
    let second = collect(&orchestrator, "follow-up", "conv-1").await;
    assert_matches!(
        second.last().unwrap(),
        StreamMessage::Answer { answer, .. } if answer == "Second answer."
    );
    assert_eq!(orchestrator.registry().len(), 1);
}

#[tokio::test]
async fn distinct_conversations_run_concurrently() {
    let orchestrator = Orchestrator::new(replay_factory(vec![quick_answer_script("Answer.")]));

    let stream_a = orchestrator.ask("question a", Some("conv-a")).unwrap();
    let stream_b = orchestrator.ask("question b", Some("conv-b")).unwrap();

    let (messages_a, messages_b) =
        tokio::join!(stream_a.collect::<Vec<_>>(), stream_b.collect::<Vec<_>>());
    assert_matches!(messages_a.last().unwrap(), StreamMessage::Answer { .. });
    assert_matches!(messages_b.last().unwrap(), StreamMessage::Answer { .. });
    assert_eq!(orchestrator.registry().len(), 2);
}

/// Pipeline whose turn blocks until released, for exercising exclusivity.
struct GatedPipeline {
    gate: Arc<Notify>,
}

impl TurnPipeline for GatedPipeline {
    fn run(&mut self, _task: &str) -> BoxStream<'static, PipelineSignal> {
        let gate = Arc::clone(&self.gate);
        Box::pin(async_stream::stream! {
            gate.notified().await;
            yield PipelineSignal::Complete { history: vec![] };
        })
    }
}

#[tokio::test]
async fn conversation_mid_turn_rejects_a_second_request() {
    let gate = Arc::new(Notify::new());
    let factory: PipelineFactory = {
        let gate = Arc::clone(&gate);
        Arc::new(move || {
            Box::new(GatedPipeline {
                gate: Arc::clone(&gate),
            }) as BoxedPipeline
        })
    };
    let orchestrator = Orchestrator::new(factory);

    let in_flight = orchestrator.ask("slow question", Some("conv-1")).unwrap();

    // The conversation lock is claimed before `ask` returns, so the
    // rejection does not depend on the turn having made progress.
    let err = orchestrator.ask("eager question", Some("conv-1")).unwrap_err();
    assert_matches!(err, RuntimeError::ConversationBusy(id) if id == "conv-1");

    gate.notify_one();
    let messages: Vec<_> = in_flight.collect().await;
    assert_matches!(messages.last().unwrap(), StreamMessage::Answer { .. });

    // Released after the turn completes.
    assert!(orchestrator.ask("next question", Some("conv-1")).is_ok());
}
