//! Demo driver: runs one scripted turn per route and prints the resulting
//! message stream as JSON lines.

use std::sync::Arc;

use futures::StreamExt;
use scout_core::signals::{
    CandidatePage, FetchedPage, PipelineSignal, RankedSelection, ResearchPlan, Route,
};
use scout_runtime::{Orchestrator, PipelineFactory, ReplayPipeline, Topology};
use tracing::info;

fn quick_answer_script() -> Vec<PipelineSignal> {
    vec![
        PipelineSignal::RouteDecision {
            route: Route::QuickAnswer,
        },
        PipelineSignal::Chunk {
            source: "quick_answer".into(),
            text: "Rust is a systems programming language focused on safety ".into(),
        },
        PipelineSignal::Chunk {
            source: "quick_answer".into(),
            text: "and performance. TERMINATE".into(),
        },
        PipelineSignal::Complete { history: vec![] },
    ]
}

fn deep_dive_script() -> Vec<PipelineSignal> {
    vec![
        PipelineSignal::RouteDecision {
            route: Route::DeepDive,
        },
        PipelineSignal::Plan {
            plan: ResearchPlan {
                queries: vec!["rust async runtime comparison".into()],
                rank_top_k: 2,
                fetch_page_limit: 2,
            },
        },
        PipelineSignal::SearchQuery {
            query: "rust async runtime comparison".into(),
        },
        PipelineSignal::SearchCandidates {
            query: "rust async runtime comparison".into(),
            candidates: vec![
                CandidatePage {
                    title: "Async runtimes".into(),
                    url: "https://example.com/runtimes".into(),
                    snippet: "A survey of async runtimes.".into(),
                    favicon: None,
                },
                CandidatePage {
                    title: "Executor internals".into(),
                    url: "https://example.com/executors".into(),
                    snippet: "How executors schedule tasks.".into(),
                    favicon: None,
                },
            ],
        },
        PipelineSignal::RankedSelections {
            selections: vec![
                RankedSelection {
                    title: "Async runtimes".into(),
                    url: "https://example.com/runtimes".into(),
                    snippet: "A survey of async runtimes.".into(),
                    reason: "Directly compares the major runtimes.".into(),
                    favicon: None,
                },
                RankedSelection {
                    title: "Executor internals".into(),
                    url: "https://example.com/executors".into(),
                    snippet: "How executors schedule tasks.".into(),
                    reason: "Explains the scheduling model.".into(),
                    favicon: None,
                },
            ],
        },
        PipelineSignal::FetchedResults {
            results: vec![FetchedPage {
                title: "Async runtimes".into(),
                url: "https://example.com/runtimes".into(),
                favicon: None,
                snippet: "A survey of async runtimes.".into(),
                detail: "Tokio remains the most widely deployed runtime.".into(),
            }],
        },
        PipelineSignal::Chunk {
            source: "report".into(),
            text: "Tokio is the most widely used async runtime. TERMINATE".into(),
        },
        PipelineSignal::Complete { history: vec![] },
    ]
}

fn coding_script() -> Vec<PipelineSignal> {
    vec![
        PipelineSignal::RouteDecision {
            route: Route::Coding,
        },
        PipelineSignal::Chunk {
            source: "coding".into(),
            text: "Use `tokio::spawn` for each connection. TERMINATE".into(),
        },
        PipelineSignal::Complete { history: vec![] },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    scout_core::logging::init("demo=info,scout_runtime=debug");

    let topology = Topology::standard();
    for route in [Route::QuickAnswer, Route::DeepDive, Route::Coding] {
        let stages: Vec<_> = topology
            .stage_sequence(route)
            .into_iter()
            .map(|stage| stage.source())
            .collect();
        info!(?route, stages = stages.join(" -> "), "route topology");
    }

    let scripts = vec![quick_answer_script(), deep_dive_script(), coding_script()];
    let factory: PipelineFactory =
        Arc::new(move || Box::new(ReplayPipeline::new(scripts.clone())));
    let orchestrator = Orchestrator::new(factory);

    let questions = [
        "What is Rust?",
        "Compare the async runtimes available for Rust.",
        "How do I handle many connections with tokio?",
    ];
    for question in questions {
        println!("--- {question}");
        let mut stream = orchestrator.ask(question, Some("demo"))?;
        while let Some(message) = stream.next().await {
            println!("{}", serde_json::to_string(&message)?);
        }
    }

    Ok(())
}
