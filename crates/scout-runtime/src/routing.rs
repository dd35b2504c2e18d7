//! Routing topology — which pipeline stages run per route, and in what order.
//!
//! The topology is a static edge table rather than a runtime-built graph:
//! adding a stage or a route means extending [`Stage`]/[`Route`] and the
//! table in [`Topology::standard`], and the compiler enforces exhaustive
//! handling everywhere else.

pub use scout_core::signals::Route;

/// A pipeline stage. Each stage labels the signals it emits with
/// [`Stage::source`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Decides the route for the turn.
    Router,
    /// Produces the deep-dive research plan.
    Planner,
    /// Runs web searches for the planned queries.
    Search,
    /// Selects the strongest candidates within the plan budget.
    Rank,
    /// Fetches the selected pages in depth.
    Fetch,
    /// Writes the research-backed final answer.
    Report,
    /// Answers directly from existing knowledge.
    QuickAnswer,
    /// Produces code-focused answers.
    Coding,
}

impl Stage {
    /// The source label this stage attaches to its signals.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Planner => "planner",
            Self::Search => "search",
            Self::Rank => "rank",
            Self::Fetch => "fetch",
            Self::Report => "report",
            Self::QuickAnswer => "quick_answer",
            Self::Coding => "coding",
        }
    }
}

/// Sources that may produce final-answer content before a route is decided.
pub const ALL_ANSWER_SOURCES: &[&str] = &["report", "quick_answer", "coding"];

/// The final-answer source for a decided route.
#[must_use]
pub fn answer_sources(route: Route) -> &'static [&'static str] {
    match route {
        Route::QuickAnswer => &["quick_answer"],
        Route::DeepDive => &["report"],
        Route::Coding => &["coding"],
    }
}

/// One directed edge in the stage graph, optionally gated on the route
/// decision.
#[derive(Clone, Copy, Debug)]
struct Edge {
    from: Stage,
    to: Stage,
    route: Option<Route>,
}

/// The stage graph for a turn.
///
/// Unconditional edges are taken on every route; conditional edges only when
/// the router chose the matching route.
#[derive(Clone, Debug)]
pub struct Topology {
    edges: Vec<Edge>,
}

impl Topology {
    /// The standard three-branch topology: quick answer, deep dive, coding.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            edges: vec![
                Edge {
                    from: Stage::Router,
                    to: Stage::Planner,
                    route: Some(Route::DeepDive),
                },
                Edge {
                    from: Stage::Planner,
                    to: Stage::Search,
                    route: None,
                },
                Edge {
                    from: Stage::Search,
                    to: Stage::Rank,
                    route: None,
                },
                Edge {
                    from: Stage::Rank,
                    to: Stage::Fetch,
                    route: None,
                },
                Edge {
                    from: Stage::Fetch,
                    to: Stage::Report,
                    route: None,
                },
                Edge {
                    from: Stage::Router,
                    to: Stage::QuickAnswer,
                    route: Some(Route::QuickAnswer),
                },
                Edge {
                    from: Stage::Router,
                    to: Stage::Coding,
                    route: Some(Route::Coding),
                },
            ],
        }
    }

    /// Entry point of every turn.
    #[must_use]
    pub fn entry(&self) -> Stage {
        Stage::Router
    }

    /// Stages reachable from `from` in one step under the decided `route`.
    #[must_use]
    pub fn successors(&self, from: Stage, route: Route) -> Vec<Stage> {
        self.edges
            .iter()
            .filter(|edge| edge.from == from && edge.route.is_none_or(|r| r == route))
            .map(|edge| edge.to)
            .collect()
    }

    /// The ordered stage walk for a route, starting at the entry stage.
    ///
    /// The per-route subgraphs are linear, so the walk follows the single
    /// successor at each step until a terminal stage is reached.
    #[must_use]
    pub fn stage_sequence(&self, route: Route) -> Vec<Stage> {
        let mut sequence = vec![self.entry()];
        let mut current = self.entry();
        loop {
            let next = self.successors(current, route);
            let Some(&stage) = next.first() else { break };
            if sequence.contains(&stage) {
                break;
            }
            sequence.push(stage);
            current = stage;
        }
        sequence
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard()
    }
}
