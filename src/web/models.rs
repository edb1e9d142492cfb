use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::trace::StepSnapshot;
use crate::graph::{DirectedGraph, Graph};

/// Represents an edge for the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Represents a complete graph for the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebGraph {
    pub nodes: Vec<String>,
    pub links: Vec<WebEdge>,
    pub max_weight: u64,
}

impl From<&DirectedGraph> for WebGraph {
    fn from(graph: &DirectedGraph) -> Self {
        WebGraph {
            nodes: graph.nodes(),
            links: graph
                .edges()
                .into_iter()
                .map(|(source, target, weight)| WebEdge {
                    source,
                    target,
                    weight,
                })
                .collect(),
            max_weight: graph.max_weight(),
        }
    }
}

/// Body of `POST /api/sessions/:id/nodes`
#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    pub name: String,
}

/// Body of `POST /api/sessions/:id/edges`
#[derive(Debug, Deserialize)]
pub struct AddEdgeRequest {
    pub from: String,
    pub to: String,
    pub weight: i64,
}

/// Body of `POST /api/sessions/:id/run`
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub start: String,
}

/// Response of a trace computation
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub execution_id: Uuid,
    pub start: String,
    pub total_steps: usize,
    pub execution_time_ms: f64,
    pub first_step: StepSnapshot,
}

/// One snapshot together with its position in the stored trace
#[derive(Debug, Clone, Serialize)]
pub struct StepResponse {
    pub index: usize,
    pub total_steps: usize,
    pub snapshot: StepSnapshot,
}

/// Error response for API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// A stored trace and the step the viewer is on
#[derive(Debug, Clone)]
pub struct TraceState {
    pub execution_id: Uuid,
    pub start: String,
    pub steps: Vec<StepSnapshot>,
    pub cursor: usize,
}

/// Caller-owned graph, its last trace and navigation state
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub graph: DirectedGraph,
    pub trace: Option<TraceState>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            graph: DirectedGraph::new(),
            trace: None,
            created_at: now,
            last_access: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_access = Utc::now();
    }

    /// Drops the graph and any trace
    pub fn reset(&mut self) {
        self.graph = DirectedGraph::new();
        self.trace = None;
        self.touch();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            graph: WebGraph::from(&self.graph),
            total_steps: self.trace.as_ref().map(|t| t.steps.len()),
            current_step: self.trace.as_ref().map(|t| t.cursor),
            start: self.trace.as_ref().map(|t| t.start.clone()),
            created_at: self.created_at,
            last_access: self.last_access,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub graph: WebGraph,
    pub total_steps: Option<usize>,
    pub current_step: Option<usize>,
    pub start: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
}
