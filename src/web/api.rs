use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

use crate::algorithm::trace::compute_trace;
use crate::data_structures::BucketQueue;
use crate::graph::{Graph, MutableGraph};
use crate::web::models::*;
use crate::Error;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    pub max_sessions: usize,
    pub session_timeout: Duration,
    /// Largest bucket array a stored trace may copy into each snapshot
    pub max_buckets: usize,
    /// Largest `steps * buckets` product a stored trace may hold
    pub max_trace_cells: usize,
}

impl AppState {
    pub fn new(max_sessions: usize, session_timeout_minutes: u64) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_sessions,
            session_timeout: Duration::minutes(session_timeout_minutes.min(1_000_000) as i64),
            max_buckets: 100_000,
            max_trace_cells: 50_000_000,
        }
    }

    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    pub fn with_max_trace_cells(mut self, max_trace_cells: usize) -> Self {
        self.max_trace_cells = max_trace_cells;
        self
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Session>>, ApiError> {
        self.sessions.lock().map_err(|_| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_store_poisoned",
                "Session store is unavailable".to_string(),
            )
        })
    }

    /// Runs `f` on a session, refreshing its last access time
    fn with_session<T, F>(&self, session_id: Uuid, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Session) -> Result<T, ApiError>,
    {
        let mut sessions = self.lock_sessions()?;
        let session = sessions.get_mut(&session_id).ok_or_else(session_not_found)?;
        session.touch();
        f(session)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(1000, 60)
    }
}

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:session_id", get(get_session).delete(delete_session))
        .route("/api/sessions/:session_id/reset", post(reset_session))
        .route("/api/sessions/:session_id/graph", get(get_graph))
        .route("/api/sessions/:session_id/nodes", post(add_node))
        .route("/api/sessions/:session_id/edges", post(add_edge))
        .route("/api/sessions/:session_id/run", post(run_trace))
        .route("/api/sessions/:session_id/steps/next", post(next_step))
        .route("/api/sessions/:session_id/steps/prev", post(prev_step))
        .route("/api/sessions/:session_id/steps/:index", get(get_step))
}

/// Create a new session with an empty graph
pub async fn create_session(State(state): State<AppState>) -> Result<Json<SessionSummary>, ApiError> {
    let mut sessions = state.lock_sessions()?;

    let now = Utc::now();
    let before = sessions.len();
    sessions.retain(|_, session| now - session.last_access <= state.session_timeout);
    if sessions.len() < before {
        log::info!("Pruned {} expired sessions", before - sessions.len());
    }

    if sessions.len() >= state.max_sessions {
        log::warn!("Session limit of {} reached", state.max_sessions);
        return Err(api_error(
            StatusCode::CONFLICT,
            "session_limit",
            format!("Session limit of {} reached", state.max_sessions),
        ));
    }

    let session = Session::new();
    let summary = session.summary();
    log::info!("Created session {}", session.id);
    sessions.insert(session.id, session);

    Ok(Json(summary))
}

/// List all active sessions
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<Uuid>>, ApiError> {
    let sessions = state.lock_sessions()?;
    let mut session_ids: Vec<Uuid> = sessions.keys().cloned().collect();
    session_ids.sort();
    Ok(Json(session_ids))
}

/// Get session information
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, ApiError> {
    state.with_session(session_id, |session| Ok(Json(session.summary())))
}

/// Remove a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.lock_sessions()?;
    match sessions.remove(&session_id) {
        Some(_) => {
            log::info!("Deleted session {}", session_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found()),
    }
}

/// Clear the graph and trace of a session
pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, ApiError> {
    state.with_session(session_id, |session| {
        session.reset();
        Ok(Json(session.summary()))
    })
}

/// Get graph data for a session
pub async fn get_graph(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WebGraph>, ApiError> {
    state.with_session(session_id, |session| Ok(Json(WebGraph::from(&session.graph))))
}

/// Add a node to the session graph
pub async fn add_node(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AddNodeRequest>,
) -> Result<Json<WebGraph>, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(empty_name());
    }

    state.with_session(session_id, |session| {
        session.graph.add_node(name);
        Ok(Json(WebGraph::from(&session.graph)))
    })
}

/// Add a directed edge to the session graph
pub async fn add_edge(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AddEdgeRequest>,
) -> Result<Json<WebGraph>, ApiError> {
    let from = request.from.trim();
    let to = request.to.trim();
    if from.is_empty() || to.is_empty() {
        return Err(empty_name());
    }
    if from == to {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "self_loop",
            format!("Edge from '{}' to itself is not allowed", from),
        ));
    }

    state.with_session(session_id, |session| {
        session.graph.add_edge(from, to, request.weight).map_err(error_response)?;
        Ok(Json(WebGraph::from(&session.graph)))
    })
}

/// Compute and store the trace of a run from `start`
pub async fn run_trace(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let (max_buckets, max_trace_cells) = (state.max_buckets, state.max_trace_cells);
    state.with_session(session_id, |session| {
        let graph = &session.graph;
        let buckets = BucketQueue::<usize>::required_capacity(graph.node_count(), graph.max_weight())
            .map_err(error_response)?;
        if buckets > max_buckets {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "trace_too_large",
                format!("Trace needs {} buckets, the limit is {}", buckets, max_buckets),
            ));
        }

        // Every snapshot copies the whole bucket array
        let cells = max_trace_steps(graph).and_then(|steps| steps.checked_mul(buckets));
        match cells {
            Some(cells) if cells <= max_trace_cells => {}
            _ => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "trace_too_large",
                    format!(
                        "Trace may need {} bucket cells, the limit is {}",
                        cells.map_or_else(|| "too many".to_string(), |c| c.to_string()),
                        max_trace_cells
                    ),
                ));
            }
        }

        let start_time = Instant::now();
        let steps = compute_trace(&session.graph, &request.start).map_err(error_response)?;
        let execution_time = start_time.elapsed();

        let first_step = steps.first().cloned().ok_or_else(|| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "empty_trace",
                "Trace produced no steps".to_string(),
            )
        })?;

        let execution_id = Uuid::new_v4();
        log::info!(
            "Session {}: trace from '{}' with {} steps in {:?}",
            session_id,
            request.start,
            steps.len(),
            execution_time
        );

        let response = RunResponse {
            execution_id,
            start: request.start.clone(),
            total_steps: steps.len(),
            execution_time_ms: execution_time.as_secs_f64() * 1000.0,
            first_step,
        };

        session.trace = Some(TraceState {
            execution_id,
            start: request.start,
            steps,
            cursor: 0,
        });

        Ok(Json(response))
    })
}

/// Get one snapshot of the stored trace without moving the cursor
pub async fn get_step(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Result<Json<StepResponse>, ApiError> {
    state.with_session(session_id, |session| {
        let trace = session.trace.as_ref().ok_or_else(no_trace)?;
        let snapshot = trace.steps.get(index).cloned().ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "step_out_of_range",
                format!("Step {} is outside 0..{}", index, trace.steps.len()),
            )
        })?;

        Ok(Json(StepResponse {
            index,
            total_steps: trace.steps.len(),
            snapshot,
        }))
    })
}

/// Advance the cursor by one step, staying on the last one
pub async fn next_step(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StepResponse>, ApiError> {
    move_cursor(&state, session_id, |cursor, len| (cursor + 1).min(len - 1))
}

/// Move the cursor back by one step, staying on the first one
pub async fn prev_step(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StepResponse>, ApiError> {
    move_cursor(&state, session_id, |cursor, _| cursor.saturating_sub(1))
}

/// Health check endpoint
pub async fn health_check() -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

// Helper functions

fn move_cursor<F>(state: &AppState, session_id: Uuid, step: F) -> Result<Json<StepResponse>, ApiError>
where
    F: FnOnce(usize, usize) -> usize,
{
    state.with_session(session_id, |session| {
        let trace = session.trace.as_mut().ok_or_else(no_trace)?;
        let total_steps = trace.steps.len();
        if total_steps == 0 {
            return Err(no_trace());
        }

        trace.cursor = step(trace.cursor, total_steps);
        Ok(Json(StepResponse {
            index: trace.cursor,
            total_steps,
            snapshot: trace.steps[trace.cursor].clone(),
        }))
    })
}

fn api_error(status: StatusCode, error: &str, message: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
            details: None,
        }),
    )
}

fn error_response(err: Error) -> ApiError {
    let (status, code) = match &err {
        Error::InvalidWeight(_) => (StatusCode::BAD_REQUEST, "invalid_weight"),
        Error::NodeNotFound(_) => (StatusCode::NOT_FOUND, "node_not_found"),
        Error::InvariantViolation { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation"),
        Error::CapacityOverflow { .. } => (StatusCode::BAD_REQUEST, "capacity_overflow"),
    };
    if status.is_server_error() {
        log::error!("Trace failed: {}", err);
    }
    api_error(status, code, err.to_string())
}

fn session_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "session_not_found", "Session not found".to_string())
}

fn no_trace() -> ApiError {
    api_error(
        StatusCode::CONFLICT,
        "no_trace",
        "Run the algorithm before navigating steps".to_string(),
    )
}

fn empty_name() -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        "empty_name",
        "Node name must not be empty".to_string(),
    )
}

/// Upper bound on snapshots in a trace: init, one process per node,
/// an examine and a relax per edge, done
fn max_trace_steps<G: Graph>(graph: &G) -> Option<usize> {
    graph
        .edge_count()
        .checked_mul(2)?
        .checked_add(graph.node_count())?
        .checked_add(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::trace::StepKind;
    use crate::algorithm::Distance;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn session_with_sample_graph(state: &AppState) -> Uuid {
        let Json(summary) = create_session(State(state.clone())).await.unwrap();
        let id = summary.id;
        for (from, to, weight) in [("A", "B", 2), ("A", "C", 4), ("B", "C", 1), ("B", "D", 7), ("C", "D", 3)] {
            add_edge(
                State(state.clone()),
                Path(id),
                Json(AddEdgeRequest {
                    from: from.to_string(),
                    to: to.to_string(),
                    weight,
                }),
            )
            .await
            .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_build_graph_and_run() {
        let state = AppState::default();
        let id = session_with_sample_graph(&state).await;

        let Json(graph) = get_graph(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(graph.nodes, vec!["A", "B", "C", "D"]);
        assert_eq!(graph.links.len(), 5);
        assert_eq!(graph.max_weight, 7);

        let Json(run) = run_trace(
            State(state.clone()),
            Path(id),
            Json(RunRequest { start: "A".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(run.first_step.kind, StepKind::Init);

        let last_index = run.total_steps - 1;
        let Json(last) = get_step(State(state.clone()), Path((id, last_index))).await.unwrap();
        assert!(last.snapshot.is_final);
        assert_eq!(last.snapshot.distance("D"), Distance::Finite(6));

        let err = get_step(State(state.clone()), Path((id, run.total_steps))).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_step_navigation_is_clamped() {
        let state = AppState::default();
        let id = session_with_sample_graph(&state).await;

        let err = next_step(State(state.clone()), Path(id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let Json(run) = run_trace(
            State(state.clone()),
            Path(id),
            Json(RunRequest { start: "A".to_string() }),
        )
        .await
        .unwrap();

        let Json(prev) = prev_step(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(prev.index, 0);

        let Json(next) = next_step(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(next.index, 1);
        assert_eq!(next.snapshot.kind, StepKind::Process);

        for _ in 0..run.total_steps + 3 {
            next_step(State(state.clone()), Path(id)).await.unwrap();
        }
        let Json(summary) = get_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(summary.current_step, Some(run.total_steps - 1));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let state = AppState::default();
        let Json(summary) = create_session(State(state.clone())).await.unwrap();
        let id = summary.id;

        let edge = |from: &str, to: &str, weight: i64| {
            Json(AddEdgeRequest {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            })
        };

        let err = add_edge(State(state.clone()), Path(id), edge("A", "B", -3)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.error, "invalid_weight");

        let err = add_edge(State(state.clone()), Path(id), edge("A", "A", 1)).await.unwrap_err();
        assert_eq!(err.1.error, "self_loop");

        let err = add_node(State(state.clone()), Path(id), Json(AddNodeRequest { name: "  ".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.1.error, "empty_name");

        let err = run_trace(State(state.clone()), Path(id), Json(RunRequest { start: "A".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(err.1.error, "node_not_found");

        let err = get_graph(State(state.clone()), Path(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.1.error, "session_not_found");
    }

    #[tokio::test]
    async fn test_session_limit_and_reset() {
        let state = AppState::new(1, 60);
        let id = session_with_sample_graph(&state).await;

        let err = create_session(State(state.clone())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let Json(summary) = reset_session(State(state.clone()), Path(id)).await.unwrap();
        assert!(summary.graph.nodes.is_empty());
        assert_eq!(summary.total_steps, None);

        assert_eq!(delete_session(State(state.clone()), Path(id)).await.unwrap(), StatusCode::NO_CONTENT);
        assert!(create_session(State(state.clone())).await.is_ok());
    }

    #[tokio::test]
    async fn test_bucket_limit_rejects_large_traces() {
        let state = AppState::default().with_max_buckets(20);
        let id = session_with_sample_graph(&state).await;

        // 4 nodes * max weight 7 + 1 = 29 buckets
        let err = run_trace(State(state.clone()), Path(id), Json(RunRequest { start: "A".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.1.error, "trace_too_large");
    }

    #[tokio::test]
    async fn test_trace_cell_limit_counts_every_snapshot() {
        // 29 buckets, at most 2 + 4 + 2 * 5 = 16 snapshots: 464 cells
        let state = AppState::default().with_max_trace_cells(400);
        let id = session_with_sample_graph(&state).await;

        let err = run_trace(State(state.clone()), Path(id), Json(RunRequest { start: "A".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.error, "trace_too_large");
        assert!(err.1.message.contains("464"));

        let state = AppState::default().with_max_trace_cells(464);
        let id = session_with_sample_graph(&state).await;
        assert!(run_trace(State(state.clone()), Path(id), Json(RunRequest { start: "A".to_string() }))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned() {
        let state = AppState::new(1, 0);
        let Json(first) = create_session(State(state.clone())).await.unwrap();
        {
            let mut sessions = state.sessions.lock().unwrap();
            let session = sessions.get_mut(&first.id).unwrap();
            session.last_access = Utc::now() - Duration::minutes(5);
        }

        let Json(second) = create_session(State(state.clone())).await.unwrap();
        let Json(ids) = list_sessions(State(state.clone())).await.unwrap();
        assert_eq!(ids, vec![second.id]);
    }

    #[tokio::test]
    async fn test_router_serves_health_and_sessions() {
        let app = create_router().with_state(AppState::default());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["graph"]["nodes"].as_array().unwrap().is_empty());
    }
}
