//! Dataflow graph endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::ProjectPath;
use crate::api::types::ApiError;
use crate::data::LogRepository;
use crate::domain::graph::{Graph, build_graph};
use crate::domain::trace::TraceSchema;

/// Shared state for the Graph API endpoint
#[derive(Clone)]
pub struct GraphApiState {
    pub repository: Arc<dyn LogRepository>,
    pub schema: TraceSchema,
}

/// Build Graph API routes (nested under `/projects/{project_id}/graph`)
pub fn routes(repository: Arc<dyn LogRepository>, schema: TraceSchema) -> Router<()> {
    Router::new()
        .route("/", get(get_graph))
        .with_state(GraphApiState { repository, schema })
}

/// Program/file dataflow graph over the project's filtered logs
///
/// Logs are taken in upload order; logs whose filter job has not
/// completed are left out.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/graph",
    tag = "graph",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Dataflow graph", body = Graph),
        (status = 404, description = "Project not found"),
        (status = 500, description = "A filtered log could not be read or parsed")
    )
)]
pub async fn get_graph(
    State(state): State<GraphApiState>,
    path: ProjectPath,
) -> Result<Json<Graph>, ApiError> {
    state
        .repository
        .get_project(path.project_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::project_not_found(path.project_id))?;

    let logs = state
        .repository
        .filtered_log_paths(path.project_id)
        .await
        .map_err(ApiError::from_data)?;

    let schema = state.schema;
    let graph = tokio::task::spawn_blocking(move || build_graph(&logs, schema))
        .await
        .map_err(|e| ApiError::internal(format!("Graph task failed: {}", e)))?
        .map_err(ApiError::from_graph)?;

    tracing::debug!(
        project_id = path.project_id,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Graph built"
    );
    Ok(Json(graph))
}
