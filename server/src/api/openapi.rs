//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{graph, health, logs, projects};
use crate::domain::graph::{Graph, GraphEdge, GraphNode, NodeType};
use crate::domain::jobs::JobStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TraceGraph API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Trace log filtering and program/file dataflow graphs"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "projects", description = "Project management"),
        (name = "logs", description = "Raw log upload and filtering"),
        (name = "graph", description = "Dataflow graph")
    ),
    paths(
        // Health
        health::health,
        // Projects
        projects::list_projects,
        projects::create_project,
        projects::delete_project,
        // Logs
        logs::list_log_files,
        logs::upload_log,
        logs::list_processed_files,
        logs::delete_log_file,
        logs::get_job_status,
        // Graph
        graph::get_graph,
    ),
    components(schemas(
        // Health
        health::HealthResponse,
        // Projects
        projects::types::ProjectDto,
        projects::types::CreateProjectRequest,
        // Logs
        logs::types::LogFileDto,
        logs::types::FilteredFileDto,
        logs::types::UploadLogRequest,
        logs::types::JobStatusDto,
        JobStatus,
        // Graph
        Graph,
        GraphNode,
        GraphEdge,
        NodeType,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/v1/projects/{project_id}/graph"));
        assert!(paths.contains_key("/api/v1/projects/{project_id}/logs/{file_id}/job"));
        assert!(doc["components"]["schemas"].get("GraphNode").is_some());
    }
}
