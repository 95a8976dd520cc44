//! Project API endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::extractors::{ProjectPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::core::AppStorage;
use crate::data::LogRepository;
use crate::domain::jobs::FilterJobQueue;
use crate::utils::file::remove_dir_all_if_exists;

use types::{CreateProjectRequest, ProjectDto};

/// Shared state for Projects API endpoints
#[derive(Clone)]
pub struct ProjectsApiState {
    pub repository: Arc<dyn LogRepository>,
    pub jobs: FilterJobQueue,
    pub storage: AppStorage,
}

/// Build Projects API routes
pub fn routes(
    repository: Arc<dyn LogRepository>,
    jobs: FilterJobQueue,
    storage: AppStorage,
) -> Router<()> {
    let state = ProjectsApiState {
        repository,
        jobs,
        storage,
    };

    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/{project_id}", delete(delete_project))
        .with_state(state)
}

/// List all projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "projects",
    responses(
        (status = 200, description = "All projects", body = [ProjectDto])
    )
)]
pub async fn list_projects(
    State(state): State<ProjectsApiState>,
) -> Result<Json<Vec<ProjectDto>>, ApiError> {
    let projects = state
        .repository
        .list_projects()
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(projects.into_iter().map(ProjectDto::from).collect()))
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectDto),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Project name already exists")
    )
)]
pub async fn create_project(
    State(state): State<ProjectsApiState>,
    ValidatedJson(body): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectDto>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request(
            "INVALID_PROJECT_NAME",
            "Project name must not be blank",
        ));
    }

    let project = state
        .repository
        .create_project(name)
        .await
        .map_err(ApiError::from_data)?;

    Ok((StatusCode::CREATED, Json(ProjectDto::from(project))))
}

/// Delete a project, its records and its upload directory
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(
    State(state): State<ProjectsApiState>,
    path: ProjectPath,
) -> Result<StatusCode, ApiError> {
    let repo = &state.repository;

    let log_files = repo
        .list_log_files(path.project_id)
        .await
        .map_err(ApiError::from_data)?;

    let project = repo
        .delete_project(path.project_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::project_not_found(path.project_id))?;

    for log_file in &log_files {
        state.jobs.forget(log_file.id);
    }

    let project_dir = state.storage.project_dir(&project.name, project.id);
    if let Err(e) = remove_dir_all_if_exists(&project_dir).await {
        // Records are already gone; leftover files are only logged
        tracing::warn!(
            path = %project_dir.display(),
            error = %e,
            "Failed to remove project upload directory"
        );
    }

    tracing::info!(project_id = project.id, name = %project.name, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
