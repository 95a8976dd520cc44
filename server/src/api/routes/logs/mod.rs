//! Log file API endpoints
//!
//! Uploads are written to the project's raw log area and filtered in the
//! background; the filtered copy appears under `processed_logs` once the
//! job completes.

pub mod types;

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::extractors::{LogFilePath, ProjectPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::core::AppStorage;
use crate::data::{LogRepository, NewLogFile, ProjectRow};
use crate::domain::filter::FilterSet;
use crate::domain::jobs::{FilterJob, FilterJobQueue, JobError};
use crate::utils::crypto::sha256_hex;
use crate::utils::file::{has_allowed_extension, remove_file_if_exists, sanitize_file_name};

use types::{FilteredFileDto, JobStatusDto, LogFileDto, UploadLogRequest};

/// Shared state for Logs API endpoints
#[derive(Clone)]
pub struct LogsApiState {
    pub repository: Arc<dyn LogRepository>,
    pub jobs: FilterJobQueue,
    pub storage: AppStorage,
}

/// Build Logs API routes (nested under `/projects/{project_id}/logs`)
pub fn routes(
    repository: Arc<dyn LogRepository>,
    jobs: FilterJobQueue,
    storage: AppStorage,
) -> Router<()> {
    let state = LogsApiState {
        repository,
        jobs,
        storage,
    };

    Router::new()
        .route("/", get(list_log_files).post(upload_log))
        .route("/processed", get(list_processed_files))
        .route("/{file_id}", delete(delete_log_file))
        .route("/{file_id}/job", get(get_job_status))
        .with_state(state)
}

async fn require_project(state: &LogsApiState, project_id: i64) -> Result<ProjectRow, ApiError> {
    state
        .repository
        .get_project(project_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::project_not_found(project_id))
}

/// List raw log files of a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/logs",
    tag = "logs",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Raw log files in upload order", body = [LogFileDto]),
        (status = 404, description = "Project not found")
    )
)]
pub async fn list_log_files(
    State(state): State<LogsApiState>,
    path: ProjectPath,
) -> Result<Json<Vec<LogFileDto>>, ApiError> {
    require_project(&state, path.project_id).await?;

    let log_files = state
        .repository
        .list_log_files(path.project_id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(log_files.into_iter().map(LogFileDto::from).collect()))
}

/// Upload a raw log and start filtering it
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/logs",
    tag = "logs",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    request_body = UploadLogRequest,
    responses(
        (status = 202, description = "Log stored, filter job queued", body = LogFileDto),
        (status = 400, description = "Invalid file name, file type or filter"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "A log with this file name already exists in the project"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn upload_log(
    State(state): State<LogsApiState>,
    path: ProjectPath,
    ValidatedJson(body): ValidatedJson<UploadLogRequest>,
) -> Result<(StatusCode, Json<LogFileDto>), ApiError> {
    let project = require_project(&state, path.project_id).await?;

    let file_name = sanitize_file_name(&body.file_name).ok_or_else(|| {
        ApiError::bad_request("INVALID_FILE_NAME", "File name is empty after sanitizing")
    })?;
    if !has_allowed_extension(&file_name) {
        return Err(ApiError::bad_request(
            "UNSUPPORTED_FILE_TYPE",
            format!("Unsupported log file type: {}", file_name),
        ));
    }

    // Reject bad filters before anything is written
    let filters = FilterSet::parse(&body.filters).map_err(ApiError::from_filter)?;

    let raw_dir = state.storage.project_raw_dir(&project.name, project.id);
    let raw_path = raw_dir.join(&file_name);

    // The record claims the file name before anything is written
    let log_file = state
        .repository
        .add_log_file(NewLogFile {
            project_id: project.id,
            file_name,
            file_path: raw_path.clone(),
            checksum: Some(sha256_hex(body.content.as_bytes())),
        })
        .await
        .map_err(ApiError::from_data)?;

    if let Err(e) = write_raw_log(&raw_dir, &raw_path, body.content.as_bytes()).await {
        if let Err(cleanup) = state
            .repository
            .delete_log_file(project.id, log_file.id)
            .await
        {
            tracing::warn!(
                log_file_id = log_file.id,
                error = %cleanup,
                "Failed to drop unsaved log record"
            );
        }
        return Err(ApiError::from_io(e));
    }

    tracing::info!(
        project_id = project.id,
        log_file_id = log_file.id,
        path = %raw_path.display(),
        bytes = body.content.len(),
        filters = filters.len(),
        "Log uploaded"
    );

    state
        .jobs
        .submit(FilterJob {
            log_file_id: log_file.id,
            raw_path,
            filters,
        })
        .map_err(|e| match e {
            JobError::QueueClosed => ApiError::service_unavailable("Server is shutting down"),
            other => ApiError::internal(other.to_string()),
        })?;

    Ok((StatusCode::ACCEPTED, Json(LogFileDto::from(log_file))))
}

/// List filtered log files of a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/logs/processed",
    tag = "logs",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Filtered log files", body = [FilteredFileDto]),
        (status = 404, description = "Project not found")
    )
)]
pub async fn list_processed_files(
    State(state): State<LogsApiState>,
    path: ProjectPath,
) -> Result<Json<Vec<FilteredFileDto>>, ApiError> {
    require_project(&state, path.project_id).await?;

    let filtered = state
        .repository
        .list_filtered_files(path.project_id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(filtered.into_iter().map(FilteredFileDto::from).collect()))
}

async fn write_raw_log(raw_dir: &Path, raw_path: &Path, content: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(raw_dir).await?;
    tokio::fs::write(raw_path, content).await
}

/// Delete a log file with its raw and filtered copies
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}/logs/{file_id}",
    tag = "logs",
    params(
        ("project_id" = i64, Path, description = "Project ID"),
        ("file_id" = i64, Path, description = "Log file ID")
    ),
    responses(
        (status = 204, description = "Log file deleted"),
        (status = 404, description = "Log file not found in project")
    )
)]
pub async fn delete_log_file(
    State(state): State<LogsApiState>,
    path: LogFilePath,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .repository
        .delete_log_file(path.project_id, path.file_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::log_file_not_found(path.file_id))?;

    state.jobs.forget(path.file_id);

    let files = std::iter::once(&removed.log_file.file_path)
        .chain(removed.filtered_files.iter().map(|f| &f.filtered_file_path));
    for file in files {
        if let Err(e) = remove_file_if_exists(file).await {
            tracing::warn!(path = %file.display(), error = %e, "Failed to remove log file");
        }
    }

    tracing::info!(
        project_id = path.project_id,
        log_file_id = path.file_id,
        "Log file deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Filter job status of a log file
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/logs/{file_id}/job",
    tag = "logs",
    params(
        ("project_id" = i64, Path, description = "Project ID"),
        ("file_id" = i64, Path, description = "Log file ID")
    ),
    responses(
        (status = 200, description = "Job status", body = JobStatusDto),
        (status = 404, description = "Log file or job not found")
    )
)]
pub async fn get_job_status(
    State(state): State<LogsApiState>,
    path: LogFilePath,
) -> Result<Json<JobStatusDto>, ApiError> {
    let log_file = state
        .repository
        .get_log_file(path.file_id)
        .await
        .map_err(ApiError::from_data)?
        .filter(|l| l.project_id == path.project_id)
        .ok_or_else(|| ApiError::log_file_not_found(path.file_id))?;

    let status = state.jobs.status(log_file.id).ok_or_else(|| {
        ApiError::not_found(
            "JOB_NOT_FOUND",
            format!("No filter job for log file: {}", log_file.id),
        )
    })?;

    Ok(Json(JobStatusDto {
        log_file_id: log_file.id,
        status,
    }))
}
