//! Bounded filter job queue

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use utoipa::ToSchema;

use crate::data::{DataError, FilteredFileRow, LogRepository};
use crate::domain::filter::{FilterError, FilterSet, filter_file};

/// One raw log to filter
#[derive(Debug, Clone)]
pub struct FilterJob {
    pub log_file_id: i64,
    pub raw_path: PathBuf,
    pub filters: FilterSet,
}

/// Lifecycle of a filter job, keyed by log file id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed {
        filtered_path: String,
        checksum: String,
    },
    Failed {
        error: String,
    },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Filter task failed: {0}")]
    Join(String),

    #[error("Filter job queue is closed")]
    QueueClosed,
}

/// Handle to a submitted job
#[derive(Debug)]
pub struct JobHandle {
    log_file_id: i64,
    handle: JoinHandle<Result<FilteredFileRow, JobError>>,
}

impl JobHandle {
    pub fn log_file_id(&self) -> i64 {
        self.log_file_id
    }

    /// Wait for the job to finish
    pub async fn wait(self) -> Result<FilteredFileRow, JobError> {
        self.handle
            .await
            .map_err(|e| JobError::Join(e.to_string()))?
    }
}

/// Runs filter jobs on blocking threads, at most `max_concurrent` at a time
#[derive(Clone)]
pub struct FilterJobQueue {
    repository: Arc<dyn LogRepository>,
    permits: Arc<Semaphore>,
    statuses: Arc<DashMap<i64, JobStatus>>,
    tracker: TaskTracker,
}

impl FilterJobQueue {
    pub fn new(repository: Arc<dyn LogRepository>, max_concurrent: usize) -> Self {
        Self {
            repository,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            statuses: Arc::new(DashMap::new()),
            tracker: TaskTracker::new(),
        }
    }

    /// Queue a job. Must be called from within a tokio runtime.
    pub fn submit(&self, job: FilterJob) -> Result<JobHandle, JobError> {
        if self.tracker.is_closed() {
            return Err(JobError::QueueClosed);
        }

        let log_file_id = job.log_file_id;
        self.statuses.insert(log_file_id, JobStatus::Pending);
        tracing::debug!(
            log_file_id,
            raw_path = %job.raw_path.display(),
            filters = job.filters.len(),
            "Filter job queued"
        );

        let worker = JobWorker {
            repository: self.repository.clone(),
            permits: self.permits.clone(),
            statuses: self.statuses.clone(),
        };
        let handle = self.tracker.spawn(worker.run(job));
        Ok(JobHandle {
            log_file_id,
            handle,
        })
    }

    pub fn status(&self, log_file_id: i64) -> Option<JobStatus> {
        self.statuses.get(&log_file_id).map(|s| s.clone())
    }

    /// Drop the status of a deleted log
    pub fn forget(&self, log_file_id: i64) {
        self.statuses.remove(&log_file_id);
    }

    /// Number of jobs queued or running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting jobs and wait for the in-flight ones.
    ///
    /// Returns false if the timeout elapsed first.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::debug!(count = pending, "Waiting for filter jobs to finish...");
        }
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    remaining = self.tracker.len(),
                    "Timeout waiting for filter jobs"
                );
                false
            }
        }
    }
}

struct JobWorker {
    repository: Arc<dyn LogRepository>,
    permits: Arc<Semaphore>,
    statuses: Arc<DashMap<i64, JobStatus>>,
}

impl JobWorker {
    async fn run(self, job: FilterJob) -> Result<FilteredFileRow, JobError> {
        let log_file_id = job.log_file_id;
        let result = self.execute(job).await;

        match &result {
            Ok(row) => {
                self.statuses.insert(
                    log_file_id,
                    JobStatus::Completed {
                        filtered_path: row.filtered_file_path.display().to_string(),
                        checksum: row.checksum.clone(),
                    },
                );
            }
            Err(JobError::Data(e)) if e.is_not_found() => {
                // Log was deleted while its job ran
                tracing::debug!(log_file_id, "Filter result dropped for deleted log");
                self.statuses.remove(&log_file_id);
            }
            Err(e) => {
                tracing::error!(log_file_id, error = %e, "Filter job failed");
                self.statuses.insert(
                    log_file_id,
                    JobStatus::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn execute(&self, job: FilterJob) -> Result<FilteredFileRow, JobError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| JobError::QueueClosed)?;

        let FilterJob {
            log_file_id,
            raw_path,
            filters,
        } = job;
        self.statuses.insert(log_file_id, JobStatus::Running);

        let outcome = tokio::task::spawn_blocking(move || filter_file(&raw_path, &filters))
            .await
            .map_err(|e| JobError::Join(e.to_string()))??;

        match self
            .repository
            .record_filter_result(
                log_file_id,
                &outcome.filtered_path,
                &outcome.checksum,
                Utc::now(),
            )
            .await
        {
            Ok(row) => {
                tracing::debug!(
                    log_file_id,
                    filtered_file_id = row.id,
                    lines_removed = outcome.lines_removed,
                    "Filter job completed"
                );
                Ok(row)
            }
            Err(e) => {
                // Nothing is kept for a result that could not be recorded
                if let Err(remove) = tokio::fs::remove_file(&outcome.filtered_path).await {
                    tracing::warn!(
                        path = %outcome.filtered_path.display(),
                        error = %remove,
                        "Failed to remove unrecorded filtered file"
                    );
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::data::{MemoryRepository, NewLogFile};

    async fn setup(dir: &Path, content: &str) -> (Arc<MemoryRepository>, i64, PathBuf) {
        let repo = Arc::new(MemoryRepository::new());
        let project = repo.create_project("p").await.unwrap();
        let raw_dir = dir.join("p_1").join("raw_logs");
        fs::create_dir_all(&raw_dir).unwrap();
        let raw_path = raw_dir.join("trace.log");
        fs::write(&raw_path, content).unwrap();
        let log = repo
            .add_log_file(NewLogFile {
                project_id: project.id,
                file_name: "trace.log".to_string(),
                file_path: raw_path.clone(),
                checksum: None,
            })
            .await
            .unwrap();
        (repo, log.id, raw_path)
    }

    fn job(log_file_id: i64, raw_path: &Path, filters: &[&str]) -> FilterJob {
        FilterJob {
            log_file_id,
            raw_path: raw_path.to_path_buf(),
            filters: FilterSet::parse(filters.iter().copied()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_job_records_result() {
        let dir = tempfile::tempdir().unwrap();
        let (repo, log_id, raw_path) = setup(dir.path(), "a keep\nb drop\nc keep\n").await;
        let queue = FilterJobQueue::new(repo.clone(), 2);

        let handle = queue.submit(job(log_id, &raw_path, &["1@@@drop"])).unwrap();
        assert_eq!(handle.log_file_id(), log_id);
        let row = handle.wait().await.unwrap();

        assert_eq!(fs::read_to_string(&row.filtered_file_path).unwrap(), "a keep\nc keep\n");
        assert_eq!(row.filtered_file_name, "trace.log");
        assert!(matches!(
            queue.status(log_id),
            Some(JobStatus::Completed { checksum, .. }) if checksum == row.checksum
        ));
        assert_eq!(repo.filtered_log_paths(1).await.unwrap(), vec![row.filtered_file_path]);
    }

    #[tokio::test]
    async fn test_failed_job_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (repo, log_id, raw_path) = setup(dir.path(), "a b\n").await;
        let queue = FilterJobQueue::new(repo.clone(), 1);

        // Column 5 does not exist in a two-token record
        let err = queue
            .submit(job(log_id, &raw_path, &["5@@@x"]))
            .unwrap()
            .wait()
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Filter(ref e) if e.is_malformed_record()));
        assert!(matches!(queue.status(log_id), Some(JobStatus::Failed { .. })));
        assert!(repo.list_filtered_files(1).await.unwrap().is_empty());
        assert!(!dir.path().join("p_1/processed_logs/trace.log").exists());
    }

    #[tokio::test]
    async fn test_deleted_log_drops_result() {
        let dir = tempfile::tempdir().unwrap();
        let (repo, log_id, raw_path) = setup(dir.path(), "a b\n").await;
        repo.delete_log_file(1, log_id).await.unwrap();
        let queue = FilterJobQueue::new(repo.clone(), 1);

        let err = queue
            .submit(job(log_id, &raw_path, &[]))
            .unwrap()
            .wait()
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Data(_)));
        assert_eq!(queue.status(log_id), None);
        assert!(!dir.path().join("p_1/processed_logs/trace.log").exists());
    }

    #[tokio::test]
    async fn test_shutdown_waits_and_rejects_new_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let (repo, log_id, raw_path) = setup(dir.path(), "x\n").await;
        let queue = FilterJobQueue::new(repo, 1);

        let handle = queue.submit(job(log_id, &raw_path, &[])).unwrap();
        assert!(queue.shutdown(Duration::from_secs(5)).await);
        assert_eq!(queue.in_flight(), 0);
        assert!(handle.wait().await.is_ok());

        assert!(matches!(
            queue.submit(job(log_id, &raw_path, &[])),
            Err(JobError::QueueClosed)
        ));
    }

    #[test]
    fn test_status_json_shape() {
        let status = JobStatus::Completed {
            filtered_path: "/a".to_string(),
            checksum: "ff".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"state": "completed", "filtered_path": "/a", "checksum": "ff"})
        );
        assert!(status.is_finished());
        assert!(!JobStatus::Pending.is_finished());
    }
}
