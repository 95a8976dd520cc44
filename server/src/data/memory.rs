//! In-memory record store
//!
//! All records live behind one `RwLock`. Ids are sequential per entity,
//! starting at 1, so `BTreeMap` iteration order is insertion order.
//! Records are lost when the process exits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::error::DataError;
use super::traits::LogRepository;
use super::types::{FilteredFileRow, LogFileRow, NewLogFile, ProjectRow, RemovedLogFile};

#[derive(Default)]
struct State {
    projects: BTreeMap<i64, ProjectRow>,
    log_files: BTreeMap<i64, LogFileRow>,
    filtered_files: BTreeMap<i64, FilteredFileRow>,
    next_project_id: i64,
    next_log_file_id: i64,
    next_filtered_file_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn remove_filtered_for(&mut self, log_file_id: i64) -> Vec<FilteredFileRow> {
        let ids: Vec<i64> = self
            .filtered_files
            .values()
            .filter(|f| f.log_file_id == log_file_id)
            .map(|f| f.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.filtered_files.remove(&id))
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogRepository for MemoryRepository {
    async fn create_project(&self, name: &str) -> Result<ProjectRow, DataError> {
        let mut state = self.state.write();
        if state.projects.values().any(|p| p.name == name) {
            return Err(DataError::Conflict(format!(
                "Project name already exists: {}",
                name
            )));
        }
        let id = State::next_id(&mut state.next_project_id);
        let row = ProjectRow {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.projects.insert(id, row.clone());
        tracing::debug!(project_id = id, name, "Project created");
        Ok(row)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRow>, DataError> {
        Ok(self.state.read().projects.values().cloned().collect())
    }

    async fn get_project(&self, project_id: i64) -> Result<Option<ProjectRow>, DataError> {
        Ok(self.state.read().projects.get(&project_id).cloned())
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Option<ProjectRow>, DataError> {
        Ok(self
            .state
            .read()
            .projects
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn delete_project(&self, project_id: i64) -> Result<Option<ProjectRow>, DataError> {
        let mut state = self.state.write();
        let Some(project) = state.projects.remove(&project_id) else {
            return Ok(None);
        };

        let log_ids: Vec<i64> = state
            .log_files
            .values()
            .filter(|l| l.project_id == project_id)
            .map(|l| l.id)
            .collect();
        for id in &log_ids {
            state.log_files.remove(id);
            state.remove_filtered_for(*id);
        }

        tracing::debug!(project_id, log_files = log_ids.len(), "Project deleted");
        Ok(Some(project))
    }

    async fn add_log_file(&self, log_file: NewLogFile) -> Result<LogFileRow, DataError> {
        let mut state = self.state.write();
        if !state.projects.contains_key(&log_file.project_id) {
            return Err(DataError::project_not_found(log_file.project_id));
        }
        // Raw and filtered copies are stored under the file name
        if state
            .log_files
            .values()
            .any(|l| l.project_id == log_file.project_id && l.file_name == log_file.file_name)
        {
            return Err(DataError::Conflict(format!(
                "Log file already exists in project: {}",
                log_file.file_name
            )));
        }
        let id = State::next_id(&mut state.next_log_file_id);
        let row = LogFileRow {
            id,
            project_id: log_file.project_id,
            file_name: log_file.file_name,
            file_path: log_file.file_path,
            checksum: log_file.checksum,
            processed_time: Some(Utc::now()),
        };
        state.log_files.insert(id, row.clone());
        Ok(row)
    }

    async fn get_log_file(&self, log_file_id: i64) -> Result<Option<LogFileRow>, DataError> {
        Ok(self.state.read().log_files.get(&log_file_id).cloned())
    }

    async fn list_log_files(&self, project_id: i64) -> Result<Vec<LogFileRow>, DataError> {
        Ok(self
            .state
            .read()
            .log_files
            .values()
            .filter(|l| l.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_log_file(
        &self,
        project_id: i64,
        log_file_id: i64,
    ) -> Result<Option<RemovedLogFile>, DataError> {
        let mut state = self.state.write();
        let belongs = state
            .log_files
            .get(&log_file_id)
            .is_some_and(|l| l.project_id == project_id);
        if !belongs {
            return Ok(None);
        }
        let Some(log_file) = state.log_files.remove(&log_file_id) else {
            return Ok(None);
        };
        let filtered_files = state.remove_filtered_for(log_file_id);
        Ok(Some(RemovedLogFile {
            log_file,
            filtered_files,
        }))
    }

    async fn record_filter_result(
        &self,
        log_file_id: i64,
        filtered_path: &Path,
        checksum: &str,
        processed_time: DateTime<Utc>,
    ) -> Result<FilteredFileRow, DataError> {
        let mut state = self.state.write();
        // The log may have been deleted while its filter job was running
        if !state.log_files.contains_key(&log_file_id) {
            return Err(DataError::log_file_not_found(log_file_id));
        }
        let id = State::next_id(&mut state.next_filtered_file_id);
        let row = FilteredFileRow {
            id,
            log_file_id,
            filtered_file_name: filtered_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filtered_file_path: filtered_path.to_path_buf(),
            checksum: checksum.to_string(),
            processed_time,
        };
        state.filtered_files.insert(id, row.clone());
        Ok(row)
    }

    async fn list_filtered_files(
        &self,
        project_id: i64,
    ) -> Result<Vec<FilteredFileRow>, DataError> {
        let state = self.state.read();
        Ok(state
            .filtered_files
            .values()
            .filter(|f| {
                state
                    .log_files
                    .get(&f.log_file_id)
                    .is_some_and(|l| l.project_id == project_id)
            })
            .cloned()
            .collect())
    }

    async fn filtered_log_paths(&self, project_id: i64) -> Result<Vec<PathBuf>, DataError> {
        let state = self.state.read();
        Ok(state
            .log_files
            .values()
            .filter(|l| l.project_id == project_id)
            .filter_map(|l| {
                state
                    .filtered_files
                    .values()
                    .rev()
                    .find(|f| f.log_file_id == l.id)
                    .map(|f| f.filtered_file_path.clone())
            })
            .collect())
    }
}
