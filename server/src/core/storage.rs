//! Platform-aware data storage directory management
//!
//! ## Platform Paths
//!
//! | Type | Windows | macOS | Linux |
//! |------|---------|-------|-------|
//! | Data | `%APPDATA%\TraceGraph\` | `~/Library/Application Support/TraceGraph/` | `$XDG_DATA_HOME/tracegraph/` |
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/uploads/<project>_<id>/raw_logs/<file>
//! <data_dir>/uploads/<project>_<id>/processed_logs/<file>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::config::AppConfig;
use super::constants::{APP_DOT_FOLDER, APP_NAME, ENV_DATA_DIR};
use crate::domain::filter::RAW_LOGS_DIR;
use crate::utils::file::{expand_path, sanitize_file_name};

/// Data subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSubdir {
    Uploads,
    Debug,
}

impl DataSubdir {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataSubdir::Uploads => "uploads",
            DataSubdir::Debug => "debug",
        }
    }

    /// Returns subdirectories that should always be created.
    /// Debug is excluded - it's only created when debug mode is enabled.
    pub const fn all() -> &'static [DataSubdir] {
        &[DataSubdir::Uploads]
    }
}

/// Application storage manager
#[derive(Debug, Clone)]
pub struct AppStorage {
    data_dir: PathBuf,
}

impl AppStorage {
    /// Initialize storage with the configured or platform-appropriate data directory
    pub async fn init(config: &AppConfig) -> Result<Self> {
        let data_dir = match &config.storage.data_dir {
            Some(dir) => expand_path(dir),
            None => Self::resolve_data_dir(),
        };

        // Create directories first (canonicalize requires path to exist)
        Self::ensure_directories_static(&data_dir, config.debug).await?;

        // Now canonicalize to get clean path for logging
        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        tracing::debug!(data_dir = %data_dir.display(), "Storage initialized");

        if config.debug {
            let debug_path = data_dir.join(DataSubdir::Debug.as_str());
            tracing::warn!(path = %debug_path.display(), "Debug mode enabled");
        } else {
            tracing::debug!("Debug mode not enabled");
        }

        Ok(Self { data_dir })
    }

    /// Resolve data directory from env var or platform default
    pub fn resolve_data_dir() -> PathBuf {
        // Check env var override first
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            return expand_path(&dir);
        }

        // Use platform-specific directory
        if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            return proj_dirs.data_dir().to_path_buf();
        }

        // Fallback to local .tracegraph
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        cwd.join(APP_DOT_FOLDER)
    }

    /// Create data directory and subdirectories (static version for init)
    async fn ensure_directories_static(data_dir: &Path, debug: bool) -> Result<()> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        for subdir in DataSubdir::all() {
            let path = data_dir.join(subdir.as_str());
            tokio::fs::create_dir_all(&path).await.with_context(|| {
                format!(
                    "Failed to create {} directory: {}",
                    subdir.as_str(),
                    path.display()
                )
            })?;
        }

        if debug {
            let path = data_dir.join(DataSubdir::Debug.as_str());
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create debug directory: {}", path.display()))?;
        }

        Ok(())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to a subdirectory
    pub fn subdir(&self, subdir: DataSubdir) -> PathBuf {
        self.data_dir.join(subdir.as_str())
    }

    /// Upload directory of one project: `uploads/<name>_<id>`, name sanitized
    pub fn project_dir(&self, project_name: &str, project_id: i64) -> PathBuf {
        let name = sanitize_file_name(project_name).unwrap_or_else(|| "project".to_string());
        self.subdir(DataSubdir::Uploads)
            .join(format!("{}_{}", name, project_id))
    }

    /// Raw log area of one project
    pub fn project_raw_dir(&self, project_name: &str, project_id: i64) -> PathBuf {
        self.project_dir(project_name, project_id).join(RAW_LOGS_DIR)
    }

    /// Create AppStorage with a specific data directory (tests and offline commands)
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_subdir_as_str() {
        assert_eq!(DataSubdir::Uploads.as_str(), "uploads");
        assert_eq!(DataSubdir::Debug.as_str(), "debug");
    }

    #[test]
    fn test_data_subdir_all() {
        let all = DataSubdir::all();
        // Debug is only created when enabled
        assert_eq!(all, &[DataSubdir::Uploads]);
    }

    #[test]
    fn test_project_raw_dir_layout() {
        let storage = AppStorage::with_data_dir(PathBuf::from("/data"));
        assert_eq!(
            storage.project_raw_dir("demo", 7),
            PathBuf::from("/data/uploads/demo_7/raw_logs")
        );
        assert_eq!(
            storage.project_dir("../my run", 2),
            PathBuf::from("/data/uploads/my_run_2")
        );
    }

    #[tokio::test]
    async fn test_init_creates_uploads_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(dir.path().join("store").display().to_string());

        let storage = AppStorage::init(&config).await.unwrap();
        assert!(storage.subdir(DataSubdir::Uploads).is_dir());
        assert!(!storage.subdir(DataSubdir::Debug).exists());
    }

    #[test]
    fn test_resolve_data_dir_fallback() {
        // Without env var set, should return a non-empty path
        // SAFETY: Test runs single-threaded, no concurrent access to env var
        unsafe { std::env::remove_var(ENV_DATA_DIR) };
        let path = AppStorage::resolve_data_dir();
        assert!(!path.as_os_str().is_empty());
    }
}
