// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "TraceGraph";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracegraph";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracegraph";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tracegraph.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TRACEGRAPH_CONFIG";

// =============================================================================
// Environment Variables - Debug
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "TRACEGRAPH_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TRACEGRAPH_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TRACEGRAPH_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACEGRAPH_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5000;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "TRACEGRAPH_DATA_DIR";

// =============================================================================
// Filter Jobs
// =============================================================================

/// Environment variable for the filter job concurrency limit
pub const ENV_MAX_JOBS: &str = "TRACEGRAPH_MAX_JOBS";

/// Default number of filter jobs running at once
pub const DEFAULT_MAX_JOBS: usize = 4;

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for general API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Body limit for log uploads (256 MB - raw traces are large)
pub const UPLOAD_BODY_LIMIT: usize = 256 * 1024 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds (5 minutes)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// API
// =============================================================================

/// Base path of the versioned API
pub const API_PREFIX: &str = "/api/v1";
