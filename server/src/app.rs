//! Core application

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{API_PREFIX, APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::{LogRepository, MemoryRepository};
use crate::domain::filter::{FilterSet, filter_file};
use crate::domain::graph::build_graph;
use crate::domain::jobs::FilterJobQueue;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub repository: Arc<dyn LogRepository>,
    pub jobs: FilterJobQueue,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Filter { raw_path, filters }) => {
                return Self::run_filter(raw_path, filters).await;
            }
            Some(Commands::Graph { paths }) => {
                let config = AppConfig::load(&cli_config)?;
                return Self::run_graph(paths, &config).await;
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;
        Ok(Self::new(config, storage))
    }

    /// Wire services for the given configuration and storage
    pub fn new(config: AppConfig, storage: AppStorage) -> Self {
        let repository: Arc<dyn LogRepository> = Arc::new(MemoryRepository::new());
        let jobs = FilterJobQueue::new(repository.clone(), config.jobs.max_concurrent);
        let shutdown = ShutdownService::new(jobs.clone());

        tracing::debug!(
            max_jobs = config.jobs.max_concurrent,
            "Filter job queue initialized"
        );

        Self {
            shutdown,
            config,
            storage,
            repository,
            jobs,
        }
    }

    /// One-off filter run: prints the filtered path and its checksum
    async fn run_filter(raw_path: PathBuf, filters: Vec<String>) -> Result<()> {
        let filters = FilterSet::parse(&filters).context("Invalid filter")?;
        let source = raw_path.clone();
        let outcome = tokio::task::spawn_blocking(move || filter_file(&source, &filters))
            .await
            .context("Filter task failed")?
            .with_context(|| format!("Failed to filter {}", raw_path.display()))?;

        println!("{}", outcome.filtered_path.display());
        println!("{}", outcome.checksum);
        tracing::info!(
            lines_read = outcome.lines_read,
            lines_removed = outcome.lines_removed,
            "Filtered"
        );
        Ok(())
    }

    /// One-off graph build: prints the graph as JSON
    async fn run_graph(paths: Vec<PathBuf>, config: &AppConfig) -> Result<()> {
        let schema = config.trace_schema;
        let graph = tokio::task::spawn_blocking(move || build_graph(&paths, schema))
            .await
            .context("Graph task failed")?
            .context("Failed to build graph")?;

        let json = serde_json::to_string_pretty(&graph).context("Failed to serialize graph")?;
        println!("{}", json);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        tracing::info!(
            "{} API at http://{}:{}{}",
            APP_NAME,
            app.config.server.host,
            app.config.server.port,
            API_PREFIX
        );
        tracing::info!(data_dir = %app.storage.data_dir().display(), "Storing uploads");

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
