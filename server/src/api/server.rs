//! API server initialization

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::openapi_json;
use super::routes::{graph, health, logs, projects};
use crate::core::CoreApp;
use crate::core::constants::{API_PREFIX, DEFAULT_BODY_LIMIT, UPLOAD_BODY_LIMIT};

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);

        Self {
            app,
            allowed_origins,
        }
    }

    /// Build the full HTTP router
    pub fn router(&self) -> Router {
        let app = &self.app;

        let projects_routes =
            projects::routes(app.repository.clone(), app.jobs.clone(), app.storage.clone());

        // Uploads carry whole raw logs in the body
        let logs_routes =
            logs::routes(app.repository.clone(), app.jobs.clone(), app.storage.clone())
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

        let graph_routes = graph::routes(app.repository.clone(), app.config.trace_schema);

        let api = Router::new()
            .route(
                "/health",
                get(health::health).with_state(app.jobs.clone()),
            )
            .nest("/projects", projects_routes)
            .nest("/projects/{project_id}/logs", logs_routes)
            .nest("/projects/{project_id}/graph", graph_routes);

        Router::new()
            .route("/api/openapi.json", get(openapi_json))
            .nest(API_PREFIX, api)
            .fallback(middleware::handle_404)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::cors(&self.allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let router = self.router();
        let Self { app, .. } = self;

        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid server host: {}", host))?,
            port,
        );

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(address = %addr, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}
