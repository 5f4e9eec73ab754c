//! HTTP server: upload form, upload processing, report download and static files.

use crate::config::AppConfig;
use crate::web::handlers::{self, AppState};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

/// Builds the router. Unknown paths fall through to the public directory, which is
/// also where the report workbook lives.
pub fn build_router(state: AppState) -> Router {
    let public_dir = ServeDir::new(&state.config.storage.public_dir);
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::upload_form))
        .route("/upload", post(handlers::upload))
        .route("/download", get(handlers::download))
        .fallback_service(public_dir)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

pub struct TallyServer {
    config: AppConfig,
}

impl TallyServer {
    pub fn new(config: AppConfig) -> Result<Self> {
        for dir in [&config.storage.public_dir, &config.storage.upload_dir] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                error!("Failed to create directory '{}': {}", dir, e);
                return Err(anyhow::anyhow!("Failed to create directory {}: {}", dir, e));
            }
        }

        info!(
            "Serving '{}', parking uploads in '{}'",
            config.storage.public_dir, config.storage.upload_dir
        );
        Ok(Self { config })
    }

    /// Start the server and run until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let addr = self.config.server_address();

        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind TCP listener to {}: {}", addr, e);
                error!("Please check if the port is already in use");
                return Err(anyhow::anyhow!("Failed to bind to address {}: {}", addr, e));
            }
        };

        let app = build_router(AppState::new(self.config));
        info!("🚀 server IP: http://{}", addr);

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server encountered a fatal error: {}", e);
            return Err(anyhow::anyhow!("Server error: {}", e));
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
