// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP server assembly.

use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppState;

// =============================================================================
// ApiConfig
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

impl ApiConfig {
    /// Returns the bind address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
        }
    }
}

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP/WebSocket server.
pub struct ApiServer {
    state: AppState,
    config: ApiConfig,
}

impl ApiServer {
    /// Creates a server over the application state.
    pub fn new(state: AppState, config: ApiConfig) -> Self {
        Self { state, config }
    }

    /// Builds the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        Router::new()
            // Health
            .route("/health", get(handlers::health))
            // Machine/tag configuration
            .route("/machine", get(handlers::list_machines))
            .route(
                "/machine/{machine_name}",
                post(handlers::upsert_machine).delete(handlers::delete_machine),
            )
            .route("/machine/{machine_name}/tags", get(handlers::list_tags))
            .route(
                "/machine/{machine_name}/tags/{tag_name}",
                post(handlers::add_tag)
                    .put(handlers::update_tag)
                    .delete(handlers::delete_tag),
            )
            // Symbolic tag values
            .route(
                "/machine/{machine_name}/tags/{tag_name}/value",
                get(handlers::read_tag_value).post(handlers::write_tag_value),
            )
            .route("/machine/{machine_name}/values", get(handlers::read_tag_values))
            // Direct register access
            .route(
                "/direct/analog/{register}",
                get(handlers::read_analog).post(handlers::write_analog),
            )
            .route(
                "/direct/digital/{register_bit}",
                get(handlers::read_digital).post(handlers::write_digital),
            )
            .route("/direct/test", get(handlers::test_connection))
            // Auto-control
            .route("/autocontrol/configure", post(handlers::configure))
            .route("/autocontrol/toggle", post(handlers::toggle))
            .route("/autocontrol/status", get(handlers::status))
            .route("/autocontrol/execute", post(handlers::execute))
            // Bulk configuration
            .route("/config/import", post(handlers::import_config))
            .route("/config/export", get(handlers::export_config))
            // Monitoring
            .route("/ws/machine/{machine_name}", get(handlers::machine_monitor))
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Runs the server until the shutdown future resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.bind_addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::internal(format!("failed to bind {}: {}", addr, e)))?;

        info!(addr = %addr, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::internal(format!("server error: {}", e)))?;

        info!("API server shutdown complete");
        Ok(())
    }
}
