// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gateway runtime orchestration.
//!
//! The runtime assembles all tagbus components in dependency order:
//!
//! 1. Configuration store (SQLite) and the directory projection
//! 2. Connection manager with the configured Modbus parameters
//! 3. Tag gateway and auto-control service over the control journal
//! 4. HTTP/WebSocket API server
//!
//! and coordinates graceful shutdown: on SIGTERM/SIGINT the API server
//! drains, every Modbus connection is closed, and the store pool shuts
//! down.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use tagbus_api::{ApiServer, AppState};
use tagbus_core::journal::ControlJournal;
use tagbus_gateway::{AutoControl, TagGateway};
use tagbus_modbus::ConnectionManager;
use tagbus_store::{Directory, Store};

use crate::config::{load_or_default, AppConfig};
use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// GatewayRuntime
// =============================================================================

/// The main gateway runtime that orchestrates all components.
pub struct GatewayRuntime {
    config: Arc<AppConfig>,
    shutdown: ShutdownCoordinator,
    probe: bool,
}

impl GatewayRuntime {
    /// Creates a new gateway runtime.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            probe: false,
        }
    }

    /// Enables the startup reachability probe.
    pub fn with_probe(mut self, enabled: bool) -> Self {
        self.probe = enabled;
        self
    }

    /// Returns a handle for initiating shutdown externally.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the gateway until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting tagbus gateway v{}", tagbus_core::VERSION);

        let components = self.initialize().await?;

        if self.probe {
            probe_machines(&components.directory, &components.connections).await;
        }

        let server = ApiServer::new(components.state.clone(), self.config.api.clone());

        let waiter = {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_shutdown().await })
        };

        info!(
            machines = components.directory.machine_names().len(),
            api = %self.config.api.bind_addr(),
            "tagbus gateway is ready"
        );

        let result = server.run_with_shutdown(self.shutdown.shutdown_signal()).await;

        info!("Shutting down, closing connections...");
        components.connections.close_all().await;
        components.directory.store().close().await;
        waiter.abort();

        info!("tagbus gateway shutdown complete");
        result.map_err(BinError::from)
    }

    /// Initializes all gateway components.
    async fn initialize(&self) -> BinResult<GatewayComponents> {
        let store = Store::open(&self.config.database.path).await?;
        let directory = Arc::new(Directory::open(store).await?);

        let connections = Arc::new(ConnectionManager::new(self.config.modbus.clone()));
        let gateway = Arc::new(TagGateway::new(directory.clone(), connections.clone()));

        let journal = ControlJournal::new(&self.config.journal.dir).map_err(|e| {
            BinError::init(format!(
                "failed to create journal directory {}: {}",
                self.config.journal.dir.display(),
                e
            ))
        })?;
        let autocontrol = Arc::new(AutoControl::new(gateway.clone(), journal));

        let state = AppState::new(gateway, autocontrol);

        Ok(GatewayComponents {
            directory,
            connections,
            state,
        })
    }
}

/// Container for the assembled gateway components.
struct GatewayComponents {
    directory: Arc<Directory>,
    connections: Arc<ConnectionManager>,
    state: AppState,
}

/// Probes every configured machine endpoint and logs reachability.
async fn probe_machines(directory: &Directory, connections: &ConnectionManager) {
    for name in directory.machine_names() {
        let Ok(machine) = directory.machine(&name) else {
            continue;
        };
        if connections.test_connection(&machine.ip, machine.port).await {
            info!(machine = %name, endpoint = %format!("{}:{}", machine.ip, machine.port), "Machine reachable");
        } else {
            warn!(machine = %name, endpoint = %format!("{}:{}", machine.ip, machine.port), "Machine unreachable");
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the gateway runtime.
pub struct RuntimeBuilder {
    config_path: Option<std::path::PathBuf>,
    config: Option<AppConfig>,
    probe: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: None,
            probe: false,
        }
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Enables the startup reachability probe.
    pub fn probe(mut self, enabled: bool) -> Self {
        self.probe = enabled;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<GatewayRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("no configuration provided"))?;
                load_or_default(&path)?
            }
        };

        Ok(GatewayRuntime::new(config).with_probe(self.probe))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.path = dir.join("tagbus.db");
        config.journal.dir = dir.join("control");
        config
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[test]
    fn test_runtime_builder_with_config() {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = RuntimeBuilder::new()
            .config(test_config(tmp.path()))
            .probe(true)
            .build()
            .unwrap();
        assert!(runtime.probe);
    }

    #[test]
    fn test_runtime_builder_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = RuntimeBuilder::new()
            .config_path(tmp.path().join("absent.yaml"))
            .build()
            .unwrap();
        assert_eq!(runtime.config.api.port, 8000);
    }

    #[tokio::test]
    async fn test_initialize_components() {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = GatewayRuntime::new(test_config(tmp.path()));

        let components = runtime.initialize().await.unwrap();
        assert!(components.directory.machine_names().is_empty());
        assert_eq!(components.connections.endpoint_count(), 0);

        components.directory.store().close().await;
    }
}
