// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! An assembled gateway over an in-memory store and the mock transport.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use tagbus_api::{ApiConfig, ApiServer, AppState};
use tagbus_core::journal::ControlJournal;
use tagbus_core::schema::TagConfig;
use tagbus_gateway::{AutoControl, TagGateway};
use tagbus_modbus::ConnectionManager;
use tagbus_store::{Directory, Store};

use super::fixtures::MachineFixtures;
use super::mocks::{mock_manager, MockBank};

/// A fully wired gateway for integration tests.
///
/// The Modbus side is backed by a [`MockBank`] shared across every
/// endpoint; the store is an in-memory SQLite database; the control
/// journal writes into a temporary directory that lives as long as the
/// harness.
pub struct GatewayHarness {
    /// Shared mock device state.
    pub bank: Arc<MockBank>,
    /// Endpoint connection manager over mock transports.
    pub connections: Arc<ConnectionManager>,
    /// Machine/tag directory over the in-memory store.
    pub directory: Arc<Directory>,
    /// The tag resolution engine under test.
    pub gateway: Arc<TagGateway>,
    /// Auto-control service journaling into `journal_dir`.
    pub autocontrol: Arc<AutoControl>,
    journal_dir: tempfile::TempDir,
}

impl GatewayHarness {
    /// Assembles a fresh gateway.
    pub async fn new() -> Self {
        let bank = MockBank::new();
        let connections = Arc::new(mock_manager(bank.clone()));

        let store = Store::open_in_memory().await.expect("in-memory store");
        let directory = Arc::new(Directory::open(store).await.expect("directory"));

        let gateway = Arc::new(TagGateway::new(directory.clone(), connections.clone()));

        let journal_dir = tempfile::tempdir().expect("journal dir");
        let journal = ControlJournal::new(journal_dir.path()).expect("journal");
        let autocontrol = Arc::new(AutoControl::new(gateway.clone(), journal));

        Self {
            bank,
            connections,
            directory,
            gateway,
            autocontrol,
            journal_dir,
        }
    }

    /// Registers a machine at the default test endpoint.
    pub async fn add_machine(&self, name: &str) {
        self.directory
            .upsert_machine(
                name,
                MachineFixtures::IP,
                MachineFixtures::PORT,
                MachineFixtures::SLAVE,
            )
            .await
            .expect("upsert machine");
    }

    /// Registers a tag on a machine.
    pub async fn add_tag(&self, machine: &str, tag: &str, config: TagConfig) {
        self.directory
            .add_tag(machine, tag, config)
            .await
            .expect("add tag");
    }

    /// Path of today's control journal file.
    pub fn journal_file(&self) -> PathBuf {
        self.journal_dir.path().join(format!(
            "auto_control-{}.jsonl",
            Utc::now().date_naive().format("%Y-%m-%d")
        ))
    }

    /// Application state for API-level tests.
    pub fn app_state(&self) -> AppState {
        AppState::new(self.gateway.clone(), self.autocontrol.clone())
    }

    /// A router with all routes, for in-process HTTP tests.
    pub fn router(&self) -> axum::Router {
        ApiServer::new(self.app_state(), ApiConfig::default()).router()
    }
}
