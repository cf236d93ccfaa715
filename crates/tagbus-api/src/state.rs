// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use tagbus_gateway::{AutoControl, TagGateway};
use tagbus_modbus::ConnectionManager;
use tagbus_store::Directory;

/// State passed to every handler via axum's state extraction.
#[derive(Clone)]
pub struct AppState {
    /// Tag resolution engine.
    pub gateway: Arc<TagGateway>,
    /// Auto-control service.
    pub autocontrol: Arc<AutoControl>,
}

impl AppState {
    /// Creates the state container.
    pub fn new(gateway: Arc<TagGateway>, autocontrol: Arc<AutoControl>) -> Self {
        Self {
            gateway,
            autocontrol,
        }
    }

    /// Returns the machine/tag directory.
    pub fn directory(&self) -> &Arc<Directory> {
        self.gateway.directory()
    }

    /// Returns the connection manager.
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        self.gateway.connections()
    }
}
