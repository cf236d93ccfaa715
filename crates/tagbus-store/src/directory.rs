// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory machine/tag directory with reload-after-write semantics.
//!
//! The directory owns a snapshot of the full machine configuration. Every
//! mutation validates its input, writes to the store, then reloads the
//! whole projection and swaps the snapshot reference. Readers see either
//! the old or the new complete snapshot, never a partially-updated one.
//!
//! All lookups normalize names to uppercase, so `resolve("oil_main", "pv")`
//! and `resolve("OIL_MAIN", "PV")` return the same configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use tagbus_core::error::{GatewayResult, StoreError, StoreResult};
use tagbus_core::schema::{MachineConfig, TagConfig};
use tagbus_core::types::{MachineName, TagName};

use super::db::Store;

/// Shared, immutable snapshot of the machine map.
pub type DirectorySnapshot = Arc<HashMap<MachineName, MachineConfig>>;

// =============================================================================
// Directory
// =============================================================================

/// The machine/tag directory.
pub struct Directory {
    store: Store,
    snapshot: RwLock<DirectorySnapshot>,
}

impl Directory {
    /// Opens a directory over the given store, loading the initial
    /// projection.
    pub async fn open(store: Store) -> StoreResult<Self> {
        let initial = store.load_all().await?;
        Ok(Self {
            store,
            snapshot: RwLock::new(Arc::new(initial)),
        })
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.snapshot.read().clone()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Returns all machine names, sorted.
    pub fn machine_names(&self) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut names: Vec<String> = snapshot.keys().map(|n| n.as_str().to_string()).collect();
        names.sort();
        names
    }

    /// Returns a machine's configuration by (case-insensitive) name.
    pub fn machine(&self, name: &str) -> StoreResult<MachineConfig> {
        let key = MachineName::new(name);
        self.snapshot()
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::machine_not_found(key.as_str()))
    }

    /// Resolves a `(machine, tag)` pair into its configuration.
    pub fn resolve(&self, machine: &str, tag: &str) -> StoreResult<(MachineConfig, TagConfig)> {
        let machine_key = MachineName::new(machine);
        let tag_key = TagName::new(tag);

        let snapshot = self.snapshot();
        let machine_config = snapshot
            .get(&machine_key)
            .ok_or_else(|| StoreError::machine_not_found(machine_key.as_str()))?;

        let tag_config = machine_config.tag(&tag_key).ok_or_else(|| {
            StoreError::tag_not_found(machine_key.as_str(), tag_key.as_str())
        })?;

        Ok((machine_config.clone(), tag_config.clone()))
    }

    // =========================================================================
    // Mutations (validate → persist → reload)
    // =========================================================================

    /// Inserts or updates a machine endpoint (last-write-wins upsert).
    pub async fn upsert_machine(
        &self,
        name: &str,
        ip: &str,
        port: u16,
        slave: u8,
    ) -> GatewayResult<()> {
        MachineConfig::new(ip, port, slave).validate()?;

        let name = MachineName::new(name);
        self.store.upsert_machine(&name, ip, port, slave).await?;
        self.reload().await?;

        tracing::info!(machine = %name, ip, port, "Machine upserted");
        Ok(())
    }

    /// Deletes a machine and its tags. Returns `false` when the machine
    /// was unknown.
    pub async fn delete_machine(&self, name: &str) -> GatewayResult<bool> {
        let name = MachineName::new(name);
        let removed = self.store.delete_machine(&name).await?;
        self.reload().await?;

        if removed {
            tracing::info!(machine = %name, "Machine deleted");
        }
        Ok(removed)
    }

    /// Adds a tag to an existing machine. The tag is validated before it
    /// is persisted; a duplicate name is a conflict.
    pub async fn add_tag(&self, machine: &str, tag: &str, config: TagConfig) -> GatewayResult<()> {
        config.validate()?;

        let machine = MachineName::new(machine);
        let tag = TagName::new(tag);
        self.store.add_tag(&machine, &tag, &config).await?;
        self.reload().await?;

        tracing::info!(machine = %machine, tag = %tag, "Tag added");
        Ok(())
    }

    /// Updates an existing tag after re-validating the new definition.
    pub async fn update_tag(
        &self,
        machine: &str,
        tag: &str,
        config: TagConfig,
    ) -> GatewayResult<()> {
        config.validate()?;

        let machine = MachineName::new(machine);
        let tag = TagName::new(tag);
        self.store.update_tag(&machine, &tag, &config).await?;
        self.reload().await?;

        tracing::info!(machine = %machine, tag = %tag, "Tag updated");
        Ok(())
    }

    /// Deletes a tag from a machine.
    pub async fn delete_tag(&self, machine: &str, tag: &str) -> GatewayResult<()> {
        let machine = MachineName::new(machine);
        let tag = TagName::new(tag);
        self.store.delete_tag(&machine, &tag).await?;
        self.reload().await?;

        tracing::info!(machine = %machine, tag = %tag, "Tag deleted");
        Ok(())
    }

    // =========================================================================
    // Bulk Import / Export
    // =========================================================================

    /// Imports a full configuration document: every named machine is
    /// upserted and its tag set replaced, then the projection reloads once.
    pub async fn import(&self, document: HashMap<MachineName, MachineConfig>) -> GatewayResult<()> {
        for config in document.values() {
            config.validate()?;
        }

        for (name, config) in &document {
            self.store.replace_machine(name, config).await?;
        }
        self.reload().await?;

        tracing::info!(machines = document.len(), "Configuration imported");
        Ok(())
    }

    /// Exports the current projection as a configuration document.
    pub fn export(&self) -> HashMap<MachineName, MachineConfig> {
        self.snapshot().as_ref().clone()
    }

    /// Exports the projection to a timestamped JSON file under `dir`,
    /// returning the path written.
    pub fn export_to_file(&self, dir: impl AsRef<Path>) -> GatewayResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| StoreError::database_with("failed to create export directory", e))?;

        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("machine_config_{}.json", stamp));

        let document = self.export();
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::database_with("failed to serialize configuration", e))?;
        std::fs::write(&path, json)
            .map_err(|e| StoreError::database_with("failed to write export file", e))?;

        tracing::info!(path = %path.display(), "Configuration exported");
        Ok(path)
    }

    // =========================================================================
    // Reload
    // =========================================================================

    /// Reloads the projection from the store and swaps the snapshot.
    pub async fn reload(&self) -> StoreResult<()> {
        let fresh = self.store.load_all().await?;
        *self.snapshot.write() = Arc::new(fresh);
        Ok(())
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("machines", &self.snapshot.read().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
