// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Machine and tag queries.
//!
//! Duplicate-machine policy: `upsert_machine` is a last-write-wins upsert
//! on ip/port/slave. Tag *adds* reject duplicates; tag *updates* require
//! the tag to already exist.

use std::collections::HashMap;

use sqlx::Row;

use tagbus_core::error::{StoreError, StoreResult};
use tagbus_core::schema::{MachineConfig, TagConfig};
use tagbus_core::types::{MachineName, TagName};

use super::db::Store;

fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::database_with(context, e)
}

impl Store {
    // =========================================================================
    // Projection Load
    // =========================================================================

    /// Loads the full machine/tag configuration.
    pub async fn load_all(&self) -> StoreResult<HashMap<MachineName, MachineConfig>> {
        let machine_rows = sqlx::query("SELECT name, ip_address, port, slave FROM machines")
            .fetch_all(self.pool())
            .await
            .map_err(db_err("failed to load machines"))?;

        let mut machines: HashMap<MachineName, MachineConfig> = HashMap::new();
        for row in machine_rows {
            let name: String = row.try_get("name").map_err(db_err("machines.name"))?;
            let ip: String = row.try_get("ip_address").map_err(db_err("machines.ip_address"))?;
            let port: i64 = row.try_get("port").map_err(db_err("machines.port"))?;
            let slave: i64 = row.try_get("slave").map_err(db_err("machines.slave"))?;

            machines.insert(
                MachineName::new(name),
                MachineConfig::new(ip, port as u16, slave as u8),
            );
        }

        let tag_rows = sqlx::query(
            r#"
            SELECT machines.name AS machine_name, tags.tag_name, tags.tag_type,
                   tags.logical_register, tags.real_register, tags.permission
            FROM tags
            JOIN machines ON machines.id = tags.machine_id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(db_err("failed to load tags"))?;

        for row in tag_rows {
            let machine_name: String =
                row.try_get("machine_name").map_err(db_err("tags.machine"))?;
            let tag_name: String = row.try_get("tag_name").map_err(db_err("tags.tag_name"))?;
            let tag_type: String = row.try_get("tag_type").map_err(db_err("tags.tag_type"))?;
            let logical_register: String = row
                .try_get("logical_register")
                .map_err(db_err("tags.logical_register"))?;
            let real_register: String = row
                .try_get("real_register")
                .map_err(db_err("tags.real_register"))?;
            let permission: String =
                row.try_get("permission").map_err(db_err("tags.permission"))?;

            let config = TagConfig {
                tag_type: tag_type.parse().map_err(|e| {
                    StoreError::invalid_row(format!("tag '{}': {}", tag_name, e))
                })?,
                logical_register,
                real_register,
                permission: permission.parse().map_err(|e| {
                    StoreError::invalid_row(format!("tag '{}': {}", tag_name, e))
                })?,
            };

            if let Some(machine) = machines.get_mut(&MachineName::new(&machine_name)) {
                machine.tags.insert(TagName::new(tag_name), config);
            }
        }

        tracing::info!(count = machines.len(), "Loaded machine configurations");

        Ok(machines)
    }

    // =========================================================================
    // Machine Mutations
    // =========================================================================

    /// Inserts or updates a machine endpoint (last-write-wins).
    pub async fn upsert_machine(
        &self,
        name: &MachineName,
        ip: &str,
        port: u16,
        slave: u8,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO machines (name, ip_address, port, slave)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET ip_address = ?, port = ?, slave = ?
            "#,
        )
        .bind(name.as_str())
        .bind(ip)
        .bind(port as i64)
        .bind(slave as i64)
        .bind(ip)
        .bind(port as i64)
        .bind(slave as i64)
        .execute(self.pool())
        .await
        .map_err(db_err("failed to upsert machine"))?;

        Ok(())
    }

    /// Deletes a machine and (by cascade) its tags. Returns `false` when
    /// no such machine existed.
    pub async fn delete_machine(&self, name: &MachineName) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM machines WHERE name = ?")
            .bind(name.as_str())
            .execute(self.pool())
            .await
            .map_err(db_err("failed to delete machine"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Looks up the row id of a machine.
    pub async fn machine_id(&self, name: &MachineName) -> StoreResult<i64> {
        let row = sqlx::query("SELECT id FROM machines WHERE name = ?")
            .bind(name.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(db_err("failed to query machine"))?;

        match row {
            Some(row) => row.try_get("id").map_err(db_err("machines.id")),
            None => Err(StoreError::machine_not_found(name.as_str())),
        }
    }

    // =========================================================================
    // Tag Mutations
    // =========================================================================

    /// Adds a tag to a machine. The machine must exist and the tag name
    /// must be new.
    pub async fn add_tag(
        &self,
        machine: &MachineName,
        tag: &TagName,
        config: &TagConfig,
    ) -> StoreResult<()> {
        let machine_id = self.machine_id(machine).await?;

        if self.tag_exists(machine_id, tag).await? {
            return Err(StoreError::duplicate_tag(machine.as_str(), tag.as_str()));
        }

        self.insert_tag(machine_id, tag, config).await
    }

    /// Updates an existing tag.
    pub async fn update_tag(
        &self,
        machine: &MachineName,
        tag: &TagName,
        config: &TagConfig,
    ) -> StoreResult<()> {
        let machine_id = self.machine_id(machine).await?;

        let result = sqlx::query(
            r#"
            UPDATE tags
            SET tag_type = ?, logical_register = ?, real_register = ?, permission = ?
            WHERE machine_id = ? AND tag_name = ?
            "#,
        )
        .bind(config.tag_type.as_str())
        .bind(&config.logical_register)
        .bind(&config.real_register)
        .bind(config.permission.as_str())
        .bind(machine_id)
        .bind(tag.as_str())
        .execute(self.pool())
        .await
        .map_err(db_err("failed to update tag"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::tag_not_found(machine.as_str(), tag.as_str()));
        }
        Ok(())
    }

    /// Deletes a tag from a machine.
    pub async fn delete_tag(&self, machine: &MachineName, tag: &TagName) -> StoreResult<()> {
        let machine_id = self.machine_id(machine).await?;

        let result = sqlx::query("DELETE FROM tags WHERE machine_id = ? AND tag_name = ?")
            .bind(machine_id)
            .bind(tag.as_str())
            .execute(self.pool())
            .await
            .map_err(db_err("failed to delete tag"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::tag_not_found(machine.as_str(), tag.as_str()));
        }
        Ok(())
    }

    // =========================================================================
    // Bulk Import
    // =========================================================================

    /// Replaces a machine's endpoint and entire tag set, as used by config
    /// import: upsert the machine, drop its tags, insert the new set.
    pub async fn replace_machine(
        &self,
        name: &MachineName,
        config: &MachineConfig,
    ) -> StoreResult<()> {
        self.upsert_machine(name, &config.ip, config.port, config.slave)
            .await?;

        let machine_id = self.machine_id(name).await?;

        sqlx::query("DELETE FROM tags WHERE machine_id = ?")
            .bind(machine_id)
            .execute(self.pool())
            .await
            .map_err(db_err("failed to clear machine tags"))?;

        for (tag_name, tag_config) in &config.tags {
            self.insert_tag(machine_id, tag_name, tag_config).await?;
        }

        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn tag_exists(&self, machine_id: i64, tag: &TagName) -> StoreResult<bool> {
        let row =
            sqlx::query("SELECT COUNT(*) AS count FROM tags WHERE machine_id = ? AND tag_name = ?")
                .bind(machine_id)
                .bind(tag.as_str())
                .fetch_one(self.pool())
                .await
                .map_err(db_err("failed to query tag"))?;

        let count: i64 = row.try_get("count").map_err(db_err("tags.count"))?;
        Ok(count > 0)
    }

    async fn insert_tag(
        &self,
        machine_id: i64,
        tag: &TagName,
        config: &TagConfig,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tags
                (machine_id, tag_name, tag_type, logical_register, real_register, permission)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(machine_id)
        .bind(tag.as_str())
        .bind(config.tag_type.as_str())
        .bind(&config.logical_register)
        .bind(&config.real_register)
        .bind(config.permission.as_str())
        .execute(self.pool())
        .await
        .map_err(db_err("failed to insert tag"))?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tagbus_core::types::{Permission, TagType};

    fn tag(tag_type: TagType, real_register: &str) -> TagConfig {
        TagConfig {
            tag_type,
            logical_register: "L100".to_string(),
            real_register: real_register.to_string(),
            permission: Permission::ReadWrite,
        }
    }

    #[tokio::test]
    async fn test_machine_round_trip() {
        let store = Store::open_in_memory().await.unwrap();
        let name = MachineName::new("oil_main");

        store.upsert_machine(&name, "172.30.1.97", 502, 1).await.unwrap();
        store
            .add_tag(&name, &TagName::new("pv"), &tag(TagType::Analog, "220"))
            .await
            .unwrap();

        let machines = store.load_all().await.unwrap();
        let machine = machines.get(&MachineName::new("OIL_MAIN")).unwrap();
        assert_eq!(machine.ip, "172.30.1.97");
        assert_eq!(machine.tags.len(), 1);
        assert!(machine.tags.contains_key(&TagName::new("PV")));
    }

    #[tokio::test]
    async fn test_upsert_machine_is_last_write_wins() {
        let store = Store::open_in_memory().await.unwrap();
        let name = MachineName::new("M1");

        store.upsert_machine(&name, "10.0.0.1", 502, 1).await.unwrap();
        store.upsert_machine(&name, "10.0.0.2", 1502, 3).await.unwrap();

        let machines = store.load_all().await.unwrap();
        let machine = machines.get(&name).unwrap();
        assert_eq!(machine.ip, "10.0.0.2");
        assert_eq!(machine.port, 1502);
        assert_eq!(machine.slave, 3);
        assert_eq!(machines.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_tag_rejected() {
        let store = Store::open_in_memory().await.unwrap();
        let name = MachineName::new("M1");
        store.upsert_machine(&name, "10.0.0.1", 502, 1).await.unwrap();

        let pv = TagName::new("PV");
        store.add_tag(&name, &pv, &tag(TagType::Analog, "220")).await.unwrap();

        let err = store
            .add_tag(&name, &pv, &tag(TagType::Analog, "221"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTag { .. }));
    }

    #[tokio::test]
    async fn test_tag_ops_require_machine() {
        let store = Store::open_in_memory().await.unwrap();
        let err = store
            .add_tag(
                &MachineName::new("GHOST"),
                &TagName::new("PV"),
                &tag(TagType::Analog, "220"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MachineNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_tag() {
        let store = Store::open_in_memory().await.unwrap();
        let name = MachineName::new("M1");
        let pv = TagName::new("PV");
        store.upsert_machine(&name, "10.0.0.1", 502, 1).await.unwrap();

        let err = store
            .update_tag(&name, &pv, &tag(TagType::Analog, "220"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TagNotFound { .. }));

        store.add_tag(&name, &pv, &tag(TagType::Analog, "220")).await.unwrap();
        store
            .update_tag(&name, &pv, &tag(TagType::DigitalAM, "2000.3"))
            .await
            .unwrap();

        let machines = store.load_all().await.unwrap();
        let stored = machines.get(&name).unwrap().tags.get(&pv).unwrap().clone();
        assert_eq!(stored.tag_type, TagType::DigitalAM);
        assert_eq!(stored.real_register, "2000.3");

        store.delete_tag(&name, &pv).await.unwrap();
        let err = store.delete_tag(&name, &pv).await.unwrap_err();
        assert!(matches!(err, StoreError::TagNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_machine_cascades_tags() {
        let store = Store::open_in_memory().await.unwrap();
        let name = MachineName::new("M1");
        store.upsert_machine(&name, "10.0.0.1", 502, 1).await.unwrap();
        store
            .add_tag(&name, &TagName::new("PV"), &tag(TagType::Analog, "220"))
            .await
            .unwrap();

        assert!(store.delete_machine(&name).await.unwrap());
        assert!(!store.delete_machine(&name).await.unwrap());

        // Re-create the machine: no orphan tags may resurface.
        store.upsert_machine(&name, "10.0.0.1", 502, 1).await.unwrap();
        let machines = store.load_all().await.unwrap();
        assert!(machines.get(&name).unwrap().tags.is_empty());
    }
}
