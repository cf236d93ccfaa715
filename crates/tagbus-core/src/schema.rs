// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tag and machine configuration schema.
//!
//! These are the shapes persisted by the store and projected into the
//! in-memory directory. Validation is mandatory before a tag is admitted:
//! the directory's mutation operations call [`TagConfig::validate`] and
//! reject the write on failure, so the read/write hot path never re-checks
//! address syntax.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::RegisterAddress;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{Permission, TagName, TagType};

/// Default Modbus TCP port.
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// Default Modbus unit id (slave address).
pub const DEFAULT_UNIT_ID: u8 = 1;

// =============================================================================
// TagConfig
// =============================================================================

/// Configuration of a single tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    /// How the tag maps onto registers.
    pub tag_type: TagType,

    /// Display/reference label; no validated format.
    pub logical_register: String,

    /// Physical address, validated per [`TagType`] grammar.
    pub real_register: String,

    /// Read/write access control.
    pub permission: Permission,
}

impl TagConfig {
    /// Validates the physical address against the tag type's grammar.
    ///
    /// Enum membership of `tag_type` and `permission` is already enforced
    /// by deserialization (case-insensitive input, canonical storage).
    pub fn validate(&self) -> ConfigResult<()> {
        self.address().map(|_| ())
    }

    /// Parses the physical address.
    pub fn address(&self) -> ConfigResult<RegisterAddress> {
        RegisterAddress::parse(&self.real_register, self.tag_type)
    }
}

// =============================================================================
// MachineConfig
// =============================================================================

/// Configuration of a single machine: its endpoint and typed tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Device host address.
    pub ip: String,

    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Modbus unit id behind the endpoint.
    #[serde(default = "default_slave")]
    pub slave: u8,

    /// Tags keyed by canonical (uppercase) tag name.
    #[serde(default)]
    pub tags: BTreeMap<TagName, TagConfig>,
}

fn default_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_slave() -> u8 {
    DEFAULT_UNIT_ID
}

impl MachineConfig {
    /// Creates a machine config with an empty tag set.
    pub fn new(ip: impl Into<String>, port: u16, slave: u8) -> Self {
        Self {
            ip: ip.into(),
            port,
            slave,
            tags: BTreeMap::new(),
        }
    }

    /// Returns a tag by (case-insensitive) name.
    pub fn tag(&self, name: &TagName) -> Option<&TagConfig> {
        self.tags.get(name)
    }

    /// Validates the endpoint and every tag.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ip.trim().is_empty() {
            return Err(ConfigError::validation("ip", "cannot be empty"));
        }
        for (name, tag) in &self.tags {
            tag.validate().map_err(|e| {
                ConfigError::validation(format!("tags.{}", name), e.to_string())
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn analog_tag() -> TagConfig {
        TagConfig {
            tag_type: TagType::Analog,
            logical_register: "40221".to_string(),
            real_register: "220".to_string(),
            permission: Permission::ReadWrite,
        }
    }

    #[test]
    fn test_tag_validate() {
        assert!(analog_tag().validate().is_ok());

        let bad = TagConfig {
            tag_type: TagType::Digital,
            real_register: "10000.0".to_string(),
            ..analog_tag()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_tag_config_deserialize_case_insensitive() {
        let json = r#"{
            "tag_type": "digitalam",
            "logical_register": "D100",
            "real_register": "2000.3",
            "permission": "readwrite"
        }"#;
        let tag: TagConfig = serde_json::from_str(json).unwrap();
        assert_eq!(tag.tag_type, TagType::DigitalAM);
        assert_eq!(tag.permission, Permission::ReadWrite);

        // Canonical casing on the way back out.
        let out = serde_json::to_string(&tag).unwrap();
        assert!(out.contains("\"DigitalAM\""));
        assert!(out.contains("\"ReadWrite\""));
    }

    #[test]
    fn test_machine_config_defaults() {
        let json = r#"{"ip": "172.30.1.97"}"#;
        let machine: MachineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(machine.port, 502);
        assert_eq!(machine.slave, 1);
        assert!(machine.tags.is_empty());
    }

    #[test]
    fn test_machine_config_tag_keys_normalized() {
        let json = r#"{
            "ip": "172.30.1.97",
            "tags": {
                "pv": {
                    "tag_type": "Analog",
                    "logical_register": "40221",
                    "real_register": "220",
                    "permission": "Read"
                }
            }
        }"#;
        let machine: MachineConfig = serde_json::from_str(json).unwrap();
        assert!(machine.tag(&TagName::new("PV")).is_some());
        assert!(machine.tag(&TagName::new("pv")).is_some());
    }

    #[test]
    fn test_machine_validate() {
        let mut machine = MachineConfig::new("172.30.1.97", 502, 1);
        machine
            .tags
            .insert(TagName::new("PV"), analog_tag());
        assert!(machine.validate().is_ok());

        let empty_ip = MachineConfig::new("  ", 502, 1);
        assert!(empty_ip.validate().is_err());
    }
}
