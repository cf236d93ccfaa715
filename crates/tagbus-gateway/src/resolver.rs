// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tag resolution and read/write dispatch.
//!
//! [`TagGateway`] is the entry point for symbolic tag operations: given a
//! `(machine, tag)` pair it resolves the tag's type and addressing through
//! the directory, obtains the machine's endpoint connection from the
//! manager, and performs the matching Modbus primitive:
//!
//! - **Analog** tags read/write a whole holding register and yield the raw
//!   word.
//! - **Digital** tags extract or read-modify-write a single bit and yield
//!   the decoded mode.
//!
//! Write values are strings from the caller: a decimal literal for analog
//! tags, a case-insensitive mode keyword for digital tags, or the wildcard
//! `"*"` meaning "toggle the current state" (digital only).
//!
//! The wildcard path reads the current bit and writes the opposite state
//! without holding a lock in between; a concurrent writer can interleave,
//! in which case the toggle applies to a stale read. This limitation is
//! inherited from the device protocol and accepted here.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use tagbus_core::codec::{encode_mode, toggle};
use tagbus_core::error::{ConfigError, ControlError, GatewayResult};
use tagbus_core::schema::MachineConfig;
use tagbus_core::types::{Mode, ModeKind, TagName, TagValue};
use tagbus_core::RegisterAddress;
use tagbus_modbus::{ConnectionManager, MachineClient};
use tagbus_store::Directory;

// =============================================================================
// TagReading
// =============================================================================

/// Per-tag outcome of a bulk read: the value, or that tag's error string.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TagReading {
    /// The tag's current value.
    Value(TagValue),
    /// The tag failed independently of the others.
    Error(String),
}

impl TagReading {
    /// Returns the value if the read succeeded.
    pub fn value(&self) -> Option<TagValue> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Error(_) => None,
        }
    }

    /// Returns `true` if the read failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// =============================================================================
// TagGateway
// =============================================================================

/// The tag resolution and dispatch engine.
pub struct TagGateway {
    directory: Arc<Directory>,
    connections: Arc<ConnectionManager>,
}

impl TagGateway {
    /// Creates a gateway over a directory and a connection manager.
    pub fn new(directory: Arc<Directory>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            directory,
            connections,
        }
    }

    /// Returns the machine/tag directory.
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Returns the connection manager.
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    fn client(&self, machine: &MachineConfig) -> MachineClient {
        MachineClient::new(
            self.connections.get(&machine.ip, machine.port),
            machine.slave,
        )
    }

    // The address grammar is derived from the tag type at validation time,
    // so a bit address on a tag without a mode kind means the stored
    // configuration no longer matches its type.
    fn mode_kind_of(tag: &str, tag_type: tagbus_core::TagType) -> Result<ModeKind, ConfigError> {
        tag_type.mode_kind().ok_or_else(|| {
            ConfigError::validation(
                "real_register",
                format!("tag '{}' address shape does not match its type", tag),
            )
        })
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Reads a tag's current value.
    pub async fn read_tag(&self, machine: &str, tag: &str) -> GatewayResult<TagValue> {
        let (machine_config, tag_config) = self.directory.resolve(machine, tag)?;
        let address = tag_config.address()?;
        let client = self.client(&machine_config);

        match address {
            RegisterAddress::Word(register) => {
                Ok(TagValue::Word(client.read_register(register).await?))
            }
            RegisterAddress::Bit { register, bit } => {
                let kind = Self::mode_kind_of(tag, tag_config.tag_type)?;
                Ok(TagValue::Mode(client.read_bit(register, bit, kind).await?))
            }
        }
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Writes a value to a tag and returns the resulting value.
    ///
    /// Permission is enforced before dispatch: a write against a
    /// `Read`-only tag fails without any I/O, including for `"*"`.
    pub async fn write_tag(&self, machine: &str, tag: &str, value: &str) -> GatewayResult<TagValue> {
        let (machine_config, tag_config) = self.directory.resolve(machine, tag)?;

        if !tag_config.permission.can_write() {
            return Err(ControlError::tag_read_only(TagName::new(tag).as_str()).into());
        }

        let address = tag_config.address()?;
        let client = self.client(&machine_config);
        let value = value.trim();

        match address {
            RegisterAddress::Word(register) => {
                if value == "*" {
                    return Err(ControlError::invalid_value(
                        "*",
                        "analog tags have no toggle semantics",
                    )
                    .into());
                }
                let parsed: u16 = value.parse().map_err(|_| {
                    ControlError::invalid_value(value, "expected an integer 0-65535")
                })?;
                Ok(TagValue::Word(client.write_register(register, parsed).await?))
            }
            RegisterAddress::Bit { register, bit } => {
                let kind = Self::mode_kind_of(tag, tag_config.tag_type)?;

                let state = if value == "*" {
                    // Read-then-write with no lock in between (see module
                    // docs for the race this accepts).
                    let current = client.read_bit(register, bit, kind).await?;
                    toggle(current, kind)?
                } else {
                    let mode: Mode = value.parse().map_err(|_| {
                        let (clear, set) = kind.accepted();
                        ControlError::invalid_mode(
                            value,
                            format!("{}, {}", clear.as_str(), set.as_str()),
                        )
                    })?;
                    encode_mode(mode, kind)?
                };

                Ok(TagValue::Mode(client.write_bit(register, bit, state, kind).await?))
            }
        }
    }

    // =========================================================================
    // Bulk Read
    // =========================================================================

    /// Reads several tags of one machine concurrently.
    ///
    /// Each tag resolves and reads independently; a failure on one tag
    /// becomes that tag's error string and never aborts the others. The
    /// call itself does not fail.
    pub async fn read_tags(&self, machine: &str, tags: &[String]) -> BTreeMap<String, TagReading> {
        let reads = tags.iter().map(|tag| {
            let tag = TagName::new(tag);
            async move {
                let outcome = match self.read_tag(machine, tag.as_str()).await {
                    Ok(value) => TagReading::Value(value),
                    Err(e) => TagReading::Error(format!("오류 발생: {}", e.user_message())),
                };
                (tag.into_string(), outcome)
            }
        });

        futures::future::join_all(reads).await.into_iter().collect()
    }
}

impl std::fmt::Debug for TagGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagGateway")
            .field("directory", &self.directory)
            .field("connections", &self.connections)
            .finish()
    }
}
