// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pre-built tag and machine definitions.

use tagbus_core::schema::TagConfig;
use tagbus_core::types::{Permission, TagType};

/// Tag configuration fixtures.
pub struct TagFixtures;

impl TagFixtures {
    /// A writable analog tag at the given register.
    pub fn analog(register: u16) -> TagConfig {
        TagConfig {
            tag_type: TagType::Analog,
            logical_register: format!("4{:04}", register),
            real_register: register.to_string(),
            permission: Permission::ReadWrite,
        }
    }

    /// A read-only analog tag at the given register.
    pub fn analog_read_only(register: u16) -> TagConfig {
        TagConfig {
            permission: Permission::Read,
            ..Self::analog(register)
        }
    }

    /// A writable generic ON/OFF bit tag.
    pub fn digital(register: u16, bit: u8) -> TagConfig {
        TagConfig {
            tag_type: TagType::Digital,
            logical_register: format!("M{}", register),
            real_register: format!("{}.{}", register, bit),
            permission: Permission::ReadWrite,
        }
    }

    /// A writable AUTO/MANUAL bit tag.
    pub fn digital_am(register: u16, bit: u8) -> TagConfig {
        TagConfig {
            tag_type: TagType::DigitalAM,
            ..Self::digital(register, bit)
        }
    }

    /// A writable LOCAL/REMOTE bit tag.
    pub fn digital_rm(register: u16, bit: u8) -> TagConfig {
        TagConfig {
            tag_type: TagType::DigitalRM,
            ..Self::digital(register, bit)
        }
    }

    /// A read-only AUTO/MANUAL bit tag.
    pub fn digital_am_read_only(register: u16, bit: u8) -> TagConfig {
        TagConfig {
            permission: Permission::Read,
            ..Self::digital_am(register, bit)
        }
    }
}

/// Machine endpoint fixtures.
pub struct MachineFixtures;

impl MachineFixtures {
    /// Default test endpoint.
    pub const IP: &'static str = "10.0.0.1";
    /// Default test port.
    pub const PORT: u16 = 502;
    /// Default test unit id.
    pub const SLAVE: u8 = 1;
}
