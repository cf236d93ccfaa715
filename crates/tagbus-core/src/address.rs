// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Physical register address parsing and validation.
//!
//! A tag's `real_register` string takes one of two shapes depending on the
//! tag type:
//!
//! - **Analog**: a plain register number, `"2005"` (0-65535)
//! - **Digital**: `"<register>.<bit>"`, e.g. `"2000.3"`, with the register
//!   in 0-9999 and the bit position in 0-15
//!
//! Validation happens once, when a tag is admitted to the directory; the
//! resolver re-parses previously validated strings on dispatch and treats
//! a failure there as a configuration bug, not a user error.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};
use crate::types::TagType;

/// Upper bound (inclusive) for the register part of a digital address.
pub const MAX_DIGITAL_REGISTER: u32 = 9999;

/// Upper bound (inclusive) for the bit position of a digital address.
pub const MAX_BIT_POSITION: u32 = 15;

// =============================================================================
// RegisterAddress
// =============================================================================

/// A parsed physical register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterAddress {
    /// A whole 16-bit holding register (analog tags).
    Word(u16),
    /// A single bit within a holding register (digital tags).
    Bit {
        /// Holding register number (0-9999).
        register: u16,
        /// Bit position within the register (0-15).
        bit: u8,
    },
}

impl RegisterAddress {
    /// Parses and validates an address string against the tag type's
    /// grammar.
    pub fn parse(raw: &str, tag_type: TagType) -> ConfigResult<Self> {
        let raw = raw.trim();
        match tag_type {
            TagType::Analog => Self::parse_word(raw),
            TagType::Digital | TagType::DigitalAM | TagType::DigitalRM => Self::parse_bit(raw),
        }
    }

    fn parse_word(raw: &str) -> ConfigResult<Self> {
        let register: u16 = raw.parse().map_err(|_| {
            ConfigError::invalid_address(raw, "expected a plain register number (0-65535)")
        })?;
        Ok(Self::Word(register))
    }

    fn parse_bit(raw: &str) -> ConfigResult<Self> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 2 {
            return Err(ConfigError::invalid_address(
                raw,
                "expected '<register>.<bit>' with exactly one dot",
            ));
        }

        let register: u32 = parts[0].parse().map_err(|_| {
            ConfigError::invalid_address(raw, "register part is not a non-negative integer")
        })?;
        let bit: u32 = parts[1].parse().map_err(|_| {
            ConfigError::invalid_address(raw, "bit part is not a non-negative integer")
        })?;

        if register > MAX_DIGITAL_REGISTER {
            return Err(ConfigError::RegisterOutOfRange {
                address: raw.to_string(),
                register,
            });
        }
        if bit > MAX_BIT_POSITION {
            return Err(ConfigError::BitOutOfRange {
                address: raw.to_string(),
                bit,
            });
        }

        Ok(Self::Bit {
            register: register as u16,
            bit: bit as u8,
        })
    }

    /// Returns the register number addressed by this address.
    pub const fn register(&self) -> u16 {
        match self {
            Self::Word(register) => *register,
            Self::Bit { register, .. } => *register,
        }
    }

    /// Returns the bit position for bit addresses.
    pub const fn bit(&self) -> Option<u8> {
        match self {
            Self::Word(_) => None,
            Self::Bit { bit, .. } => Some(*bit),
        }
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(register) => write!(f, "{}", register),
            Self::Bit { register, bit } => write!(f, "{}.{}", register, bit),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analog_address() {
        assert_eq!(
            RegisterAddress::parse("2005", TagType::Analog).unwrap(),
            RegisterAddress::Word(2005)
        );
        assert_eq!(
            RegisterAddress::parse(" 0 ", TagType::Analog).unwrap(),
            RegisterAddress::Word(0)
        );
        assert_eq!(
            RegisterAddress::parse("65535", TagType::Analog).unwrap(),
            RegisterAddress::Word(65535)
        );
        assert!(RegisterAddress::parse("65536", TagType::Analog).is_err());
        assert!(RegisterAddress::parse("-1", TagType::Analog).is_err());
        assert!(RegisterAddress::parse("2000.3", TagType::Analog).is_err());
    }

    #[test]
    fn test_digital_address() {
        assert_eq!(
            RegisterAddress::parse("2000.3", TagType::DigitalAM).unwrap(),
            RegisterAddress::Bit { register: 2000, bit: 3 }
        );
        assert_eq!(
            RegisterAddress::parse("0.0", TagType::Digital).unwrap(),
            RegisterAddress::Bit { register: 0, bit: 0 }
        );
    }

    #[test]
    fn test_digital_address_boundaries() {
        // The extreme corner is valid.
        assert!(RegisterAddress::parse("9999.15", TagType::Digital).is_ok());

        // Register too large.
        let err = RegisterAddress::parse("10000.0", TagType::Digital).unwrap_err();
        assert!(matches!(err, ConfigError::RegisterOutOfRange { register: 10000, .. }));

        // Bit too large.
        let err = RegisterAddress::parse("0.16", TagType::Digital).unwrap_err();
        assert!(matches!(err, ConfigError::BitOutOfRange { bit: 16, .. }));

        // Malformed: too many parts.
        assert!(matches!(
            RegisterAddress::parse("5.5.5", TagType::Digital).unwrap_err(),
            ConfigError::InvalidAddressFormat { .. }
        ));

        // Malformed: missing bit.
        assert!(matches!(
            RegisterAddress::parse("5", TagType::DigitalRM).unwrap_err(),
            ConfigError::InvalidAddressFormat { .. }
        ));

        // Malformed: empty bit part.
        assert!(RegisterAddress::parse("5.", TagType::Digital).is_err());
        // Malformed: negative bit.
        assert!(RegisterAddress::parse("5.-1", TagType::Digital).is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let word = RegisterAddress::parse("1220", TagType::Analog).unwrap();
        assert_eq!(word.to_string(), "1220");

        let bit = RegisterAddress::parse("2000.3", TagType::Digital).unwrap();
        assert_eq!(bit.to_string(), "2000.3");
        assert_eq!(bit.register(), 2000);
        assert_eq!(bit.bit(), Some(3));
        assert_eq!(word.bit(), None);
    }
}
