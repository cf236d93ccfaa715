// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core identifier and value types for the tag gateway.
//!
//! This module defines the vocabulary shared by every tagbus component:
//!
//! - **MachineName / TagName**: case-normalized identifiers
//! - **TagType**: how a tag maps onto Modbus registers
//! - **Permission**: read/write access control for a tag
//! - **Mode**: symbolic values carried by digital bits
//! - **ModeKind**: the 0/1 interpretation assigned to a digital bit
//! - **TagValue**: the result of reading or writing a tag
//!
//! # Name normalization
//!
//! Machine and tag names are normalized to uppercase at every boundary.
//! Two names differing only in case refer to the same entity; `OIL_MAIN`
//! and `oil_main` are the same machine. The newtypes below enforce this at
//! construction so lookups never have to remember to normalize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

// =============================================================================
// MachineName / TagName
// =============================================================================

/// A machine identifier, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineName(String);

impl MachineName {
    /// Creates a machine name, trimming whitespace and uppercasing.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_uppercase())
    }

    /// Returns the canonical (uppercase) name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MachineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MachineName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MachineName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

/// A tag identifier, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagName(String);

impl TagName {
    /// Creates a tag name, trimming whitespace and uppercasing.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_uppercase())
    }

    /// Returns the canonical (uppercase) name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for TagName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

// =============================================================================
// TagType
// =============================================================================

/// How a tag addresses a Modbus device.
///
/// - `Analog` addresses a whole 16-bit holding register.
/// - `Digital` addresses a single bit within a register, with generic
///   ON/OFF semantics.
/// - `DigitalAM` and `DigitalRM` are digital bits with fixed AUTO/MANUAL
///   and LOCAL/REMOTE semantics respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    /// Whole 16-bit holding register.
    Analog,
    /// Single bit, generic ON/OFF semantics.
    Digital,
    /// Single bit, AUTO(0)/MANUAL(1) semantics.
    DigitalAM,
    /// Single bit, LOCAL(0)/REMOTE(1) semantics.
    DigitalRM,
}

impl TagType {
    /// Canonical string form, as stored in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Analog => "Analog",
            Self::Digital => "Digital",
            Self::DigitalAM => "DigitalAM",
            Self::DigitalRM => "DigitalRM",
        }
    }

    /// Returns `true` if this type addresses a single bit.
    pub const fn is_digital(&self) -> bool {
        !matches!(self, Self::Analog)
    }

    /// Returns the bit interpretation for digital types, `None` for analog.
    pub const fn mode_kind(&self) -> Option<ModeKind> {
        match self {
            Self::Analog => None,
            Self::Digital => Some(ModeKind::Generic),
            Self::DigitalAM => Some(ModeKind::AutoManual),
            Self::DigitalRM => Some(ModeKind::LocalRemote),
        }
    }

    /// All tag types as an array.
    pub const ALL: [TagType; 4] = [
        Self::Analog,
        Self::Digital,
        Self::DigitalAM,
        Self::DigitalRM,
    ];
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "analog" => Ok(Self::Analog),
            "digital" => Ok(Self::Digital),
            "digitalam" | "digital_am" => Ok(Self::DigitalAM),
            "digitalrm" | "digital_rm" => Ok(Self::DigitalRM),
            _ => Err(ConfigError::invalid_tag_type(s)),
        }
    }
}

impl Serialize for TagType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TagType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Permission
// =============================================================================

/// Access control for a tag.
///
/// Read-only tags reject write attempts unconditionally, before any I/O
/// is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Reads only; all writes are rejected.
    Read,
    /// Reads and writes.
    ReadWrite,
}

impl Permission {
    /// Canonical string form, as stored in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::ReadWrite => "ReadWrite",
        }
    }

    /// Returns `true` if writes are permitted.
    pub const fn can_write(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "readwrite" | "read_write" => Ok(Self::ReadWrite),
            _ => Err(ConfigError::invalid_permission(s)),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Mode / ModeKind
// =============================================================================

/// Symbolic value carried by a digital bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Automatic control (bit clear under AUTO/MANUAL).
    Auto,
    /// Manual control (bit set under AUTO/MANUAL).
    Manual,
    /// Local operation (bit clear under LOCAL/REMOTE).
    Local,
    /// Remote operation (bit set under LOCAL/REMOTE).
    Remote,
    /// Generic on state (bit set).
    On,
    /// Generic off state (bit clear).
    Off,
}

impl Mode {
    /// Wire form of the mode, as exchanged with callers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
            Self::Local => "LOCAL",
            Self::Remote => "REMOTE",
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "MANUAL" => Ok(Self::Manual),
            "LOCAL" => Ok(Self::Local),
            "REMOTE" => Ok(Self::Remote),
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(ConfigError::validation(
                "mode",
                format!("unknown mode keyword '{}'", s),
            )),
        }
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The 0/1 interpretation assigned to a digital bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// 0 → AUTO, 1 → MANUAL.
    AutoManual,
    /// 0 → LOCAL, 1 → REMOTE.
    LocalRemote,
    /// 0 → OFF, 1 → ON.
    Generic,
}

impl ModeKind {
    /// Returns the (clear, set) mode pair accepted under this kind.
    pub const fn accepted(&self) -> (Mode, Mode) {
        match self {
            Self::AutoManual => (Mode::Auto, Mode::Manual),
            Self::LocalRemote => (Mode::Local, Mode::Remote),
            Self::Generic => (Mode::Off, Mode::On),
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AutoManual => "AUTO/MANUAL",
            Self::LocalRemote => "LOCAL/REMOTE",
            Self::Generic => "ON/OFF",
        };
        f.write_str(s)
    }
}

// =============================================================================
// TagValue
// =============================================================================

/// The result of reading or writing a tag.
///
/// Analog tags yield the raw register word; digital tags yield the decoded
/// symbolic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Raw 16-bit register value from an analog tag.
    Word(u16),
    /// Decoded symbolic value from a digital tag.
    Mode(Mode),
}

impl TagValue {
    /// Returns the raw word if this is an analog value.
    pub const fn as_word(&self) -> Option<u16> {
        match self {
            Self::Word(w) => Some(*w),
            Self::Mode(_) => None,
        }
    }

    /// Returns the mode if this is a digital value.
    pub const fn as_mode(&self) -> Option<Mode> {
        match self {
            Self::Word(_) => None,
            Self::Mode(m) => Some(*m),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{}", w),
            Self::Mode(m) => f.write_str(m.as_str()),
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
    fn test_name_normalization() {
        assert_eq!(MachineName::new("oil_main").as_str(), "OIL_MAIN");
        assert_eq!(MachineName::new("  Oil_Main  ").as_str(), "OIL_MAIN");
        assert_eq!(TagName::new("pv").as_str(), "PV");
        assert_eq!(MachineName::new("oil_main"), MachineName::new("OIL_MAIN"));
    }

    #[test]
    fn test_tag_type_parse() {
        assert_eq!("Analog".parse::<TagType>().unwrap(), TagType::Analog);
        assert_eq!("analog".parse::<TagType>().unwrap(), TagType::Analog);
        assert_eq!("DIGITALAM".parse::<TagType>().unwrap(), TagType::DigitalAM);
        assert_eq!("digital_rm".parse::<TagType>().unwrap(), TagType::DigitalRM);
        assert!("Coil".parse::<TagType>().is_err());
    }

    #[test]
    fn test_tag_type_canonical_form() {
        for tag_type in TagType::ALL {
            let reparsed: TagType = tag_type.as_str().parse().unwrap();
            assert_eq!(reparsed, tag_type);
        }
        assert_eq!(TagType::DigitalAM.to_string(), "DigitalAM");
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!("Read".parse::<Permission>().unwrap(), Permission::Read);
        assert_eq!(
            "readwrite".parse::<Permission>().unwrap(),
            Permission::ReadWrite
        );
        assert!(!Permission::Read.can_write());
        assert!(Permission::ReadWrite.can_write());
        assert!("Write".parse::<Permission>().is_err());
    }

    #[test]
    fn test_mode_kind_mapping() {
        assert_eq!(TagType::Digital.mode_kind(), Some(ModeKind::Generic));
        assert_eq!(TagType::DigitalAM.mode_kind(), Some(ModeKind::AutoManual));
        assert_eq!(TagType::DigitalRM.mode_kind(), Some(ModeKind::LocalRemote));
        assert_eq!(TagType::Analog.mode_kind(), None);
    }

    #[test]
    fn test_mode_wire_form() {
        assert_eq!("manual".parse::<Mode>().unwrap(), Mode::Manual);
        assert_eq!(Mode::Remote.to_string(), "REMOTE");
        assert_eq!(
            serde_json::to_string(&TagValue::Mode(Mode::Auto)).unwrap(),
            "\"AUTO\""
        );
        assert_eq!(serde_json::to_string(&TagValue::Word(42)).unwrap(), "42");
    }

    #[test]
    fn test_tag_value_accessors() {
        assert_eq!(TagValue::Word(7).as_word(), Some(7));
        assert_eq!(TagValue::Word(7).as_mode(), None);
        assert_eq!(TagValue::Mode(Mode::On).as_mode(), Some(Mode::On));
        assert_eq!(TagValue::Mode(Mode::On).to_string(), "ON");
    }
}
