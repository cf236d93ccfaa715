// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register bit codec and mode mapping.
//!
//! Pure, stateless transforms between raw 16-bit register words and the
//! symbolic mode values exposed to callers. No I/O happens here; the
//! resolver composes these functions with transport reads and writes.
//!
//! Writing a single bit is always a read-modify-write of the whole
//! register: [`set_bit`] preserves the other 15 bits exactly, so a digital
//! write never clobbers neighbouring points packed into the same word.

use crate::error::{ControlError, ControlResult};
use crate::types::{Mode, ModeKind};

// =============================================================================
// Bit Operations
// =============================================================================

/// Extracts a single bit from a register word.
///
/// Positions 16 and above read as clear.
#[inline]
pub fn extract_bit(word: u16, bit: u8) -> bool {
    if bit >= 16 {
        return false;
    }
    (word >> bit) & 1 == 1
}

/// Sets or clears a single bit in a register word.
///
/// All other bits are preserved. Positions 16 and above leave the word
/// unchanged.
#[inline]
pub fn set_bit(word: u16, bit: u8, value: bool) -> u16 {
    if bit >= 16 {
        return word;
    }
    if value {
        word | (1 << bit)
    } else {
        word & !(1 << bit)
    }
}

// =============================================================================
// Mode Mapping
// =============================================================================

/// Decodes a bit state into the symbolic mode for the given kind.
///
/// Clear maps to AUTO / LOCAL / OFF and set maps to MANUAL / REMOTE / ON.
#[inline]
pub fn decode_mode(bit: bool, kind: ModeKind) -> Mode {
    let (clear, set) = kind.accepted();
    if bit {
        set
    } else {
        clear
    }
}

/// Encodes a symbolic mode into the bit state for the given kind.
///
/// A mode that does not belong to the kind (e.g. LOCAL under AUTO/MANUAL)
/// is rejected with an error naming the two accepted values.
pub fn encode_mode(mode: Mode, kind: ModeKind) -> ControlResult<bool> {
    let (clear, set) = kind.accepted();
    if mode == clear {
        Ok(false)
    } else if mode == set {
        Ok(true)
    } else {
        Err(ControlError::invalid_mode(
            mode.as_str(),
            format!("{}, {}", clear.as_str(), set.as_str()),
        ))
    }
}

/// Returns the bit state opposite to the current mode.
///
/// Used for wildcard (`"*"`) writes: the caller reads the current mode,
/// then writes the state this function returns.
pub fn toggle(current: Mode, kind: ModeKind) -> ControlResult<bool> {
    Ok(!encode_mode(current, kind)?)
}

// =============================================================================
// Tests
// =============================================================================
