//! In-band configuration protocol.
//!
//! Configuration rides on ordinary Control-Change messages: a reserved
//! band of controller numbers (see `config.rs`) is interpreted as
//! opcodes instead of musical data. Controller numbers are resolved
//! exactly once, here, into the [`ConfigOp`] sum type; everything
//! outside the reserved bands decodes to `None` and has no side effect.

use crate::config::{
    LIVE_ARG1_BASE, LIVE_ARG2_BASE, LIVE_KIND_BASE, MODE_SWAP_CODE, STORE_ARG1_CODE,
    STORE_ARG2_CODE, STORE_HEADER_CODE, STORE_SELECT_CODE,
};
use crate::midi::NO_MESSAGE;

/// A decoded configuration opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigOp {
    /// Flip between direct and relative-program mode.
    ModeToggle,
    /// Point subsequent store writes at persistent record `index`
    /// (0-127; byte offset = index * 4).
    SelectRecord { index: u8 },
    /// Write the selected record's kind and status bytes to storage.
    StoreHeader { value: u8 },
    /// Write the selected record's arg1 byte to storage.
    StoreArg1 { value: u8 },
    /// Write the selected record's arg2 byte to storage.
    StoreArg2 { value: u8 },
    /// Edit a live record's kind/status without persisting.
    LiveHeader { slot: u8, value: u8 },
    /// Edit a live record's arg1 without persisting.
    LiveArg1 { slot: u8, value: u8 },
    /// Edit a live record's arg2 without persisting.
    LiveArg2 { slot: u8, value: u8 },
}

/// Resolve a Control-Change (controller, value) pair into an opcode.
pub fn decode(controller: u8, value: u8) -> Option<ConfigOp> {
    const LIVE_KIND_END: u8 = LIVE_KIND_BASE + 7;
    const LIVE_ARG1_END: u8 = LIVE_ARG1_BASE + 7;
    const LIVE_ARG2_END: u8 = LIVE_ARG2_BASE + 7;

    match controller {
        MODE_SWAP_CODE => Some(ConfigOp::ModeToggle),
        LIVE_KIND_BASE..=LIVE_KIND_END => Some(ConfigOp::LiveHeader {
            slot: controller - LIVE_KIND_BASE,
            value,
        }),
        LIVE_ARG1_BASE..=LIVE_ARG1_END => Some(ConfigOp::LiveArg1 {
            slot: controller - LIVE_ARG1_BASE,
            value,
        }),
        LIVE_ARG2_BASE..=LIVE_ARG2_END => Some(ConfigOp::LiveArg2 {
            slot: controller - LIVE_ARG2_BASE,
            value,
        }),
        STORE_SELECT_CODE => Some(ConfigOp::SelectRecord {
            index: value & 0x7F,
        }),
        STORE_HEADER_CODE => Some(ConfigOp::StoreHeader { value }),
        STORE_ARG1_CODE => Some(ConfigOp::StoreArg1 { value }),
        STORE_ARG2_CODE => Some(ConfigOp::StoreArg2 { value }),
        _ => None,
    }
}

/// Derive (kind nibble, status byte) from a header opcode's 7-bit
/// value.
///
/// The tool sends the status byte with its top bit stripped (CC values
/// are 7-bit); restoring that bit yields the status byte, whose high
/// nibble is the message type. A type nibble of 0xF is the "no
/// message" sentinel: the record is disabled instead.
pub fn derive_header(value: u8) -> Option<(u8, u8)> {
    let status = value | 0x80;
    let kind = status >> 4;
    if kind == NO_MESSAGE {
        None
    } else {
        Some((kind, status))
    }
}
