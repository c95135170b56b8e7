//! Application-wide constants and compile-time configuration.
//!
//! All axis thresholds, preset geometry, configuration opcode numbers,
//! and protocol constants live here so they can be tuned in one place.
//! The opcode numbers are part of the external configuration-tool
//! contract and must stay stable across firmware revisions.

// Joystick axes

/// Axis sample below this reads as Up (vertical) / Left (horizontal).
pub const AXIS_LOW_THRESHOLD: u8 = 32;

/// Axis sample above this reads as Down (vertical) / Right (horizontal).
/// Samples in `[AXIS_LOW_THRESHOLD, AXIS_HIGH_THRESHOLD]` inclusive are
/// centered on that axis.
pub const AXIS_HIGH_THRESHOLD: u8 = 224;

/// Position sampling interval (ms). Must be fast enough that direct
/// opposite-direction jumps (Up straight to Down) stay rare, since the
/// transition encoder folds those into a single return-to-center event.
pub const POSITION_POLL_MS: u64 = 1;

/// How long an outbound packet may wait for the USB endpoint before it
/// is dropped (ms). There is no output queue; a stale joystick event is
/// not worth delivering late.
pub const EMIT_TIMEOUT_MS: u64 = 2;

// Action table / preset geometry

/// Bytes per action record: kind, status, arg1, arg2.
pub const RECORD_SIZE: usize = 4;

/// Action records per table, indexed by transition code 0-7.
pub const TABLE_SLOTS: usize = 8;

/// Bytes per persisted preset (one full action table).
pub const PRESET_SIZE: usize = TABLE_SLOTS * RECORD_SIZE;

/// Number of presets held in non-volatile storage.
pub const PRESET_COUNT: usize = 16;

/// Total non-volatile preset area in bytes.
pub const STORE_SIZE: usize = PRESET_COUNT * PRESET_SIZE;

// Configuration opcode space (Control-Change controller numbers)
//
// Reserved bands, stable across revisions:
//
//   15      mode toggle (direct <-> relative program stepping)
//   16..23  live kind/status write for table slot (controller - 16)
//   24..31  live arg1 write for table slot (controller - 24)
//   32..39  live arg2 write for table slot (controller - 32)
//   40      store select (value = persistent record index 0-127)
//   41      store header (kind + status of the selected record)
//   42      store arg1
//   43      store arg2
//
// Every other controller number is ordinary musical data.

/// Flips the operating mode.
pub const MODE_SWAP_CODE: u8 = 15;

/// First of 8 codes editing a live record's kind/status (no persistence).
pub const LIVE_KIND_BASE: u8 = 16;

/// First of 8 codes editing a live record's arg1.
pub const LIVE_ARG1_BASE: u8 = 24;

/// First of 8 codes editing a live record's arg2.
pub const LIVE_ARG2_BASE: u8 = 32;

/// Selects which persistent record (0-127) subsequent store writes target.
pub const STORE_SELECT_CODE: u8 = 40;

/// Writes the selected persistent record's kind and status bytes.
pub const STORE_HEADER_CODE: u8 = 41;

/// Writes the selected persistent record's arg1 byte.
pub const STORE_ARG1_CODE: u8 = 42;

/// Writes the selected persistent record's arg2 byte.
pub const STORE_ARG2_CODE: u8 = 43;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "joy2midi";
pub const USB_PRODUCT: &str = "Analog Joystick MIDI Controller";
pub const USB_SERIAL_NUMBER: &str = "000001";

// Analog pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types
// are selected in `main.rs`.  Adjust for your custom PCB.
//
//   Vertical axis    → P0.02 / AIN0
//   Horizontal axis  → P0.03 / AIN1

// Preset storage

/// Flash page index where preset storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for preset storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
