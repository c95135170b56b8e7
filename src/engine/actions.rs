//! Action records and the live action table.

use crate::config::{PRESET_SIZE, RECORD_SIZE, TABLE_SLOTS};
use crate::midi::{NOTE_ON, UsbMidiPacket};
use crate::storage::NvStore;

/// One configurable output action (4 bytes).
///
/// `kind` is the USB-MIDI code index number of the message to emit
/// (0x1-0xF), or 0 for a disabled record. A disabled record is never
/// emitted regardless of its remaining bytes.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionRecord {
    /// 0 = no action; otherwise the MIDI message-type nibble.
    pub kind: u8,
    /// MIDI status byte (message type | channel).
    pub status: u8,
    /// First MIDI data byte.
    pub arg1: u8,
    /// Second MIDI data byte.
    pub arg2: u8,
}

impl ActionRecord {
    /// Parse from a 4-byte storage slice.
    pub fn from_bytes(data: &[u8; RECORD_SIZE]) -> Self {
        Self {
            kind: data[0],
            status: data[1],
            arg1: data[2],
            arg2: data[3],
        }
    }

    /// Serialise to the 4-byte storage layout.
    pub fn to_bytes(self) -> [u8; RECORD_SIZE] {
        [self.kind, self.status, self.arg1, self.arg2]
    }

    /// True if this record must never be emitted.
    pub fn is_disabled(self) -> bool {
        self.kind == 0
    }

    /// The outbound packet for this record, or `None` if disabled.
    pub fn packet(self) -> Option<UsbMidiPacket> {
        if self.is_disabled() {
            return None;
        }
        Some(UsbMidiPacket {
            header: self.kind,
            status: self.status,
            data1: self.arg1,
            data2: self.arg2,
        })
    }
}

/// The live table of 8 action records, indexed by transition code.
///
/// Wholesale-replaced by preset loads and edited in place by the
/// configuration protocol's live-write opcodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTable {
    records: [ActionRecord; TABLE_SLOTS],
}

impl Default for ActionTable {
    /// All records disabled.
    fn default() -> Self {
        Self {
            records: [ActionRecord::default(); TABLE_SLOTS],
        }
    }
}

impl ActionTable {
    /// Power-on table: slot 0 plays note-on 42 / velocity 42 on channel
    /// 0, everything else disabled, so a freshly flashed device makes a
    /// sound before any preset exists.
    pub fn power_on() -> Self {
        let mut table = Self::default();
        table.records[0] = ActionRecord {
            kind: NOTE_ON,
            status: NOTE_ON << 4,
            arg1: 42,
            arg2: 42,
        };
        table
    }

    /// The record at a transition code (masked into range).
    pub fn record(&self, slot: u8) -> ActionRecord {
        self.records[slot as usize % TABLE_SLOTS]
    }

    /// Mutable access for live configuration writes.
    pub fn record_mut(&mut self, slot: u8) -> &mut ActionRecord {
        &mut self.records[slot as usize % TABLE_SLOTS]
    }

    /// The outbound packet for a transition code, if that slot is
    /// enabled.
    pub fn packet(&self, slot: u8) -> Option<UsbMidiPacket> {
        self.record(slot).packet()
    }

    /// Replace the whole table from a 32-byte preset image.
    pub fn load_bytes(&mut self, data: &[u8; PRESET_SIZE]) {
        for (i, chunk) in data.chunks_exact(RECORD_SIZE).enumerate() {
            let mut bytes = [0u8; RECORD_SIZE];
            bytes.copy_from_slice(chunk);
            self.records[i] = ActionRecord::from_bytes(&bytes);
        }
    }

    /// Copy one persisted preset into the live table, byte for byte.
    ///
    /// `program` is masked to its low 4 bits, so any 7-bit MIDI program
    /// number selects one of the 16 presets.
    pub fn load_preset(&mut self, store: &impl NvStore, program: u8) {
        let base = (program as u16 & 0x0F) * PRESET_SIZE as u16;
        let mut image = [0u8; PRESET_SIZE];
        for (i, byte) in image.iter_mut().enumerate() {
            *byte = store.read_byte(base + i as u16);
        }
        self.load_bytes(&image);
    }

    /// Serialise the table to a 32-byte preset image.
    pub fn to_bytes(&self) -> [u8; PRESET_SIZE] {
        let mut image = [0u8; PRESET_SIZE];
        for (i, record) in self.records.iter().enumerate() {
            image[i * RECORD_SIZE..(i + 1) * RECORD_SIZE].copy_from_slice(&record.to_bytes());
        }
        image
    }
}
