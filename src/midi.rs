//! USB-MIDI event packet (USB Device Class Definition for MIDI Devices,
//! chapter 4).
//!
//! Layout (4 bytes):
//! ```text
//! Byte 0: Cable number (high nibble) | Code Index Number (low nibble)
//! Byte 1: MIDI status byte (message type nibble | channel nibble)
//! Byte 2: MIDI data byte 1 (7-bit)
//! Byte 3: MIDI data byte 2 (7-bit)
//! ```
//!
//! The same bytes are never reinterpreted through overlapping layouts;
//! all field access goes through the explicit accessors below.

/// MIDI message-type nibbles (high nibble of the status byte).
pub const NOTE_OFF: u8 = 0x8;
pub const NOTE_ON: u8 = 0x9;
pub const POLY_PRESSURE: u8 = 0xA;
pub const CONTROL_CHANGE: u8 = 0xB;
pub const PROGRAM_CHANGE: u8 = 0xC;
pub const CHANNEL_PRESSURE: u8 = 0xD;
pub const PITCH_BEND: u8 = 0xE;

/// Sentinel message-type nibble meaning "no message" in the
/// configuration protocol. Writing it disables the targeted record.
pub const NO_MESSAGE: u8 = 0xF;

/// USB-MIDI packet size in bytes.
pub const PACKET_SIZE: usize = 4;

/// One USB-MIDI event packet.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbMidiPacket {
    /// Cable number | code index number.
    pub header: u8,
    /// MIDI status byte.
    pub status: u8,
    /// First MIDI data byte.
    pub data1: u8,
    /// Second MIDI data byte.
    pub data2: u8,
}

impl UsbMidiPacket {
    /// Parse one packet from the front of a byte slice.
    ///
    /// Returns `None` for anything shorter than 4 bytes; extra bytes
    /// are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < PACKET_SIZE {
            return None;
        }
        Some(Self {
            header: data[0],
            status: data[1],
            data1: data[2],
            data2: data[3],
        })
    }

    /// Serialise for USB transmission.
    pub fn to_bytes(self) -> [u8; PACKET_SIZE] {
        [self.header, self.status, self.data1, self.data2]
    }

    /// Virtual cable number (0-15).
    pub fn cable(self) -> u8 {
        self.header >> 4
    }

    /// Code index number identifying the event class.
    pub fn code_index(self) -> u8 {
        self.header & 0x0F
    }

    /// Message-type nibble of the status byte.
    pub fn message_type(self) -> u8 {
        self.status >> 4
    }

    /// MIDI channel nibble of the status byte.
    pub fn channel(self) -> u8 {
        self.status & 0x0F
    }

    /// Build a cable-0, channel-0 program-change packet.
    pub fn program_change(program: u8) -> Self {
        Self {
            header: PROGRAM_CHANGE,
            status: PROGRAM_CHANGE << 4,
            data1: program & 0x7F,
            data2: 0,
        }
    }

    /// Split a transport read into 4-byte event units.
    ///
    /// USB MIDI bulk transfers may carry several packets back to back
    /// (an 8-byte read is two events); a trailing partial unit is
    /// discarded.
    pub fn units(buf: &[u8]) -> impl Iterator<Item = UsbMidiPacket> + '_ {
        buf.chunks_exact(PACKET_SIZE).filter_map(Self::from_bytes)
    }
}
