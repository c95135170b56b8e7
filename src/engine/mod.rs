//! The joystick-to-MIDI action engine.
//!
//! [`Engine`] is the single context object holding the live action
//! table and all runtime state. The run loop owns it and feeds it two
//! kinds of input: inbound USB-MIDI packets (configuration traffic and
//! preset selection) and freshly sampled joystick positions. Outbound
//! events come back as `Option<UsbMidiPacket>`; delivery - including
//! dropping the event when the transport is busy - is the caller's
//! problem.

pub mod actions;
pub mod position;
pub mod protocol;
pub mod transition;

use crate::config::RECORD_SIZE;
use crate::midi::{self, UsbMidiPacket};
use crate::storage::NvStore;

use actions::ActionTable;
use position::Position;
use protocol::ConfigOp;

/// Operating mode, selected at run time by the mode-toggle opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Every transition maps straight to a table-driven action.
    Direct,
    /// Center departures step the program counter instead; returns to
    /// center still consult the table.
    Relative,
}

impl Mode {
    fn toggled(self) -> Self {
        match self {
            Mode::Direct => Mode::Relative,
            Mode::Relative => Mode::Direct,
        }
    }
}

/// Action engine state: live table plus runtime registers.
pub struct Engine {
    table: ActionTable,
    last_position: Position,
    mode: Mode,
    /// Relative-mode program counter, 0-127.
    program: u8,
    /// Persistent record index (0-127) targeted by store writes.
    cursor: u8,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Power-on state: centered, direct mode, program 0, cursor 0,
    /// default action table.
    pub fn new() -> Self {
        Self {
            table: ActionTable::power_on(),
            last_position: Position::Center,
            mode: Mode::Direct,
            program: 0,
            cursor: 0,
        }
    }

    /// The live action table (inspection only; mutation goes through
    /// the configuration protocol or preset loads).
    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Current operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current relative-mode program counter.
    pub fn program(&self) -> u8 {
        self.program
    }

    /// Feed one freshly sampled position. Returns the event to emit,
    /// if the position changed and the transition maps to an enabled
    /// action.
    pub fn on_position(&mut self, current: Position) -> Option<UsbMidiPacket> {
        let code = transition::encode(self.last_position, current)?;
        self.last_position = current;
        self.dispatch(code)
    }

    /// Decide what a transition code produces under the current mode.
    fn dispatch(&mut self, code: u8) -> Option<UsbMidiPacket> {
        match self.mode {
            Mode::Direct => self.table.packet(code),
            Mode::Relative => {
                if code & 0x4 != 0 {
                    // Return-to-center events stay table-driven.
                    self.table.packet(code)
                } else {
                    // Center departures scroll the program counter:
                    // Up steps down, the other directions step up.
                    self.program = if code == 0 {
                        self.program.wrapping_sub(1) & 0x7F
                    } else {
                        (self.program + 1) & 0x7F
                    };
                    Some(UsbMidiPacket::program_change(self.program))
                }
            }
        }
    }

    /// Inspect one inbound USB-MIDI packet.
    ///
    /// Program-Change on cable 0 / channel 0 loads a preset;
    /// Control-Change on cable 0 / channel 0 may carry a configuration
    /// opcode. Anything else - other cables, other channels, other
    /// message types, unreserved controllers - is musical traffic and
    /// is ignored without side effect.
    pub fn on_inbound(&mut self, packet: UsbMidiPacket, store: &mut impl NvStore) {
        if packet.header == midi::PROGRAM_CHANGE && packet.status == midi::PROGRAM_CHANGE << 4 {
            self.load_preset(packet.data1, store);
            return;
        }
        if packet.header != midi::CONTROL_CHANGE || packet.status != midi::CONTROL_CHANGE << 4 {
            return;
        }
        if let Some(op) = protocol::decode(packet.data1, packet.data2) {
            self.apply(op, store);
        }
    }

    /// Copy one of the 16 persisted presets into the live table.
    pub fn load_preset(&mut self, program: u8, store: &impl NvStore) {
        self.table.load_preset(store, program);
    }

    /// Apply one configuration opcode.
    ///
    /// Store writes are single-byte and immediate; a tool updating a
    /// whole record must issue all of header/arg1/arg2 before starting
    /// a conflicting sequence, or the record may be observed
    /// half-written.
    fn apply(&mut self, op: ConfigOp, store: &mut impl NvStore) {
        match op {
            ConfigOp::ModeToggle => self.mode = self.mode.toggled(),
            ConfigOp::SelectRecord { index } => self.cursor = index,
            ConfigOp::StoreHeader { value } => {
                let base = self.cursor_base();
                match protocol::derive_header(value) {
                    Some((kind, status)) => {
                        store.write_byte(base, kind);
                        store.write_byte(base + 1, status);
                    }
                    // "No message": zero the kind byte to disable the
                    // record, leaving the rest untouched.
                    None => store.write_byte(base, 0),
                }
            }
            ConfigOp::StoreArg1 { value } => store.write_byte(self.cursor_base() + 2, value),
            ConfigOp::StoreArg2 { value } => store.write_byte(self.cursor_base() + 3, value),
            ConfigOp::LiveHeader { slot, value } => {
                let record = self.table.record_mut(slot);
                match protocol::derive_header(value) {
                    Some((kind, status)) => {
                        record.kind = kind;
                        record.status = status;
                    }
                    None => record.kind = 0,
                }
            }
            ConfigOp::LiveArg1 { slot, value } => self.table.record_mut(slot).arg1 = value,
            ConfigOp::LiveArg2 { slot, value } => self.table.record_mut(slot).arg2 = value,
        }
    }

    /// Byte offset of the record the store cursor points at.
    fn cursor_base(&self) -> u16 {
        self.cursor as u16 * RECORD_SIZE as u16
    }
}
