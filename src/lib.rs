//! Host-testable core of the joy2midi firmware.
//!
//! Everything here is pure logic with no hardware dependencies: the
//! action engine (position classification, transition encoding, mode
//! dispatch, preset handling, configuration protocol), the USB-MIDI
//! packet type, the oscillator calibrator, and the preset-store shadow.
//!
//! Usage: `cargo test`
//!
//! The embedded binary (`main.rs`, `--features embedded`) wraps this
//! core in an Embassy run loop on the nRF52840: SAADC supplies axis
//! samples, `embassy-usb`'s MIDI class supplies the transport, and the
//! preset shadow syncs to internal flash.

#![cfg_attr(not(test), no_std)]

pub mod calib;
pub mod config;
pub mod engine;
pub mod error;
pub mod midi;
pub mod storage;

#[cfg(feature = "embedded")]
pub mod usb;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::config::{
        LIVE_ARG1_BASE, LIVE_ARG2_BASE, LIVE_KIND_BASE, MODE_SWAP_CODE, PRESET_SIZE,
        STORE_ARG1_CODE, STORE_ARG2_CODE, STORE_HEADER_CODE, STORE_SELECT_CODE, STORE_SIZE,
    };
    use crate::engine::actions::{ActionRecord, ActionTable};
    use crate::engine::position::{classify_axes, sample_position, Axis, AxisReader, Position};
    use crate::engine::protocol::{decode, derive_header, ConfigOp};
    use crate::engine::{transition, Engine, Mode};
    use crate::midi::UsbMidiPacket;
    use crate::storage::{NvStore, PresetStore};

    /// Axis source fed from fixed samples, recording how many
    /// conversions were requested.
    struct FakeAdc {
        vertical: u8,
        horizontal: u8,
        reads: usize,
    }

    impl FakeAdc {
        fn new(vertical: u8, horizontal: u8) -> Self {
            Self {
                vertical,
                horizontal,
                reads: 0,
            }
        }
    }

    impl AxisReader for FakeAdc {
        fn read(&mut self, axis: Axis) -> u8 {
            self.reads += 1;
            match axis {
                Axis::Vertical => self.vertical,
                Axis::Horizontal => self.horizontal,
            }
        }
    }

    /// Send a cable-0 Control-Change configuration message through the
    /// engine.
    fn send_cc(engine: &mut Engine, store: &mut PresetStore, controller: u8, value: u8) {
        let packet = UsbMidiPacket {
            header: 0x0B,
            status: 0xB0,
            data1: controller,
            data2: value,
        };
        engine.on_inbound(packet, store);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Position Classification Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn classify_vertical_extremes() {
        assert_eq!(classify_axes(0, 128), Position::Up);
        assert_eq!(classify_axes(31, 128), Position::Up);
        assert_eq!(classify_axes(225, 128), Position::Down);
        assert_eq!(classify_axes(255, 128), Position::Down);
    }

    #[test]
    fn classify_horizontal_extremes() {
        assert_eq!(classify_axes(128, 0), Position::Left);
        assert_eq!(classify_axes(128, 31), Position::Left);
        assert_eq!(classify_axes(128, 225), Position::Right);
        assert_eq!(classify_axes(128, 255), Position::Right);
    }

    #[test]
    fn classify_boundary_values_read_centered() {
        // Thresholds are inclusive-center on both axes.
        assert_eq!(classify_axes(32, 128), Position::Center);
        assert_eq!(classify_axes(224, 128), Position::Center);
        assert_eq!(classify_axes(128, 32), Position::Center);
        assert_eq!(classify_axes(128, 224), Position::Center);
        assert_eq!(classify_axes(128, 128), Position::Center);
    }

    #[test]
    fn classify_vertical_axis_wins_in_corners() {
        assert_eq!(classify_axes(0, 0), Position::Up);
        assert_eq!(classify_axes(255, 255), Position::Down);
    }

    #[test]
    fn sample_skips_horizontal_conversion_when_vertical_tripped() {
        let mut adc = FakeAdc::new(0, 255);
        assert_eq!(sample_position(&mut adc), Position::Up);
        assert_eq!(adc.reads, 1);
    }

    #[test]
    fn sample_converts_horizontal_when_vertical_centered() {
        let mut adc = FakeAdc::new(128, 255);
        assert_eq!(sample_position(&mut adc), Position::Right);
        assert_eq!(adc.reads, 2);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Transition Encoder Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn encode_departures_from_center() {
        use Position::*;
        assert_eq!(transition::encode(Center, Up), Some(0));
        assert_eq!(transition::encode(Center, Down), Some(1));
        assert_eq!(transition::encode(Center, Left), Some(2));
        assert_eq!(transition::encode(Center, Right), Some(3));
    }

    #[test]
    fn encode_returns_toward_center() {
        use Position::*;
        assert_eq!(transition::encode(Up, Center), Some(4));
        assert_eq!(transition::encode(Down, Center), Some(5));
        assert_eq!(transition::encode(Left, Center), Some(6));
        assert_eq!(transition::encode(Right, Center), Some(7));
    }

    #[test]
    fn encode_direct_jump_counts_as_return_from_previous() {
        use Position::*;
        // Up straight to Down never entered center: encoded as a
        // return from Up, ignoring the new direction.
        assert_eq!(transition::encode(Up, Down), Some(4));
        assert_eq!(transition::encode(Left, Right), Some(6));
        assert_eq!(transition::encode(Right, Up), Some(7));
    }

    #[test]
    fn encode_is_total_and_in_range_for_all_changes() {
        use Position::*;
        let all = [Center, Up, Down, Left, Right];
        for prev in all {
            for cur in all {
                let code = transition::encode(prev, cur);
                if prev == cur {
                    assert_eq!(code, None);
                } else {
                    assert!(code.unwrap() < 8, "{:?}->{:?} out of range", prev, cur);
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Mode Dispatcher Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn direct_mode_emits_power_on_action() {
        let mut engine = Engine::new();
        let packet = engine.on_position(Position::Up).expect("slot 0 enabled");
        assert_eq!(packet.to_bytes(), [0x09, 0x90, 42, 42]);
    }

    #[test]
    fn direct_mode_skips_disabled_slots() {
        let mut engine = Engine::new();
        // Power-on table only populates slot 0; a departure to Down
        // hits the disabled slot 1.
        assert_eq!(engine.on_position(Position::Down), None);
    }

    #[test]
    fn unchanged_position_emits_nothing() {
        let mut engine = Engine::new();
        assert_eq!(engine.on_position(Position::Center), None);
        engine.on_position(Position::Up);
        assert_eq!(engine.on_position(Position::Up), None);
    }

    #[test]
    fn relative_mode_up_departure_decrements_program() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();
        send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 0);
        assert_eq!(engine.mode(), Mode::Relative);

        // Program starts at 0; Up decrements and wraps to 127.
        let packet = engine.on_position(Position::Up).expect("program change");
        assert_eq!(engine.program(), 127);
        assert_eq!(packet.to_bytes(), [0x0C, 0xC0, 127, 0]);
    }

    #[test]
    fn relative_mode_other_departures_increment_program() {
        for departure in [Position::Down, Position::Left, Position::Right] {
            let mut engine = Engine::new();
            let mut store = PresetStore::new();
            send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 0);

            let packet = engine.on_position(departure).expect("program change");
            assert_eq!(engine.program(), 1);
            assert_eq!(packet.to_bytes(), [0x0C, 0xC0, 1, 0]);
        }
    }

    #[test]
    fn relative_mode_program_wraps_at_128() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();
        send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 0);

        // 127 increments (Right departure + return), then one more.
        for _ in 0..127 {
            engine.on_position(Position::Right);
            engine.on_position(Position::Center);
        }
        assert_eq!(engine.program(), 127);
        let packet = engine.on_position(Position::Right).expect("program change");
        assert_eq!(engine.program(), 0);
        assert_eq!(packet.data1, 0);
    }

    #[test]
    fn relative_mode_returns_stay_table_driven() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();
        send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 0);
        // Give the "return from Up" slot (code 4) an action.
        send_cc(&mut engine, &mut store, LIVE_KIND_BASE + 4, 0x30); // 0x30|0x80 = 0xB0
        send_cc(&mut engine, &mut store, LIVE_ARG1_BASE + 4, 100);
        send_cc(&mut engine, &mut store, LIVE_ARG2_BASE + 4, 64);

        engine.on_position(Position::Up); // departure: program change
        let packet = engine.on_position(Position::Center).expect("table action");
        assert_eq!(packet.to_bytes(), [0x0B, 0xB0, 100, 64]);
        // The return event did not step the counter again.
        assert_eq!(engine.program(), 127);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Config Protocol Decoder Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn decode_reserved_bands() {
        assert_eq!(decode(MODE_SWAP_CODE, 5), Some(ConfigOp::ModeToggle));
        assert_eq!(
            decode(LIVE_KIND_BASE, 0x10),
            Some(ConfigOp::LiveHeader { slot: 0, value: 0x10 })
        );
        assert_eq!(
            decode(LIVE_KIND_BASE + 7, 9),
            Some(ConfigOp::LiveHeader { slot: 7, value: 9 })
        );
        assert_eq!(
            decode(LIVE_ARG1_BASE + 2, 99),
            Some(ConfigOp::LiveArg1 { slot: 2, value: 99 })
        );
        assert_eq!(
            decode(LIVE_ARG2_BASE + 5, 1),
            Some(ConfigOp::LiveArg2 { slot: 5, value: 1 })
        );
        assert_eq!(
            decode(STORE_SELECT_CODE, 12),
            Some(ConfigOp::SelectRecord { index: 12 })
        );
        assert_eq!(
            decode(STORE_HEADER_CODE, 0x19),
            Some(ConfigOp::StoreHeader { value: 0x19 })
        );
        assert_eq!(
            decode(STORE_ARG1_CODE, 60),
            Some(ConfigOp::StoreArg1 { value: 60 })
        );
        assert_eq!(
            decode(STORE_ARG2_CODE, 127),
            Some(ConfigOp::StoreArg2 { value: 127 })
        );
    }

    #[test]
    fn decode_passes_musical_controllers_through() {
        // Everything outside [15, 43] is ordinary musical data.
        for controller in (0..15).chain(44..128) {
            assert_eq!(decode(controller, 64), None, "controller {}", controller);
        }
    }

    #[test]
    fn derive_header_restores_status_bit() {
        // 0x19 -> status 0x99 (note-on, channel 9), kind 0x9.
        assert_eq!(derive_header(0x19), Some((0x9, 0x99)));
        // 0x30 -> status 0xB0 (control-change, channel 0).
        assert_eq!(derive_header(0x30), Some((0xB, 0xB0)));
    }

    #[test]
    fn derive_header_yields_every_message_kind() {
        use crate::midi::{
            CHANNEL_PRESSURE, CONTROL_CHANGE, NOTE_OFF, NOTE_ON, PITCH_BEND, POLY_PRESSURE,
            PROGRAM_CHANGE,
        };
        // Every real message kind survives the 7-bit trip: the tool
        // strips the status top bit, derive_header restores it.
        for kind in [
            NOTE_OFF,
            NOTE_ON,
            POLY_PRESSURE,
            CONTROL_CHANGE,
            PROGRAM_CHANGE,
            CHANNEL_PRESSURE,
            PITCH_BEND,
        ] {
            let status = kind << 4 | 0x3; // channel 3
            assert_eq!(derive_header(status & 0x7F), Some((kind, status)));
        }
    }

    #[test]
    fn derive_header_no_message_sentinel() {
        // Any value whose restored high nibble is 0xF disables.
        assert_eq!(derive_header(0x70), None);
        assert_eq!(derive_header(0x7F), None);
    }

    #[test]
    fn mode_toggle_flips_back_and_forth() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();
        assert_eq!(engine.mode(), Mode::Direct);
        send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 0);
        assert_eq!(engine.mode(), Mode::Relative);
        send_cc(&mut engine, &mut store, MODE_SWAP_CODE, 127);
        assert_eq!(engine.mode(), Mode::Direct);
    }

    #[test]
    fn store_writes_land_at_selected_record() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();

        // Record 9 = preset 0 slot... record index 9 -> byte offset 36.
        send_cc(&mut engine, &mut store, STORE_SELECT_CODE, 9);
        send_cc(&mut engine, &mut store, STORE_HEADER_CODE, 0x19);
        send_cc(&mut engine, &mut store, STORE_ARG1_CODE, 60);
        send_cc(&mut engine, &mut store, STORE_ARG2_CODE, 100);

        assert_eq!(store.read_byte(36), 0x9); // kind
        assert_eq!(store.read_byte(37), 0x99); // status
        assert_eq!(store.read_byte(38), 60);
        assert_eq!(store.read_byte(39), 100);
        assert!(store.is_dirty());
    }

    #[test]
    fn store_header_no_message_zeroes_kind_only() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();

        send_cc(&mut engine, &mut store, STORE_SELECT_CODE, 0);
        send_cc(&mut engine, &mut store, STORE_HEADER_CODE, 0x19);
        send_cc(&mut engine, &mut store, STORE_ARG1_CODE, 60);
        // Disable the record: kind goes to 0, status and args remain.
        send_cc(&mut engine, &mut store, STORE_HEADER_CODE, 0x7F);

        assert_eq!(store.read_byte(0), 0);
        assert_eq!(store.read_byte(1), 0x99);
        assert_eq!(store.read_byte(2), 60);
    }

    #[test]
    fn live_writes_edit_table_without_persisting() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();

        send_cc(&mut engine, &mut store, LIVE_KIND_BASE + 1, 0x10);
        send_cc(&mut engine, &mut store, LIVE_ARG1_BASE + 1, 64);
        send_cc(&mut engine, &mut store, LIVE_ARG2_BASE + 1, 33);

        let record = engine.table().record(1);
        assert_eq!(record.kind, 0x9);
        assert_eq!(record.status, 0x90);
        assert_eq!(record.arg1, 64);
        assert_eq!(record.arg2, 33);
        assert!(!store.is_dirty());
    }

    #[test]
    fn live_header_no_message_disables_slot() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();

        // Slot 0 has the power-on action; disable it live.
        send_cc(&mut engine, &mut store, LIVE_KIND_BASE, 0x7F);
        assert!(engine.table().record(0).is_disabled());
        assert_eq!(engine.on_position(Position::Up), None);
    }

    #[test]
    fn other_midi_traffic_has_no_side_effect() {
        let mut engine = Engine::new();
        let mut store = PresetStore::new();

        // Note-on, wrong cable, wrong channel: all ignored.
        for packet in [
            UsbMidiPacket { header: 0x09, status: 0x90, data1: 15, data2: 1 },
            UsbMidiPacket { header: 0x1B, status: 0xB0, data1: 15, data2: 1 },
            UsbMidiPacket { header: 0x0B, status: 0xB1, data1: 15, data2: 1 },
        ] {
            engine.on_inbound(packet, &mut store);
        }
        assert_eq!(engine.mode(), Mode::Direct);
        assert!(!store.is_dirty());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Action Table / Preset Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn action_record_byte_roundtrip() {
        let record = ActionRecord {
            kind: 0xE,
            status: 0xE3,
            arg1: 0,
            arg2: 0x40,
        };
        assert_eq!(ActionRecord::from_bytes(&record.to_bytes()), record);
    }

    #[test]
    fn disabled_record_never_becomes_packet() {
        let record = ActionRecord {
            kind: 0,
            status: 0x90,
            arg1: 60,
            arg2: 100,
        };
        assert_eq!(record.packet(), None);
    }

    #[test]
    fn load_preset_copies_exact_bytes() {
        let mut store = PresetStore::new();
        // Fill preset 3 (offset 96) with a recognizable pattern.
        for i in 0..PRESET_SIZE as u16 {
            store.write_byte(96 + i, i as u8 + 1);
        }

        let mut table = ActionTable::power_on();
        table.load_preset(&store, 3);
        let image = table.to_bytes();
        for (i, byte) in image.iter().enumerate() {
            assert_eq!(*byte, i as u8 + 1);
        }
    }

    #[test]
    fn load_preset_masks_program_to_low_nibble() {
        let mut store = PresetStore::new();
        store.write_byte(3 * PRESET_SIZE as u16, 0x0B);

        let mut table = ActionTable::default();
        // Program 19 & 0xF = preset 3.
        table.load_preset(&store, 19);
        assert_eq!(table.record(0).kind, 0x0B);
        // Program 115 & 0xF = preset 3 as well.
        let mut other = ActionTable::default();
        other.load_preset(&store, 115);
        assert_eq!(other, table);
    }

    #[test]
    fn load_preset_is_idempotent() {
        let mut store = PresetStore::new();
        for i in 0..STORE_SIZE as u16 {
            store.write_byte(i, (i % 251) as u8);
        }

        let mut once = ActionTable::power_on();
        once.load_preset(&store, 7);
        let mut twice = once.clone();
        twice.load_preset(&store, 7);
        assert_eq!(once, twice);
    }

    #[test]
    fn load_preset_overwrites_unconditionally() {
        let store = PresetStore::new();
        let mut table = ActionTable::power_on();
        // Preset 0 is erased: loading it silences slot 0.
        table.load_preset(&store, 0);
        assert!(table.record(0).is_disabled());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Preset Store Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn store_write_read_roundtrip() {
        let mut store = PresetStore::new();
        store.write_byte(0, 0xAA);
        store.write_byte(511, 0x55);
        assert_eq!(store.read_byte(0), 0xAA);
        assert_eq!(store.read_byte(511), 0x55);
    }

    #[test]
    fn store_dirty_only_on_change() {
        let mut store = PresetStore::new();
        store.write_byte(10, 0);
        assert!(!store.is_dirty());
        store.write_byte(10, 1);
        assert!(store.is_dirty());
    }

    #[test]
    fn store_wraps_out_of_range_addresses() {
        let mut store = PresetStore::new();
        store.write_byte(512, 7);
        assert_eq!(store.read_byte(0), 7);
    }

    // ════════════════════════════════════════════════════════════════════════
    // USB-MIDI Packet Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn packet_from_short_bytes_fails() {
        assert!(UsbMidiPacket::from_bytes(&[]).is_none());
        assert!(UsbMidiPacket::from_bytes(&[0x0B]).is_none());
        assert!(UsbMidiPacket::from_bytes(&[0x0B, 0xB0, 15]).is_none());
    }

    #[test]
    fn packet_accessors() {
        let packet = UsbMidiPacket::from_bytes(&[0x2B, 0xB3, 15, 1]).unwrap();
        assert_eq!(packet.cable(), 2);
        assert_eq!(packet.code_index(), 0xB);
        assert_eq!(packet.message_type(), 0xB);
        assert_eq!(packet.channel(), 3);
    }

    #[test]
    fn packet_units_split_double_transfers() {
        // An 8-byte bulk read carries two events.
        let buf = [0x09, 0x90, 60, 100, 0x08, 0x80, 60, 0];
        let units: Vec<_> = UsbMidiPacket::units(&buf).collect();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].to_bytes(), [0x09, 0x90, 60, 100]);
        assert_eq!(units[1].to_bytes(), [0x08, 0x80, 60, 0]);
    }

    #[test]
    fn packet_units_drop_trailing_partial() {
        let buf = [0x09, 0x90, 60, 100, 0x08, 0x80];
        assert_eq!(UsbMidiPacket::units(&buf).count(), 1);
    }

    #[test]
    fn program_change_packet_masks_to_seven_bits() {
        let packet = UsbMidiPacket::program_change(200);
        assert_eq!(packet.to_bytes(), [0x0C, 0xC0, 200 & 0x7F, 0]);
    }
}
