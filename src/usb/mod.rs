//! USB Device subsystem - presents a class-compliant MIDI device to
//! the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. One MIDIStreaming interface with a single embedded
//! jack pair carries everything: joystick events and program changes
//! flow host-ward, configuration opcodes and preset selections flow
//! device-ward on the same cable.

pub mod midi_device;

pub use midi_device::{init, run_usb_device, UsbMidiDevice};
