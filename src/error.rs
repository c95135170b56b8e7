//! Unified error type for joy2midi.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging when the
//! `defmt` feature is enabled.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The outbound USB MIDI endpoint was not ready; the event is
    /// dropped, never queued or retried.
    TransportBusy,

    /// USB stack returned an error.
    Usb,
}
