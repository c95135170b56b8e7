//! Internal-oscillator calibration against USB frame timing.
//!
//! Crystal-less parts derive their clock from an RC oscillator with an
//! 8-bit trim register. The USB host sends a Start-of-Frame every
//! millisecond, so the measured length of one frame in CPU cycles tells
//! us how far off the oscillator is. We binary-search the trim value
//! until the measured frame length matches the nominal target, then
//! scan the immediate neighborhood because the trim-to-frequency curve
//! is not perfectly monotonic at the last step.
//!
//! The routine is a pure algorithm over an injected
//! set-trim-then-measure closure, so it unit-tests on the host. The
//! nRF52840 build never calls it - that part clocks USB from its
//! crystal and has no trim register to tune. A port to a crystal-less
//! part would run it once on the bus-reset signal, with interrupts
//! disabled because frame measurement counts raw CPU cycles. It is
//! bounded (11 measurements) and always returns some trim value, even
//! on hardware that cannot reach the target exactly.

/// Nominal USB frame length in low-speed bit clocks at 1.5 Mbit/s,
/// as counted by the frame-measurement routine.
const FRAME_TICKS: u64 = 1499;

/// Reference clock rate the frame tick count is scaled against (Hz).
const REFERENCE_RATE: u64 = 10_500_000;

/// Target frame-length measurement for a CPU running at `cpu_hz`:
/// `round(1499 * cpu_hz / 10.5 MHz)`.
pub const fn frame_target(cpu_hz: u32) -> u16 {
    ((FRAME_TICKS * cpu_hz as u64 + REFERENCE_RATE / 2) / REFERENCE_RATE) as u16
}

/// Find the trim value whose measured frame length is closest to
/// `target`.
///
/// `set_and_measure` must program the oscillator trim register with the
/// given value and return the resulting frame-length measurement. The
/// caller is responsible for leaving the returned trim programmed
/// afterwards (the last closure invocation is not necessarily the
/// winner).
pub fn calibrate<M>(mut set_and_measure: M, target: u16) -> u8
where
    M: FnMut(u8) -> u16,
{
    // Binary search: measurement grows with trim, so keep the highest
    // trim that still measures below target.
    let mut trial: u8 = 0;
    let mut step: u8 = 128;
    while step > 0 {
        let probe = trial.wrapping_add(step);
        if set_and_measure(probe) < target {
            trial = probe;
        }
        step >>= 1;
    }

    // The search lands within +/-1 of the optimum; pick the neighbor
    // with the smallest absolute deviation (lowest trim wins ties).
    let mut best = trial;
    let mut best_dev = u16::MAX;
    let low = trial.saturating_sub(1);
    let high = trial.saturating_add(1);
    for candidate in low..=high {
        let dev = set_and_measure(candidate).abs_diff(target);
        if dev < best_dev {
            best_dev = dev;
            best = candidate;
        }
    }
    best
}
