//! Position-transition encoding.
//!
//! Maps (previous, current) position pairs to the transition codes 0-7
//! that index the action table:
//!
//! ```text
//! 0-3  departure from center into Up / Down / Left / Right
//! 4-7  return toward center from Up / Down / Left / Right
//! ```
//!
//! The rule is asymmetric on purpose: when the previous position was
//! off-center, the new position's axis value is ignored and the event
//! is encoded as a return from the previous direction. A direct jump
//! from Up to Down without passing through center therefore encodes as
//! "return from Up", not as a transition into Down. Sampling is fast
//! enough that such jumps are rare, and external configuration tools
//! depend on this numbering, so it must not be "fixed".

use super::position::Position;

/// Encode a position change as a transition code 0-7.
///
/// Returns `None` only when the position did not change.
pub fn encode(previous: Position, current: Position) -> Option<u8> {
    if previous == current {
        return None;
    }
    if previous != Position::Center {
        Some(previous as u8 + 3)
    } else {
        Some(current as u8 - 1)
    }
}
