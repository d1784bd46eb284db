//! Open-loop kinematics for a two-servo differential-drive robot.
//!
//! Both wheels are continuous-rotation servos mounted mirrored, so driving
//! straight means commanding opposite ends of the 0..=180 range on the two
//! channels. A bias value (0..=100, 50 = neutral) pulls one wheel toward the
//! stopped command (90) to compensate for mechanical asymmetry.
//!
//! # Example
//! ```rust
//! use ninjabot_core::utils::math::kinematics::{biased_pair, wait_ms, Direction, Pulse};
//! let pair = biased_pair(0, Direction::Forward);
//! assert_eq!(pair.left, Pulse::Angle(0));
//! assert_eq!(pair.right, Pulse::Angle(130));
//! assert_eq!(wait_ms(200.0, 100.0), 2000);
//! ```
//!
/// Neutral bias: no wheel is slowed.
pub const NEUTRAL_BIAS: u8 = 50;
/// Upper bound of the bias range.
pub const MAX_BIAS: u8 = 100;
/// Largest positional servo command.
pub const MAX_ANGLE: u8 = 180;
/// Positional command that holds a trimmed continuous servo still.
pub const NEUTRAL_ANGLE: u8 = 90;

const MILLIS_PER_SECOND: f64 = 1000.0;

/// Straight-line driving direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Pivot turn side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Command for a single servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// Positional command in `0..=180`.
    Angle(u8),
    /// No pulse generation at all.
    Off,
}

/// Commands for both wheels, written left (channel A) then right (channel B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoPair {
    pub left: Pulse,
    pub right: Pulse,
}

impl ServoPair {
    /// Both channels at the given positional command.
    pub const fn angles(
        left: u8,
        right: u8,
    ) -> Self {
        Self {
            left: Pulse::Angle(left),
            right: Pulse::Angle(right),
        }
    }

    /// Both channels released.
    pub const fn off() -> Self {
        Self {
            left: Pulse::Off,
            right: Pulse::Off,
        }
    }
}

/// Clamp an arbitrary requested bias into `0..=100`.
pub fn clamp_bias(bias: i32) -> u8 {
    bias.clamp(0, MAX_BIAS as i32) as u8
}

/// Compute the bias-compensated pair for straight-line driving.
///
/// At bias 50 the wheels get a pure 0/180 split. Below 50 the right wheel is
/// pulled toward 90 by `50 - bias`; above 50 the left wheel is pulled toward
/// 90 by `bias - 50`. At either extreme one wheel is fully stopped.
pub fn biased_pair(
    bias: u8,
    direction: Direction,
) -> ServoPair {
    let bias = bias.min(MAX_BIAS);
    let below = NEUTRAL_BIAS.saturating_sub(bias);
    let above = bias.saturating_sub(NEUTRAL_BIAS);

    match direction {
        Direction::Forward => ServoPair::angles(above, MAX_ANGLE - below),
        Direction::Backward => ServoPair::angles(MAX_ANGLE - above, below),
    }
}

/// Full-speed pivot pair used by continuous turns. Independent of bias.
pub fn pivot_pair(side: Side) -> ServoPair {
    match side {
        Side::Left => ServoPair::angles(0, 0),
        Side::Right => ServoPair::angles(MAX_ANGLE, MAX_ANGLE),
    }
}

/// Reduced-speed pivot pair used by timed turns to limit wheel slip.
pub fn timed_pivot_pair(side: Side) -> ServoPair {
    match side {
        Side::Left => ServoPair::angles(50, 50),
        Side::Right => ServoPair::angles(130, 130),
    }
}

/// Whether a calibration rate yields finite, non-negative waits.
pub fn is_usable_rate(rate: f64) -> bool {
    rate > 0.0
}

/// Convert a distance or angle into a wait in milliseconds at `rate_per_second`.
///
/// Multiplies before dividing so small amounts do not collapse to zero.
/// The result truncates toward zero; a negative or NaN result yields 0 and a
/// zero rate yields `u32::MAX`.
pub fn wait_ms(
    amount: f64,
    rate_per_second: f64,
) -> u32 {
    ((amount * MILLIS_PER_SECOND) / rate_per_second) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bias() {
        assert_eq!(clamp_bias(-10), 0);
        assert_eq!(clamp_bias(150), 100);
        assert_eq!(clamp_bias(50), 50);
        for b in -50..=150 {
            assert!(clamp_bias(b) <= MAX_BIAS);
        }
    }

    #[test]
    fn test_neutral_bias_is_pure_split() {
        assert_eq!(biased_pair(50, Direction::Forward), ServoPair::angles(0, 180));
        assert_eq!(biased_pair(50, Direction::Backward), ServoPair::angles(180, 0));
    }

    #[test]
    fn test_forward_extremes() {
        assert_eq!(biased_pair(0, Direction::Forward), ServoPair::angles(0, 130));
        assert_eq!(biased_pair(100, Direction::Forward), ServoPair::angles(50, 180));
    }

    #[test]
    fn test_backward_extremes() {
        assert_eq!(biased_pair(0, Direction::Backward), ServoPair::angles(180, 50));
        assert_eq!(biased_pair(100, Direction::Backward), ServoPair::angles(130, 0));
    }

    #[test]
    fn test_partial_bias() {
        assert_eq!(biased_pair(40, Direction::Forward), ServoPair::angles(0, 170));
        assert_eq!(biased_pair(65, Direction::Backward), ServoPair::angles(165, 0));
    }

    #[test]
    fn test_out_of_range_bias_is_clamped() {
        assert_eq!(biased_pair(200, Direction::Forward), biased_pair(100, Direction::Forward));
    }

    #[test]
    fn test_pivot_pairs() {
        assert_eq!(pivot_pair(Side::Left), ServoPair::angles(0, 0));
        assert_eq!(pivot_pair(Side::Right), ServoPair::angles(180, 180));
        assert_eq!(timed_pivot_pair(Side::Left), ServoPair::angles(50, 50));
        assert_eq!(timed_pivot_pair(Side::Right), ServoPair::angles(130, 130));
    }

    #[test]
    fn test_wait_ms() {
        assert_eq!(wait_ms(200.0, 100.0), 2000);
        assert_eq!(wait_ms(100.0, 200.0), 500);
        // would be 0 if divided first and truncated
        assert_eq!(wait_ms(1.0, 3.0), 333);
    }

    #[test]
    fn test_wait_ms_keeps_precision_for_long_moves() {
        assert_eq!(wait_ms(16_777_217.0, 100.0), 167_772_170);
    }

    #[test]
    fn test_usable_rate() {
        assert!(is_usable_rate(100.0));
        assert!(!is_usable_rate(0.0));
        assert!(!is_usable_rate(-1.0));
        assert!(!is_usable_rate(f64::NAN));
    }

    #[test]
    fn test_wait_ms_degenerate_rates() {
        assert_eq!(wait_ms(10.0, 0.0), u32::MAX);
        assert_eq!(wait_ms(10.0, -5.0), 0);
        assert_eq!(wait_ms(0.0, 0.0), 0);
    }
}
