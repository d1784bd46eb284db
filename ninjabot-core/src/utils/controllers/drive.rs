//! Differential drive control for the NinjaBot.
//!
//! `DriveController` owns the calibration state and turns high-level motion
//! requests into servo pairs and, for timed moves, a blocking wait followed by
//! a stop. Commands are also accepted as JSON frames (`DriveCommand`).

use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};

use super::servo::{ServoDriver, Wheel};
use crate::utils::math::kinematics::{
    biased_pair, clamp_bias, is_usable_rate, pivot_pair, timed_pivot_pair, wait_ms, Direction, ServoPair, Side,
    NEUTRAL_ANGLE, NEUTRAL_BIAS,
};

/// Calibration state shared by every motion command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// `0..=100`; 0 = full left bias, 100 = full right bias.
    pub bias: u8,
    /// Distance units covered per second of straight driving.
    pub distance_rate: f64,
    /// Degrees turned per second of a timed pivot.
    pub turn_rate: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            bias: NEUTRAL_BIAS,
            distance_rate: 100.0,
            turn_rate: 200.0,
        }
    }
}

/// Drive command variants.
///
/// Serialized as JSON with tag `"dc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "dc", rename_all = "snake_case")]
pub enum DriveCommand {
    // Configuration Variants
    /// Set the left/right bias (clamped to `0..=100`).
    Bias { b: i32 },
    /// Calibrate distance units per second.
    DistanceRate { r: f64 },
    /// Calibrate degrees per second.
    TurnRate { r: f64 },

    // Continuous Variants
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Neutral,

    // Timed Variants
    MoveForward { d: f64 },
    MoveBackward { d: f64 },
    TurnRightBy { deg: f64 },
    TurnLeftBy { deg: f64 },
}

/// Log a warning for a rate that makes timed waits meaningless.
fn warn_unusable_rate(
    kind: &str,
    rate: f64,
) {
    if !is_usable_rate(rate) {
        tracing::warn!(kind, rate, "non-positive rate, timed motion will not stop as expected");
    }
}

/// Decode a JSON command frame.
pub fn parse_command(frame: &str) -> Result<DriveCommand, serde_json::Error> {
    serde_json::from_str::<DriveCommand>(frame)
}

/// Open-loop controller for two continuous-rotation servos.
pub struct DriveController<S, D> {
    servos: S,
    delay: D,
    calibration: Calibration,
}

impl<S, D> DriveController<S, D>
where
    S: ServoDriver,
    D: DelayNs,
{
    /// Create a controller with default calibration.
    pub fn new(
        servos: S,
        delay: D,
    ) -> Self {
        Self::with_calibration(servos, delay, Calibration::default())
    }

    /// Create a controller with the given calibration. Bias is clamped.
    pub fn with_calibration(
        servos: S,
        delay: D,
        calibration: Calibration,
    ) -> Self {
        let mut calibration = calibration;
        calibration.bias = clamp_bias(calibration.bias as i32);
        warn_unusable_rate("distance", calibration.distance_rate);
        warn_unusable_rate("turn", calibration.turn_rate);
        Self {
            servos,
            delay,
            calibration,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn bias(&self) -> u8 {
        self.calibration.bias
    }

    /// Store a new bias, clamped to `0..=100`.
    pub fn set_bias(
        &mut self,
        bias: i32,
    ) {
        self.calibration.bias = clamp_bias(bias);
        tracing::info!(requested = bias, bias = self.calibration.bias, "bias set");
    }

    /// Overwrite the distance calibration. Not validated.
    pub fn set_distance_rate_per_second(
        &mut self,
        rate: f64,
    ) {
        warn_unusable_rate("distance", rate);
        self.calibration.distance_rate = rate;
    }

    /// Overwrite the turn calibration. Not validated.
    pub fn set_turn_rate_per_second(
        &mut self,
        rate: f64,
    ) {
        warn_unusable_rate("turn", rate);
        self.calibration.turn_rate = rate;
    }

    /// Pair that `drive(direction)` would write at the current bias.
    pub fn biased_pair(
        &self,
        direction: Direction,
    ) -> ServoPair {
        biased_pair(self.calibration.bias, direction)
    }

    /// Drive straight until another command is issued.
    pub fn drive(
        &mut self,
        direction: Direction,
    ) -> Result<(), S::Error> {
        let pair = self.biased_pair(direction);
        tracing::debug!(?direction, ?pair, "drive");
        self.servos.apply(pair)
    }

    pub fn drive_forward(&mut self) -> Result<(), S::Error> {
        self.drive(Direction::Forward)
    }

    pub fn drive_backward(&mut self) -> Result<(), S::Error> {
        self.drive(Direction::Backward)
    }

    /// Full-speed pivot until another command is issued. Ignores bias.
    pub fn turn(
        &mut self,
        side: Side,
    ) -> Result<(), S::Error> {
        self.servos.apply(pivot_pair(side))
    }

    pub fn turn_left(&mut self) -> Result<(), S::Error> {
        self.turn(Side::Left)
    }

    pub fn turn_right(&mut self) -> Result<(), S::Error> {
        self.turn(Side::Right)
    }

    /// Stop pulse generation on both channels.
    ///
    /// An untrimmed continuous servo may creep at positional 90, so this
    /// releases the outputs instead. A positional servo stays where it is
    /// with no holding torque.
    pub fn stop(&mut self) -> Result<(), S::Error> {
        self.servos.apply(ServoPair::off())
    }

    /// Command positional 90 on both channels.
    pub fn neutral(&mut self) -> Result<(), S::Error> {
        self.servos.write_positional(Wheel::Left, NEUTRAL_ANGLE)?;
        self.servos.write_positional(Wheel::Right, NEUTRAL_ANGLE)
    }

    /// Drive `distance` units, then stop.
    pub fn move_by(
        &mut self,
        direction: Direction,
        distance: f64,
    ) -> Result<(), S::Error> {
        let wait = wait_ms(distance, self.calibration.distance_rate);
        tracing::debug!(?direction, distance, wait, "timed move");
        let pair = self.biased_pair(direction);
        self.run_for(pair, wait)
    }

    pub fn move_forward(
        &mut self,
        distance: f64,
    ) -> Result<(), S::Error> {
        self.move_by(Direction::Forward, distance)
    }

    pub fn move_backward(
        &mut self,
        distance: f64,
    ) -> Result<(), S::Error> {
        self.move_by(Direction::Backward, distance)
    }

    /// Pivot through `degrees` at reduced speed, then stop.
    pub fn turn_by(
        &mut self,
        side: Side,
        degrees: f64,
    ) -> Result<(), S::Error> {
        let wait = wait_ms(degrees, self.calibration.turn_rate);
        tracing::debug!(?side, degrees, wait, "timed turn");
        self.run_for(timed_pivot_pair(side), wait)
    }

    /// Write `pair`, wait `wait` ms, then stop.
    ///
    /// A failed pair write may leave one channel driving, so both channels are
    /// released before the write error is returned.
    fn run_for(
        &mut self,
        pair: ServoPair,
        wait: u32,
    ) -> Result<(), S::Error> {
        if let Err(e) = self.servos.apply(pair) {
            tracing::error!("Servo write failed, releasing both channels: {:?}", e);
            if let Err(stop_err) = self.stop() {
                tracing::error!("Servo release failed: {:?}", stop_err);
            }
            return Err(e);
        }
        self.delay.delay_ms(wait);
        self.stop()
    }

    pub fn turn_right_by(
        &mut self,
        degrees: f64,
    ) -> Result<(), S::Error> {
        self.turn_by(Side::Right, degrees)
    }

    pub fn turn_left_by(
        &mut self,
        degrees: f64,
    ) -> Result<(), S::Error> {
        self.turn_by(Side::Left, degrees)
    }

    /// Execute a high-level `DriveCommand`. Blocks until timed moves finish.
    pub fn execute_command(
        &mut self,
        command: DriveCommand,
    ) -> Result<(), S::Error> {
        match command {
            DriveCommand::Bias { b } => {
                self.set_bias(b);
                Ok(())
            }
            DriveCommand::DistanceRate { r } => {
                self.set_distance_rate_per_second(r);
                Ok(())
            }
            DriveCommand::TurnRate { r } => {
                self.set_turn_rate_per_second(r);
                Ok(())
            }
            DriveCommand::Forward => self.drive_forward(),
            DriveCommand::Backward => self.drive_backward(),
            DriveCommand::Left => self.turn_left(),
            DriveCommand::Right => self.turn_right(),
            DriveCommand::Stop => self.stop(),
            DriveCommand::Neutral => self.neutral(),
            DriveCommand::MoveForward { d } => self.move_forward(d),
            DriveCommand::MoveBackward { d } => self.move_backward(d),
            DriveCommand::TurnRightBy { deg } => self.turn_right_by(deg),
            DriveCommand::TurnLeftBy { deg } => self.turn_left_by(deg),
        }
    }
}
