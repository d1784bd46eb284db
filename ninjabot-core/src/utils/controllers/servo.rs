//! Servo output for the NinjaBot.
//!
//! `ServoDriver` is the actuator primitive the drive model writes through: a
//! positional write (0..=180) and a raw write used to stop pulse generation.
//! `Pca9685Servos` implements it on a PCA9685 PWM expander sharing an I2C bus.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::math::kinematics::{Pulse, ServoPair, MAX_ANGLE};

/// Prescale giving a 50 Hz servo frame from the 25 MHz internal oscillator.
pub const SERVO_PRESCALE: u8 = 121;
/// Off-tick for a ~1.0 ms pulse (positional 0).
pub const MIN_PULSE_TICKS: u16 = 205;
/// Off-tick for a ~2.0 ms pulse (positional 180).
pub const MAX_PULSE_TICKS: u16 = 410;

/// Which servo channel to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    /// Channel A.
    Left,
    /// Channel B.
    Right,
}

/// Abstract servo output interface.
pub trait ServoDriver {
    type Error: core::fmt::Debug;

    /// Command a positional pulse (`0..=180`).
    fn write_positional(
        &mut self,
        wheel: Wheel,
        value: u8,
    ) -> Result<(), Self::Error>;

    /// Write a raw duty value. `0` stops pulse generation on the channel.
    fn write_raw(
        &mut self,
        wheel: Wheel,
        value: u16,
    ) -> Result<(), Self::Error>;

    /// Write both channels, left first.
    fn apply(
        &mut self,
        pair: ServoPair,
    ) -> Result<(), Self::Error> {
        self.write_pulse(Wheel::Left, pair.left)?;
        self.write_pulse(Wheel::Right, pair.right)
    }

    /// Write one channel, mapping `Pulse::Off` onto a raw zero.
    fn write_pulse(
        &mut self,
        wheel: Wheel,
        pulse: Pulse,
    ) -> Result<(), Self::Error> {
        match pulse {
            Pulse::Angle(value) => self.write_positional(wheel, value),
            Pulse::Off => self.write_raw(wheel, 0),
        }
    }
}

/// Errors that can occur when driving servos over the PWM expander.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
}

/// Map a positional command onto PCA9685 off-ticks. Values above 180 clamp.
pub fn angle_to_ticks(angle: u8) -> u16 {
    let angle = angle.min(MAX_ANGLE) as u16;
    MIN_PULSE_TICKS + (angle * (MAX_PULSE_TICKS - MIN_PULSE_TICKS)) / MAX_ANGLE as u16
}

/// Two continuous-rotation servos on a PCA9685 sharing an I2C bus.
pub struct Pca9685Servos<'a, I2C: 'static> {
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    channels: (Channel, Channel),
}

impl<'a, I2C, E> Pca9685Servos<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Create the driver with left on `C0` and right on `C1`.
    ///
    /// Construction does not touch the bus; an invalid address leaves the
    /// driver uninitialized and every write fails with `PwmNotInitialized`.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
    ) -> Self {
        Self::with_channels(i2c_bus, address, (Channel::C0, Channel::C1))
    }

    /// Create the driver on explicit `(left, right)` channels.
    pub fn with_channels(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
        channels: (Channel, Channel),
    ) -> Self {
        let pwm = match Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address)) {
            Ok(pwm) => Some(pwm),
            Err(e) => {
                tracing::error!("PCA9685 init failed: {:?}", e);
                None
            }
        };
        Self { pwm, channels }
    }

    /// Enable the oscillator and set the 50 Hz servo frame.
    pub fn configure(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(SERVO_PRESCALE)
            .map_err(DeviceError::PwmError)?;
        tracing::info!("PWM prescale set to 50Hz");
        Ok(())
    }

    fn channel(
        &self,
        wheel: Wheel,
    ) -> Channel {
        match wheel {
            Wheel::Left => self.channels.0,
            Wheel::Right => self.channels.1,
        }
    }

    fn set_off_ticks(
        &mut self,
        wheel: Wheel,
        ticks: u16,
    ) -> Result<(), DeviceError<E>> {
        let channel = self.channel(wheel);
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.set_channel_on_off(channel, 0, ticks)
            .map_err(DeviceError::PwmError)
    }
}

impl<I2C, E> ServoDriver for Pca9685Servos<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = DeviceError<E>;

    fn write_positional(
        &mut self,
        wheel: Wheel,
        value: u8,
    ) -> Result<(), Self::Error> {
        let ticks = angle_to_ticks(value);
        tracing::debug!(?wheel, value, ticks, "servo positional write");
        self.set_off_ticks(wheel, ticks)
    }

    fn write_raw(
        &mut self,
        wheel: Wheel,
        value: u16,
    ) -> Result<(), Self::Error> {
        tracing::debug!(?wheel, value, "servo raw write");
        self.set_off_ticks(wheel, value)
    }
}
