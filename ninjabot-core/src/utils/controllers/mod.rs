//! Module Exports
//!
//! This file exports the controllers used by the drive system.
//!
//! - `servo`: servo output primitive and the PCA9685 backend.
//! - `drive`: bias-compensated differential drive and its command protocol.

pub mod drive;
/// Module for servo output over a PWM expander.
pub mod servo;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::delay::DelayNs;

pub use drive::{parse_command, Calibration, DriveCommand, DriveController};
pub use servo::{DeviceError, Pca9685Servos, ServoDriver, Wheel};

/// Channel used to receive drive commands (`DriveCommand` messages).
pub static DRIVE_CHANNEL: embassy_sync::channel::Channel<CriticalSectionRawMutex, DriveCommand, 16> =
    embassy_sync::channel::Channel::new();

pub struct SystemController<S, D> {
    pub drive: DriveController<S, D>,
}

impl<S, D> SystemController<S, D>
where
    S: ServoDriver,
    D: DelayNs,
{
    /// Build the controller, starting from defaults unless `calibration` is given.
    ///
    /// Both servos are released so the robot starts stationary.
    pub fn new(
        servos: S,
        delay: D,
        calibration: Option<Calibration>,
    ) -> Self {
        let calibration = calibration.unwrap_or_default();
        let mut drive = DriveController::with_calibration(servos, delay, calibration);

        if let Err(e) = drive.stop() {
            tracing::warn!("Initial servo release failed: {:?}", e);
        }
        tracing::info!(?calibration, "Drive controller ready");

        SystemController { drive }
    }

    /// Execute one command, logging the outcome.
    pub fn dispatch(
        &mut self,
        command: DriveCommand,
    ) -> Result<(), S::Error> {
        tracing::info!("Received Drive Command: {:?}", command);
        match self.drive.execute_command(command) {
            Ok(()) => {
                tracing::info!("Drive command executed successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Drive command failed: {:?}", e);
                Err(e)
            }
        }
    }

    /// Receive commands from `DRIVE_CHANNEL` and run them one at a time.
    pub async fn drive_ch(&mut self) -> ! {
        loop {
            let command = DRIVE_CHANNEL.receiver().receive().await;
            let _ = self.dispatch(command);
        }
    }
}
