use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embedded_hal_mock::eh1::delay::StdSleep;
use ninjabot_core::utils::controllers::{
    parse_command, Calibration, DriveCommand, ServoDriver, Wheel, DRIVE_CHANNEL,
};
use ninjabot_core::utils::SystemController;
use static_cell::StaticCell;
use std::convert::Infallible;
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// initial left/right bias (0 = full left, 100 = full right)
    #[clap(long, default_value_t = 50)]
    bias: i32,
    /// distance units covered per second of straight driving
    #[clap(long, default_value_t = 100.0)]
    distance_rate: f64,
    /// degrees turned per second of a timed pivot
    #[clap(long, default_value_t = 200.0)]
    turn_rate: f64,
    /// JSON drive commands, e.g. '{"dc":"move_forward","d":200}'
    commands: Vec<String>,
}

/// Servo backend that logs every write instead of generating pulses.
struct SerialServoDriver;

impl ServoDriver for SerialServoDriver {
    type Error = Infallible;

    fn write_positional(
        &mut self,
        wheel: Wheel,
        value: u8,
    ) -> Result<(), Self::Error> {
        info!("SERVO {:?}: positional {}", wheel, value);
        Ok(())
    }

    fn write_raw(
        &mut self,
        wheel: Wheel,
        value: u16,
    ) -> Result<(), Self::Error> {
        info!("SERVO {:?}: raw {}", wheel, value);
        Ok(())
    }
}

#[embassy_executor::task]
async fn drive_task(mut ctrl: SystemController<SerialServoDriver, StdSleep>) -> ! {
    ctrl.drive_ch().await
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let mut ctrl = SystemController::new(
        SerialServoDriver,
        StdSleep::new(),
        Some(Calibration {
            distance_rate: opts.distance_rate,
            turn_rate: opts.turn_rate,
            ..Calibration::default()
        }),
    );
    // routed through the setter so out-of-range values are clamped and logged
    ctrl.drive.set_bias(opts.bias);
    spawner.spawn(drive_task(ctrl)).unwrap();

    for frame in &opts.commands {
        match parse_command(frame) {
            Ok(cmd) => DRIVE_CHANNEL.send(cmd).await,
            Err(error) => error!(?error, %frame, "Invalid command format"),
        }
    }
    // always finish released
    DRIVE_CHANNEL.send(DriveCommand::Stop).await;
    info!("All commands queued, press Ctrl-C to exit");
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
