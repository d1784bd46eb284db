//! Core drive model and servo drivers for the NinjaBot, a two-servo
//! differential-drive robot, on no-std embedded platforms.
//!
//! For a host-side runner, see `ninjabot-app/mock-mcu`.
#![no_std]

pub mod utils;
