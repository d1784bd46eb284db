//! Utility re-exports for the NinjaBot.
//!
//! - `controllers`: drive controller, servo output and the command channel
//! - `math`: open-loop differential-drive model

pub mod controllers;
pub mod math;

pub use controllers::SystemController;
pub use math::kinematics::{Direction, Pulse, ServoPair, Side};
