//! Math utilities for the NinjaBot.
//!
//! This module provides the open-loop differential-drive model: bias-compensated
//! servo pairs and distance/angle to wait-time conversion.

pub mod kinematics;
