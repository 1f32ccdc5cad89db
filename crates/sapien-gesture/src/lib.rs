//! SAPIEN Gesture Engine - pose recognition for robot arm control
//!
//! This crate implements the gesture side of the engine:
//! - Calibrated angle thresholds per gesture
//! - The closed set of gesture commands (predicate + action)
//! - The per-frame dispatcher that owns limb status
//!
//! A held pose fires exactly once: a command never matches while its limb
//! is already in the command's target status.

pub mod command;
pub mod dispatcher;
pub mod thresholds;

pub use command::*;
pub use dispatcher::*;
pub use thresholds::*;
