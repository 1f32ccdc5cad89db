//! SAPIEN Core - Fundamental types and primitives
//!
//! This crate defines the types shared by the gesture and actuation engines:
//! - Skeletal joints and per-tick joint frames
//! - Pose geometry (angles between joint vectors)
//! - Per-limb status tracking
//! - Error types

pub mod error;
pub mod geometry;
pub mod joint;
pub mod limb;

pub use error::*;
pub use geometry::*;
pub use joint::*;
pub use limb::*;
