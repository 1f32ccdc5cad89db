//! SAPIEN Runtime - session wiring
//!
//! A session owns one gesture dispatcher and one elevation actuator, built
//! from a single configuration:
//! 1. Load and validate configuration
//! 2. Install logging
//! 3. Feed joint frames through the dispatcher
//! 4. Forward elevation requests to the rate-limited actuator
//! 5. Tear down, flushing the last elevation request

pub mod config;
pub mod logging;
pub mod session;

pub use config::*;
pub use logging::*;
pub use session::*;
