//! SAPIEN Actuator - rate-limited hardware writes
//!
//! The sensor elevation motor accepts at most 15 writes per 20 seconds, at
//! least one second apart. This crate turns a noisy stream of angle requests
//! into a compliant write sequence:
//! - Debounce: bursts of requests collapse into one write of the latest angle
//! - Single-flight: at most one hardware write in flight
//! - Cooldown: fixed spacing after every write, successful or not
//! - Retry: a request that arrives while busy is deferred, never dropped

pub mod actuator;
pub mod config;
pub mod driver;
pub mod timer;

pub use actuator::*;
pub use config::*;
pub use driver::*;
pub use timer::*;
