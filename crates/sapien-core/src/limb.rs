//! Limb status tracking
//!
//! Each robot limb carries exactly one status at a time. The status only
//! changes when a recognized gesture is executed, which is what keeps a held
//! pose from firing on every frame.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Robot limb driven by gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limb {
    LeftArm,
    RightArm,
}

impl Limb {
    pub fn all() -> &'static [Limb] {
        &[Limb::LeftArm, Limb::RightArm]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftArm => "left-arm",
            Self::RightArm => "right-arm",
        }
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete pose of one limb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LimbStatus {
    Up,
    #[default]
    Down,
    In,
    Out,
}

impl LimbStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl fmt::Display for LimbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of every limb for one session.
///
/// Not synchronized: the owner (the dispatcher) is expected to receive frames
/// serially.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimbTracker {
    left_arm: LimbStatus,
    right_arm: LimbStatus,
}

impl LimbTracker {
    /// All limbs start `Down`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, limb: Limb) -> LimbStatus {
        match limb {
            Limb::LeftArm => self.left_arm,
            Limb::RightArm => self.right_arm,
        }
    }

    /// Set a limb's status, returning the previous one
    pub fn set(&mut self, limb: Limb, status: LimbStatus) -> LimbStatus {
        let slot = match limb {
            Limb::LeftArm => &mut self.left_arm,
            Limb::RightArm => &mut self.right_arm,
        };
        std::mem::replace(slot, status)
    }

    pub fn is(&self, limb: Limb, status: LimbStatus) -> bool {
        self.status(limb) == status
    }

    /// Session teardown
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
