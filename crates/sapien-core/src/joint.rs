//! Joint Frame - one sensor tick of skeletal joint positions
//!
//! The skeleton tracker is an external collaborator. It hands us a frame of
//! named joints per tick; joints it could not track are simply absent.

use std::collections::HashMap;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::{SapienError, SapienResult};

/// Joint identifier for the tracked upper-body skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointName {
    // Head and torso
    Head,
    ShoulderCenter,
    Spine,
    HipCenter,

    // Left arm
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,

    // Right arm
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
}

impl JointName {
    /// All joints in order
    pub fn all() -> &'static [JointName] {
        &[
            JointName::Head,
            JointName::ShoulderCenter,
            JointName::Spine,
            JointName::HipCenter,
            JointName::ShoulderLeft,
            JointName::ElbowLeft,
            JointName::WristLeft,
            JointName::HandLeft,
            JointName::ShoulderRight,
            JointName::ElbowRight,
            JointName::WristRight,
            JointName::HandRight,
        ]
    }

    /// Number of joints
    pub fn count() -> usize {
        12
    }
}

/// 3D position in sensor space (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn dot(&self, other: &Position3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length of the vector from the origin
    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Distance to another position
    pub fn distance(&self, other: &Position3D) -> f64 {
        (*self - *other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Position3D {
    type Output = Position3D;

    #[inline]
    fn sub(self, rhs: Position3D) -> Self::Output {
        Position3D {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// Snapshot of joint positions for one sensor tick.
///
/// Frames are immutable once built; the dispatcher borrows each one for a
/// single pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointFrame {
    /// Sensor tick number
    #[serde(default)]
    pub sequence: u64,
    joints: HashMap<JointName, Position3D>,
}

impl JointFrame {
    /// Create an empty frame
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            joints: HashMap::with_capacity(JointName::count()),
        }
    }

    /// Builder-style joint insertion
    pub fn with_joint(mut self, joint: JointName, position: Position3D) -> Self {
        self.joints.insert(joint, position);
        self
    }

    /// Look up a joint, failing with `MissingJoint` when it was not tracked
    pub fn joint(&self, joint: JointName) -> SapienResult<Position3D> {
        let position = self
            .joints
            .get(&joint)
            .copied()
            .ok_or(SapienError::MissingJoint(joint))?;

        if !position.is_finite() {
            return Err(SapienError::NonFinitePosition);
        }
        Ok(position)
    }

    pub fn contains(&self, joint: JointName) -> bool {
        self.joints.contains_key(&joint)
    }

    /// Number of tracked joints
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

impl FromIterator<(JointName, Position3D)> for JointFrame {
    fn from_iter<I: IntoIterator<Item = (JointName, Position3D)>>(iter: I) -> Self {
        Self {
            sequence: 0,
            joints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ops() {
        let a = Position3D::new(1.0, 2.0, 2.0);
        let b = Position3D::new(1.0, 0.0, 0.0);

        assert!((a.magnitude() - 3.0).abs() < 1e-12);
        assert_eq!(a - b, Position3D::new(0.0, 2.0, 2.0));
        assert!((a.distance(&b) - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_joint() {
        let frame = JointFrame::new(7).with_joint(JointName::Spine, Position3D::zero());

        assert!(frame.joint(JointName::Spine).is_ok());
        assert_eq!(
            frame.joint(JointName::ElbowLeft),
            Err(SapienError::MissingJoint(JointName::ElbowLeft))
        );
    }

    #[test]
    fn test_non_finite_joint_is_rejected() {
        let frame = JointFrame::new(0)
            .with_joint(JointName::HandLeft, Position3D::new(f64::NAN, 0.0, 0.0));

        assert_eq!(
            frame.joint(JointName::HandLeft),
            Err(SapienError::NonFinitePosition)
        );
    }

    #[test]
    fn test_frame_from_json() {
        let json = r#"{
            "sequence": 3,
            "joints": {
                "ShoulderCenter": { "x": 0.0, "y": 0.5, "z": 2.0 },
                "Spine": { "x": 0.0, "y": 0.1, "z": 2.0 }
            }
        }"#;

        let frame: JointFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.sequence, 3);
        assert_eq!(frame.len(), 2);
        assert!(frame.contains(JointName::Spine));
    }

    #[test]
    fn test_joint_count() {
        assert_eq!(JointName::all().len(), JointName::count());
    }
}
