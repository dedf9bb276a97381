//! Joint vocabulary and per-joint position type.

use nalgebra::Point3;

/// Number of joint labels in [`JointKind`].
pub const JOINT_COUNT: usize = 25;

/// Joint labels of the skeleton model, in the native Kinect v2 order.
///
/// The discriminant doubles as the index into a [`Joints`] array, so the
/// order here must not change. Backends with a different joint vocabulary
/// remap onto this one during translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JointKind {
    SpineBase = 0,
    SpineMid = 1,
    Neck = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
    SpineShoulder = 20,
    HandTipLeft = 21,
    ThumbLeft = 22,
    HandTipRight = 23,
    ThumbRight = 24,
}

impl JointKind {
    /// All joint labels, ordered by discriminant.
    pub const ALL: [JointKind; JOINT_COUNT] = [
        JointKind::SpineBase,
        JointKind::SpineMid,
        JointKind::Neck,
        JointKind::Head,
        JointKind::ShoulderLeft,
        JointKind::ElbowLeft,
        JointKind::WristLeft,
        JointKind::HandLeft,
        JointKind::ShoulderRight,
        JointKind::ElbowRight,
        JointKind::WristRight,
        JointKind::HandRight,
        JointKind::HipLeft,
        JointKind::KneeLeft,
        JointKind::AnkleLeft,
        JointKind::FootLeft,
        JointKind::HipRight,
        JointKind::KneeRight,
        JointKind::AnkleRight,
        JointKind::FootRight,
        JointKind::SpineShoulder,
        JointKind::HandTipLeft,
        JointKind::ThumbLeft,
        JointKind::HandTipRight,
        JointKind::ThumbRight,
    ];

    /// Position of this label in a [`Joints`] array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One labeled joint with its position in sensor camera space.
///
/// Positions are metres, right-handed: +x toward the sensor's left (the
/// facing user's right), +y up, +z out from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub kind: JointKind,
    pub position: Point3<f32>,
}

impl Joint {
    #[inline]
    pub fn new(kind: JointKind, position: Point3<f32>) -> Self {
        Self { kind, position }
    }
}

/// Fixed-size joint set, one entry per [`JointKind`], indexed by discriminant.
pub type Joints = [Joint; JOINT_COUNT];

/// A joint set with every position at the camera-space origin.
pub fn zeroed_joints() -> Joints {
    JointKind::ALL.map(|kind| Joint::new(kind, Point3::origin()))
}
