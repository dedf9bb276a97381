//! Joint, skeleton, and body-index value types shared across the pipeline.

pub mod body;
pub mod body_index;
pub mod joint;

pub use body::{Skeleton, SkeletonFrame, TrackingId, TrackingIndex};
pub use body_index::{BodyIndexFrame, BodyIndexSizeError, ImageSize, NO_BODY};
pub use joint::{JOINT_COUNT, Joint, JointKind, Joints, zeroed_joints};
