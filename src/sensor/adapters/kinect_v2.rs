//! Kinect v2 backend: poll-mode adapter over a native body-frame reader.
//!
//! The native device bindings live behind [`BodyFrameReader`]; this module
//! owns the translation from the SDK's frame layout into the shared skeleton
//! model. Astra Pro devices speak the same wire protocol and reuse this
//! adapter unchanged.

use std::sync::Arc;

use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::sensor::adapter::{FrameDelivery, SensorAdapter};
use crate::skeleton::{
    BodyIndexFrame, ImageSize, Joint, JointKind, Joints, Skeleton, SkeletonFrame, TrackingIndex,
};

/// Native Kinect v2 frame layout, as delivered by the SDK.
pub mod raw {
    use crate::skeleton::{JOINT_COUNT, JointKind};

    /// The sensor always reports this many body slots per frame.
    pub const BODY_COUNT: usize = 6;
    /// Depth/body-index image width in pixels.
    pub const DEPTH_IMAGE_WIDTH: usize = 512;
    /// Depth/body-index image height in pixels.
    pub const DEPTH_IMAGE_HEIGHT: usize = 424;

    /// Camera-space joint position in metres, in the SDK's joint order
    /// (which the model's [`JointKind`] mirrors).
    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    pub struct NativeJoint {
        pub x: f32,
        pub y: f32,
        pub z: f32,
    }

    /// One of the six body slots of a native frame.
    #[derive(Debug, Clone, PartialEq)]
    pub struct NativeBody {
        pub tracking_id: u64,
        pub is_tracked: bool,
        pub joints: [NativeJoint; JOINT_COUNT],
    }

    impl NativeBody {
        /// An empty slot, as the sensor reports bodies it is not tracking.
        pub fn untracked() -> Self {
            Self {
                tracking_id: 0,
                is_tracked: false,
                joints: [NativeJoint::default(); JOINT_COUNT],
            }
        }

        /// A tracked body with all joints at the origin.
        pub fn tracked(tracking_id: u64) -> Self {
            Self {
                tracking_id,
                is_tracked: true,
                joints: [NativeJoint::default(); JOINT_COUNT],
            }
        }

        /// Place one joint; useful when scripting replay recordings.
        pub fn with_joint(mut self, kind: JointKind, x: f32, y: f32, z: f32) -> Self {
            self.joints[kind.index()] = NativeJoint { x, y, z };
            self
        }
    }

    /// One native body frame: all six slots, tracked or not. The slot
    /// position is the body's tracking index.
    #[derive(Debug, Clone, PartialEq)]
    pub struct NativeBodyFrame {
        pub bodies: [NativeBody; BODY_COUNT],
    }

    impl NativeBodyFrame {
        pub fn empty() -> Self {
            Self {
                bodies: std::array::from_fn(|_| NativeBody::untracked()),
            }
        }

        pub fn with_body(mut self, slot: usize, body: NativeBody) -> Self {
            self.bodies[slot] = body;
            self
        }
    }

    /// Row-major body-index pixels, `DEPTH_IMAGE_WIDTH * DEPTH_IMAGE_HEIGHT`
    /// bytes, background pixels 255.
    #[derive(Debug, Clone, PartialEq)]
    pub struct NativeBodyIndexFrame {
        pub pixels: Vec<u8>,
    }
}

/// Device seam for the Kinect v2 SDK's frame readers.
///
/// Acquisition follows the SDK's latest-frame semantics: each call yields a
/// frame only if one arrived since the previous call, and frames superseded
/// before acquisition are gone.
pub trait BodyFrameReader: Send {
    /// Open the device. Returns false when no device is present.
    fn open(&mut self) -> bool;

    /// Release the device. Must tolerate being called while closed.
    fn close(&mut self);

    /// The newest body frame since the last call, if any arrived.
    fn acquire_body_frame(&mut self) -> Option<raw::NativeBodyFrame>;

    /// The newest body-index frame since the last call, if any arrived.
    fn acquire_body_index_frame(&mut self) -> Option<raw::NativeBodyIndexFrame>;
}

const BODY_INDEX_SIZE: ImageSize =
    ImageSize::new(raw::DEPTH_IMAGE_WIDTH, raw::DEPTH_IMAGE_HEIGHT);

/// Poll-mode adapter for Kinect v2 class devices.
pub struct KinectV2Adapter {
    reader: Box<dyn BodyFrameReader>,
    ready: bool,
    latest: Option<SkeletonFrame>,
    pending_body_index: Option<BodyIndexFrame>,
}

impl KinectV2Adapter {
    pub fn new(reader: Box<dyn BodyFrameReader>) -> Self {
        Self {
            reader,
            ready: false,
            latest: None,
            pending_body_index: None,
        }
    }
}

/// Wrap each native body slot in a fresh shared skeleton.
fn translate_bodies(native: &raw::NativeBodyFrame) -> SkeletonFrame {
    let skeletons = native
        .bodies
        .iter()
        .enumerate()
        .map(|(slot, body)| {
            let joints: Joints = JointKind::ALL.map(|kind| {
                let p = body.joints[kind.index()];
                Joint::new(kind, Point3::new(p.x, p.y, p.z))
            });
            Arc::new(Skeleton::new(
                body.tracking_id,
                slot as TrackingIndex,
                body.is_tracked,
                joints,
            ))
        })
        .collect();
    SkeletonFrame::new(skeletons)
}

impl SensorAdapter for KinectV2Adapter {
    fn initialize(&mut self) {
        if self.ready {
            return;
        }
        self.ready = self.reader.open();
        if self.ready {
            info!("kinect v2 sensor initialized");
        } else {
            debug!("kinect v2 device not present");
        }
    }

    fn uninitialize(&mut self) {
        if !self.ready {
            return;
        }
        self.reader.close();
        self.ready = false;
        self.latest = None;
        self.pending_body_index = None;
        info!("kinect v2 sensor released");
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn delivery(&self) -> FrameDelivery {
        FrameDelivery::Poll
    }

    fn poll_frames(&mut self) {
        if !self.ready {
            return;
        }
        if let Some(native) = self.reader.acquire_body_frame() {
            self.latest = Some(translate_bodies(&native));
        }
        if let Some(native) = self.reader.acquire_body_index_frame() {
            match BodyIndexFrame::from_raw(BODY_INDEX_SIZE, native.pixels) {
                Ok(frame) => self.pending_body_index = Some(frame),
                Err(err) => warn!(error = %err, "discarding malformed body index frame"),
            }
        }
    }

    fn frame_data(&mut self) -> Option<SkeletonFrame> {
        self.latest.clone()
    }

    fn body_index_data(&mut self) -> Option<BodyIndexFrame> {
        self.pending_body_index.take()
    }

    fn body_index_size(&self) -> ImageSize {
        BODY_INDEX_SIZE
    }
}
