//! Azure Kinect backend: push-mode adapter over a native capture stream.
//!
//! The body tracker SDK reports a 32-joint skeleton per body in millimetres
//! with y pointing down; translation remaps onto the shared 25-joint model
//! (clavicles and face points dropped), converts to metres, and flips the x
//! and y axes. A worker thread pumps captures into the notification channels
//! the driver drains.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::sensor::adapter::{FrameDelivery, SensorAdapter};
use crate::skeleton::{
    BodyIndexFrame, ImageSize, Joint, JointKind, Joints, Skeleton, SkeletonFrame, TrackingIndex,
};

/// Native Azure Kinect body-tracking layout, as delivered by the SDK.
pub mod raw {
    /// Joints per native skeleton.
    pub const JOINT_COUNT: usize = 32;
    /// Body-index map width in pixels (depth NFOV unbinned).
    pub const BODY_INDEX_MAP_WIDTH: usize = 640;
    /// Body-index map height in pixels.
    pub const BODY_INDEX_MAP_HEIGHT: usize = 576;
    /// Body-index map value for pixels no body owns.
    pub const BACKGROUND: u8 = 255;

    /// Native joint ids, indexing [`NativeBody::skeleton`].
    pub mod joint_id {
        pub const PELVIS: usize = 0;
        pub const SPINE_NAVEL: usize = 1;
        pub const SPINE_CHEST: usize = 2;
        pub const NECK: usize = 3;
        pub const CLAVICLE_LEFT: usize = 4;
        pub const SHOULDER_LEFT: usize = 5;
        pub const ELBOW_LEFT: usize = 6;
        pub const WRIST_LEFT: usize = 7;
        pub const HAND_LEFT: usize = 8;
        pub const HANDTIP_LEFT: usize = 9;
        pub const THUMB_LEFT: usize = 10;
        pub const CLAVICLE_RIGHT: usize = 11;
        pub const SHOULDER_RIGHT: usize = 12;
        pub const ELBOW_RIGHT: usize = 13;
        pub const WRIST_RIGHT: usize = 14;
        pub const HAND_RIGHT: usize = 15;
        pub const HANDTIP_RIGHT: usize = 16;
        pub const THUMB_RIGHT: usize = 17;
        pub const HIP_LEFT: usize = 18;
        pub const KNEE_LEFT: usize = 19;
        pub const ANKLE_LEFT: usize = 20;
        pub const FOOT_LEFT: usize = 21;
        pub const HIP_RIGHT: usize = 22;
        pub const KNEE_RIGHT: usize = 23;
        pub const ANKLE_RIGHT: usize = 24;
        pub const FOOT_RIGHT: usize = 25;
        pub const HEAD: usize = 26;
        pub const NOSE: usize = 27;
        pub const EYE_LEFT: usize = 28;
        pub const EAR_LEFT: usize = 29;
        pub const EYE_RIGHT: usize = 30;
        pub const EAR_RIGHT: usize = 31;
    }

    /// Joint position in millimetres, depth-camera frame (x right, y down,
    /// z forward).
    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    pub struct NativeJoint {
        pub position_mm: [f32; 3],
    }

    /// One tracked body. The tracker only reports bodies it is tracking.
    #[derive(Debug, Clone, PartialEq)]
    pub struct NativeBody {
        pub id: u32,
        pub skeleton: [NativeJoint; JOINT_COUNT],
    }

    impl NativeBody {
        pub fn new(id: u32) -> Self {
            Self {
                id,
                skeleton: [NativeJoint::default(); JOINT_COUNT],
            }
        }

        /// Place one native joint; useful when scripting captures.
        pub fn with_joint_mm(mut self, joint: usize, x: f32, y: f32, z: f32) -> Self {
            self.skeleton[joint] = NativeJoint {
                position_mm: [x, y, z],
            };
            self
        }
    }

    /// One processed capture: tracked bodies plus the body-index map whose
    /// pixel values are positions in `bodies` (or [`BACKGROUND`]).
    #[derive(Debug, Clone, PartialEq)]
    pub struct NativeCapture {
        pub bodies: Vec<NativeBody>,
        pub body_index_map: Vec<u8>,
    }

    impl NativeCapture {
        /// A capture with an all-background body-index map.
        pub fn new(bodies: Vec<NativeBody>) -> Self {
            Self {
                bodies,
                body_index_map: vec![BACKGROUND; BODY_INDEX_MAP_WIDTH * BODY_INDEX_MAP_HEIGHT],
            }
        }

        pub fn with_body_index_map(mut self, map: Vec<u8>) -> Self {
            self.body_index_map = map;
            self
        }
    }
}

/// Device seam for the Azure Kinect capture/tracker loop.
///
/// `next_capture` may block while the device works, but must return within a
/// bounded time so teardown is not held up; `None` means the stream has
/// ended (device stopped delivering or was closed).
pub trait CaptureStream: Send + 'static {
    /// Open the device and start the body tracker. False when absent.
    fn open(&mut self) -> bool;

    /// Stop the tracker and release the device. Must tolerate being called
    /// while closed.
    fn close(&mut self);

    /// Block for the next processed capture, `None` once the stream ends.
    fn next_capture(&mut self) -> Option<raw::NativeCapture>;
}

const BODY_INDEX_SIZE: ImageSize =
    ImageSize::new(raw::BODY_INDEX_MAP_WIDTH, raw::BODY_INDEX_MAP_HEIGHT);

/// Frames buffered per notification channel before the pump drops instead
/// of queuing.
const CHANNEL_DEPTH: usize = 4;

/// Native source joint backing each model joint.
fn source_joint(kind: JointKind) -> usize {
    use raw::joint_id as id;
    match kind {
        JointKind::SpineBase => id::PELVIS,
        JointKind::SpineMid => id::SPINE_NAVEL,
        JointKind::Neck => id::NECK,
        JointKind::Head => id::HEAD,
        JointKind::ShoulderLeft => id::SHOULDER_LEFT,
        JointKind::ElbowLeft => id::ELBOW_LEFT,
        JointKind::WristLeft => id::WRIST_LEFT,
        JointKind::HandLeft => id::HAND_LEFT,
        JointKind::ShoulderRight => id::SHOULDER_RIGHT,
        JointKind::ElbowRight => id::ELBOW_RIGHT,
        JointKind::WristRight => id::WRIST_RIGHT,
        JointKind::HandRight => id::HAND_RIGHT,
        JointKind::HipLeft => id::HIP_LEFT,
        JointKind::KneeLeft => id::KNEE_LEFT,
        JointKind::AnkleLeft => id::ANKLE_LEFT,
        JointKind::FootLeft => id::FOOT_LEFT,
        JointKind::HipRight => id::HIP_RIGHT,
        JointKind::KneeRight => id::KNEE_RIGHT,
        JointKind::AnkleRight => id::ANKLE_RIGHT,
        JointKind::FootRight => id::FOOT_RIGHT,
        JointKind::SpineShoulder => id::SPINE_CHEST,
        JointKind::HandTipLeft => id::HANDTIP_LEFT,
        JointKind::ThumbLeft => id::THUMB_LEFT,
        JointKind::HandTipRight => id::HANDTIP_RIGHT,
        JointKind::ThumbRight => id::THUMB_RIGHT,
    }
}

/// Remap one native body onto the shared skeleton model: metres, y up,
/// x toward the sensor's left.
fn translate_bodies(bodies: &[raw::NativeBody]) -> SkeletonFrame {
    let skeletons = bodies
        .iter()
        .enumerate()
        .map(|(order, body)| {
            let joints: Joints = JointKind::ALL.map(|kind| {
                let p = body.skeleton[source_joint(kind)].position_mm;
                Joint::new(
                    kind,
                    Point3::new(-p[0] / 1000.0, -p[1] / 1000.0, p[2] / 1000.0),
                )
            });
            Arc::new(Skeleton::new(
                u64::from(body.id),
                order as TrackingIndex,
                // The native tracker only reports bodies under tracking.
                true,
                joints,
            ))
        })
        .collect();
    SkeletonFrame::new(skeletons)
}

fn pump(
    mut stream: Box<dyn CaptureStream>,
    stop: Arc<AtomicBool>,
    skeleton_tx: SyncSender<SkeletonFrame>,
    body_index_tx: SyncSender<BodyIndexFrame>,
) {
    while !stop.load(Ordering::SeqCst) {
        let Some(capture) = stream.next_capture() else {
            break;
        };
        let frame = translate_bodies(&capture.bodies);
        match skeleton_tx.try_send(frame) {
            Ok(()) => {}
            // Driver behind: drop the frame, never queue stale data.
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
        match BodyIndexFrame::from_raw(BODY_INDEX_SIZE, capture.body_index_map) {
            Ok(frame) => match body_index_tx.try_send(frame) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            },
            Err(err) => warn!(error = %err, "discarding malformed body index map"),
        }
    }
    stream.close();
    debug!("azure kinect capture pump stopped");
}

/// Push-mode adapter for Azure Kinect devices.
pub struct AzureKinectAdapter {
    stream: Option<Box<dyn CaptureStream>>,
    worker: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    skeleton_rx: Option<Receiver<SkeletonFrame>>,
    body_index_rx: Option<Receiver<BodyIndexFrame>>,
}

impl AzureKinectAdapter {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream: Some(stream),
            worker: None,
            stop: Arc::new(AtomicBool::new(false)),
            skeleton_rx: None,
            body_index_rx: None,
        }
    }
}

impl SensorAdapter for AzureKinectAdapter {
    fn initialize(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(mut stream) = self.stream.take() else {
            // Torn down earlier; the driver builds a fresh adapter to retry.
            debug!("azure kinect adapter already consumed");
            return;
        };
        if !stream.open() {
            debug!("azure kinect device not present");
            self.stream = Some(stream);
            return;
        }

        let (skeleton_tx, skeleton_rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        let (body_index_tx, body_index_rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        self.stop = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&self.stop);
        self.worker = Some(thread::spawn(move || {
            pump(stream, stop, skeleton_tx, body_index_tx)
        }));
        self.skeleton_rx = Some(skeleton_rx);
        self.body_index_rx = Some(body_index_rx);
        info!("azure kinect sensor initialized");
    }

    fn uninitialize(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("azure kinect capture pump panicked");
            }
            info!("azure kinect sensor released");
        }
        self.skeleton_rx = None;
        self.body_index_rx = None;
    }

    fn is_ready(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn delivery(&self) -> FrameDelivery {
        FrameDelivery::Push
    }

    /// Push backend: data flows through the notification channels.
    fn frame_data(&mut self) -> Option<SkeletonFrame> {
        None
    }

    fn body_index_size(&self) -> ImageSize {
        BODY_INDEX_SIZE
    }

    fn skeleton_frames(&mut self) -> Option<Receiver<SkeletonFrame>> {
        self.skeleton_rx.take()
    }

    fn body_index_frames(&mut self) -> Option<Receiver<BodyIndexFrame>> {
        self.body_index_rx.take()
    }
}
