//! Capability contract implemented by every sensor backend.

use std::sync::mpsc::Receiver;

use crate::skeleton::{BodyIndexFrame, ImageSize, SkeletonFrame};

/// How a backend hands frames to the driver.
///
/// The driver consumes both variants uniformly; backends never need to know
/// which tick they are serviced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDelivery {
    /// The backend raises frame-ready notifications asynchronously through
    /// the channels returned by [`SensorAdapter::skeleton_frames`] and
    /// [`SensorAdapter::body_index_frames`].
    Push,
    /// The driver requests the most recent buffered frame once per rendered
    /// tick via [`SensorAdapter::poll_frames`].
    Poll,
}

/// Contract any concrete sensor backend must satisfy.
///
/// Device absence is never an error at this layer: `initialize` fails
/// silently, data accessors return `None`, and the driver's retry loop does
/// the rest. A permanently failed device is indistinguishable here from one
/// that is not yet connected.
///
/// # Example
///
/// ```ignore
/// use bodytrack_rs::sensor::{FrameDelivery, SensorAdapter};
///
/// struct NullAdapter;
///
/// impl SensorAdapter for NullAdapter {
///     fn initialize(&mut self) {}
///     fn uninitialize(&mut self) {}
///     fn is_ready(&self) -> bool { false }
///     fn delivery(&self) -> FrameDelivery { FrameDelivery::Poll }
///     fn frame_data(&mut self) -> Option<SkeletonFrame> { None }
///     fn body_index_size(&self) -> ImageSize { ImageSize::new(0, 0) }
/// }
/// ```
pub trait SensorAdapter {
    /// Open the device. Fails silently when no device is present; the
    /// adapter simply stays unready and the driver retries.
    fn initialize(&mut self);

    /// Release device handles. Must be safe to call even if `initialize`
    /// never succeeded or teardown already ran.
    fn uninitialize(&mut self);

    /// True while the device handle is open and delivering data.
    fn is_ready(&self) -> bool;

    /// Which delivery model this backend uses.
    fn delivery(&self) -> FrameDelivery;

    /// Acquire the most recent buffered frame from the device. Frames
    /// superseded before consumption are dropped, never queued. No-op for
    /// push backends.
    fn poll_frames(&mut self) {}

    /// The most recently acquired skeleton frame, or `None` if nothing has
    /// been acquired yet. Repeated calls without a new acquisition return
    /// the same shared skeletons.
    fn frame_data(&mut self) -> Option<SkeletonFrame>;

    /// The body-index frame acquired by the last [`Self::poll_frames`], taken
    /// at most once. `None` for push backends.
    fn body_index_data(&mut self) -> Option<BodyIndexFrame> {
        None
    }

    /// Fixed dimensions of this backend's body-index image.
    fn body_index_size(&self) -> ImageSize;

    /// Skeleton-frame notification channel for push backends, handed over at
    /// most once. `None` for poll backends.
    fn skeleton_frames(&mut self) -> Option<Receiver<SkeletonFrame>> {
        None
    }

    /// Body-index notification channel for push backends, handed over at
    /// most once. `None` for poll backends.
    fn body_index_frames(&mut self) -> Option<Receiver<BodyIndexFrame>> {
        None
    }
}
