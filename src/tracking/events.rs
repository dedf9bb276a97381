//! Event fan-out to subscriber components.

use tracing::trace;

use crate::skeleton::{BodyIndexFrame, Skeleton};
use crate::tracking::slots::ActiveSlots;

/// Subscriber interface for the pipeline's observable signals.
///
/// All methods default to no-ops so components implement only the signals
/// they care about. Boolean and count signals are edge-triggered by the
/// [`EventHub`]; skeleton and body-index updates arrive per accepted frame.
pub trait SensorListener {
    /// Sensor presence changed.
    fn sensor_found(&mut self, _found: bool) {}

    /// Number of active users present in the frame changed.
    fn users_found(&mut self, _count: usize) {}

    /// An active user's skeleton for this frame. `slots` is the role
    /// assignment the frame was resolved against; query it to learn which
    /// role the skeleton holds.
    fn skeleton_update(&mut self, _skeleton: &Skeleton, _slots: &ActiveSlots) {}

    /// A body-index frame for this cycle, with the role assignment for
    /// per-pixel classification.
    fn body_index_update(&mut self, _frame: &BodyIndexFrame, _slots: &ActiveSlots) {}
}

/// Registry and edge-trigger latch for the observable signals.
///
/// Subscribers must tolerate a "not found"/"zero users" announcement with no
/// prior "found" transition: the driver pushes that baseline at startup, and
/// the latches start unset so the first announcement always goes out.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<Box<dyn SensorListener>>,
    sensor_found: Option<bool>,
    users_found: Option<usize>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn SensorListener>) {
        self.listeners.push(listener);
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Announce sensor presence; suppressed unless changed.
    pub(crate) fn announce_sensor_found(&mut self, found: bool) {
        if self.sensor_found == Some(found) {
            return;
        }
        self.sensor_found = Some(found);
        trace!(found, "sensor presence changed");
        for listener in &mut self.listeners {
            listener.sensor_found(found);
        }
    }

    /// Announce the active-user count; suppressed unless changed.
    pub(crate) fn announce_users_found(&mut self, count: usize) {
        if self.users_found == Some(count) {
            return;
        }
        self.users_found = Some(count);
        trace!(count, "user count changed");
        for listener in &mut self.listeners {
            listener.users_found(count);
        }
    }

    /// Broadcast an active user's skeleton for this frame.
    pub(crate) fn announce_skeleton(&mut self, skeleton: &Skeleton, slots: &ActiveSlots) {
        for listener in &mut self.listeners {
            listener.skeleton_update(skeleton, slots);
        }
    }

    /// Broadcast a body-index frame for this cycle.
    pub(crate) fn announce_body_index(&mut self, frame: &BodyIndexFrame, slots: &ActiveSlots) {
        for listener in &mut self.listeners {
            listener.body_index_update(frame, slots);
        }
    }
}

/// Inner sink of a [`GatedListener`].
pub trait UserDataSink {
    fn use_user_data(&mut self, skeleton: &Skeleton);
}

/// Subscriber base that forwards skeleton updates to its sink only while the
/// sensor is found and at least one user is present.
///
/// Collaborators that render or score user motion hang off this so they never
/// act on data from a half-present pipeline.
pub struct GatedListener<S: UserDataSink> {
    sink: S,
    sensor_found: bool,
    users: usize,
}

impl<S: UserDataSink> GatedListener<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            sensor_found: false,
            users: 0,
        }
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: UserDataSink> SensorListener for GatedListener<S> {
    fn sensor_found(&mut self, found: bool) {
        self.sensor_found = found;
    }

    fn users_found(&mut self, count: usize) {
        self.users = count;
    }

    fn skeleton_update(&mut self, skeleton: &Skeleton, _slots: &ActiveSlots) {
        if self.sensor_found && self.users > 0 {
            self.sink.use_user_data(skeleton);
        }
    }
}
