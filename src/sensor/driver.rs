//! Frame delivery driver: device lifecycle, acquisition and event dispatch.
//!
//! The driver owns exactly one backend at a time and runs on two cadences
//! supplied by the host loop. `fixed_tick` is the slow heartbeat that opens
//! the device and keeps reopening it after failures; `frame_tick` is the
//! per-render step that moves frames from the backend into the resolver.
//! Hosts never talk to an adapter directly.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{debug, info};

use crate::sensor::adapter::{FrameDelivery, SensorAdapter};
use crate::sensor::settings::{PluginSettings, SensorKind};
use crate::skeleton::{BodyIndexFrame, ImageSize, SkeletonFrame, TrackingId, TrackingIndex};
use crate::tracking::{ActiveSlots, ActiveUserResolver, EventHub, SensorListener, UserCount};

/// Builds a backend for the selected sensor kind.
///
/// Invoked on every initialization attempt, so a device that went away and
/// came back gets a fresh adapter rather than a resurrected handle.
pub type AdapterFactory = Box<dyn FnMut(SensorKind) -> Box<dyn SensorAdapter>>;

/// Driver construction parameters.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Settings file that selects the backend, re-read on every
    /// initialization attempt.
    pub settings_path: PathBuf,
    /// How many users receive player roles.
    pub users: UserCount,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(PluginSettings::DEFAULT_FILE),
            users: UserCount::One,
        }
    }
}

/// Owns the backend lifecycle and feeds the active-user resolver.
///
/// Call [`start`](Self::start) once, then [`fixed_tick`](Self::fixed_tick) on
/// a slow timer and [`frame_tick`](Self::frame_tick) once per rendered frame.
/// A missing or unplugged device is not an error: the driver reports the
/// outage through [`SensorListener::sensor_found`] and keeps retrying until
/// the device appears.
pub struct SensorDriver {
    settings: PluginSettings,
    factory: AdapterFactory,
    adapter: Option<Box<dyn SensorAdapter>>,
    skeleton_rx: Option<Receiver<SkeletonFrame>>,
    body_index_rx: Option<Receiver<BodyIndexFrame>>,
    resolver: ActiveUserResolver,
    events: EventHub,
    /// Last accepted polled capture, for change detection. Push frames also
    /// land here but are never compared; channels only carry fresh captures.
    last_frame: Option<SkeletonFrame>,
}

impl SensorDriver {
    pub fn new(
        config: DriverConfig,
        factory: impl FnMut(SensorKind) -> Box<dyn SensorAdapter> + 'static,
    ) -> Self {
        Self {
            settings: PluginSettings::new(config.settings_path),
            factory: Box::new(factory),
            adapter: None,
            skeleton_rx: None,
            body_index_rx: None,
            resolver: ActiveUserResolver::new(config.users),
            events: EventHub::new(),
            last_frame: None,
        }
    }

    /// Register a listener for sensor and user events.
    pub fn subscribe(&mut self, listener: Box<dyn SensorListener>) {
        self.events.subscribe(listener);
    }

    /// Announce the baseline state to subscribers: no sensor, no users.
    /// Call once before ticking; listeners attached earlier receive a defined
    /// starting point instead of waiting for the first transition.
    pub fn start(&mut self) {
        self.events.announce_sensor_found(false);
        self.events.announce_users_found(0);
    }

    /// Slow heartbeat: (re)open the backend whenever it is absent or has
    /// stopped delivering.
    pub fn fixed_tick(&mut self) {
        let healthy = self.adapter.as_ref().is_some_and(|a| a.is_ready());
        if !healthy {
            self.initialize_sensor();
        }
    }

    /// Per-render step: acquire frames from the backend and dispatch them.
    pub fn frame_tick(&mut self) {
        let polled = match self.adapter.as_mut() {
            Some(adapter) if adapter.is_ready() => match adapter.delivery() {
                FrameDelivery::Poll => {
                    adapter.poll_frames();
                    Some((adapter.frame_data(), adapter.body_index_data()))
                }
                FrameDelivery::Push => None,
            },
            _ => {
                self.resolver.process(None, &mut self.events);
                return;
            }
        };
        match polled {
            Some((frame, body_index)) => {
                self.dispatch_polled(frame);
                if let Some(frame) = body_index {
                    self.events.announce_body_index(&frame, self.resolver.slots());
                }
            }
            None => self.drain_push_channels(),
        }
    }

    /// Tear down the backend. Safe to call repeatedly; the next `fixed_tick`
    /// reopens the device, so a host that closes without stopping its timers
    /// gets the sensor back.
    pub fn close_sensor(&mut self) {
        if let Some(mut adapter) = self.adapter.take() {
            adapter.uninitialize();
            info!("sensor closed");
        }
        self.skeleton_rx = None;
        self.body_index_rx = None;
        self.last_frame = None;
    }

    /// Backend currently selected by the settings file.
    #[inline]
    pub fn sensor_kind(&self) -> SensorKind {
        self.settings.kind()
    }

    /// Body-index dimensions of the current backend, if one is constructed.
    pub fn body_index_size(&self) -> Option<ImageSize> {
        self.adapter.as_ref().map(|a| a.body_index_size())
    }

    /// True while a backend is open and delivering.
    pub fn is_ready(&self) -> bool {
        self.adapter.as_ref().is_some_and(|a| a.is_ready())
    }

    /// Current role assignment.
    #[inline]
    pub fn slots(&self) -> &ActiveSlots {
        self.resolver.slots()
    }

    #[inline]
    pub fn is_player_one(&self, id: TrackingId) -> bool {
        self.resolver.slots().is_player_one(id)
    }

    #[inline]
    pub fn is_player_two(&self, id: TrackingId) -> bool {
        self.resolver.slots().is_player_two(id)
    }

    #[inline]
    pub fn is_player_one_index(&self, index: TrackingIndex) -> bool {
        self.resolver.slots().is_player_one_index(index)
    }

    #[inline]
    pub fn is_player_two_index(&self, index: TrackingIndex) -> bool {
        self.resolver.slots().is_player_two_index(index)
    }

    #[inline]
    pub fn user_count(&self) -> UserCount {
        self.resolver.user_count()
    }

    /// Change the tracked user count. An actual change clears both roles.
    pub fn set_user_count(&mut self, users: UserCount) {
        self.resolver.set_user_count(users);
    }

    /// Tear down whatever backend exists and build a fresh one from the
    /// settings file. Failure leaves the unready adapter in place for the
    /// next retry.
    fn initialize_sensor(&mut self) {
        if let Some(mut old) = self.adapter.take() {
            old.uninitialize();
        }
        self.skeleton_rx = None;
        self.body_index_rx = None;
        self.last_frame = None;

        let kind = self.settings.reload();
        let mut adapter = (self.factory)(kind);
        adapter.initialize();
        if adapter.is_ready() {
            self.skeleton_rx = adapter.skeleton_frames();
            self.body_index_rx = adapter.body_index_frames();
            info!(backend = ?kind, "sensor initialized");
        } else {
            debug!(backend = ?kind, "sensor unavailable, will retry");
        }
        self.adapter = Some(adapter);
    }

    /// Run change detection on a polled capture and resolve it.
    fn dispatch_polled(&mut self, frame: Option<SkeletonFrame>) {
        let Some(frame) = frame else {
            self.resolver.process(None, &mut self.events);
            return;
        };
        let repeat = self
            .last_frame
            .as_ref()
            .is_some_and(|last| last.same_capture(&frame));
        if repeat {
            return;
        }
        self.resolver.process(Some(&frame), &mut self.events);
        self.last_frame = Some(frame);
    }

    /// Consume everything the push backend delivered since the last tick.
    /// Each skeleton frame is resolved individually so role continuity sees
    /// every intermediate tracked set.
    fn drain_push_channels(&mut self) {
        let (frames, disconnected) = drain(self.skeleton_rx.as_ref());
        for frame in frames {
            self.resolver.process(Some(&frame), &mut self.events);
            self.last_frame = Some(frame);
        }
        if disconnected {
            debug!("skeleton frame channel disconnected");
            self.skeleton_rx = None;
        }

        let (frames, disconnected) = drain(self.body_index_rx.as_ref());
        for frame in frames {
            self.events.announce_body_index(&frame, self.resolver.slots());
        }
        if disconnected {
            debug!("body index channel disconnected");
            self.body_index_rx = None;
        }
    }
}

/// Drain a channel without blocking. Returns the pending items and whether
/// the sender is gone.
fn drain<T>(rx: Option<&Receiver<T>>) -> (Vec<T>, bool) {
    let mut items = Vec::new();
    let Some(rx) = rx else {
        return (items, false);
    };
    loop {
        match rx.try_recv() {
            Ok(item) => items.push(item),
            Err(TryRecvError::Empty) => return (items, false),
            Err(TryRecvError::Disconnected) => return (items, true),
        }
    }
}
