//! Active-user resolution: stable player roles over unstable tracking ids.
//!
//! Depth sensors jitter, and naively re-picking the "best" body every frame
//! makes the active-user assignment flicker between people standing at
//! similar depth. The resolver therefore treats the first stable detection
//! as authoritative: a bound id keeps its role while it stays in the tracked
//! set, and identity is re-derived only after it has left.

use std::sync::Arc;

use tracing::debug;

use crate::skeleton::{Skeleton, SkeletonFrame, TrackingId};
use crate::tracking::events::EventHub;
use crate::tracking::slots::{ActiveSlots, UserCount};

/// Assigns and maintains the player-one/player-two roles across frames.
///
/// Fed accepted frames by the driver; publishes through an [`EventHub`].
/// Continuity is keyed on tracking ids alone, never on object identity,
/// since adapters rebuild every skeleton each frame.
#[derive(Debug, Default)]
pub struct ActiveUserResolver {
    users: UserCount,
    slots: ActiveSlots,
    /// Tracked ids of the previous accepted frame. Presence checks run
    /// against this set, so a bound id gets one frame of grace before the
    /// role is re-derived and a momentary occlusion cannot hand the session
    /// to a bystander.
    last_tracked: Vec<TrackingId>,
}

impl ActiveUserResolver {
    pub fn new(users: UserCount) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    #[inline]
    pub fn user_count(&self) -> UserCount {
        self.users
    }

    /// Change the number of tracked users. An actual change clears both
    /// roles; re-applying the current count keeps them.
    pub fn set_user_count(&mut self, users: UserCount) {
        if users != self.users {
            debug!(?users, "user count changed, clearing role assignment");
            self.users = users;
            self.reset();
        }
    }

    /// Current role assignment.
    #[inline]
    pub fn slots(&self) -> &ActiveSlots {
        &self.slots
    }

    /// Drop both role bindings and the presence history.
    pub fn reset(&mut self) {
        self.slots.reset();
        self.last_tracked.clear();
    }

    /// Resolve one delivery cycle. `None` means the sensor produced no
    /// frame; role state is left untouched so a recovered sensor resumes
    /// where it stopped.
    pub fn process(&mut self, frame: Option<&SkeletonFrame>, events: &mut EventHub) {
        events.announce_sensor_found(frame.is_some());
        let Some(frame) = frame else {
            return;
        };
        match self.users {
            UserCount::One => self.resolve_single(frame, events),
            UserCount::Two => self.resolve_pair(frame, events),
        }
        self.last_tracked = frame.tracked().map(|s| s.tracking_id).collect();
    }

    fn resolve_single(&mut self, frame: &SkeletonFrame, events: &mut EventHub) {
        let candidate = nearest_centerline(frame);

        let bound = self.slots.player_one().id();
        let missing = bound.map_or(true, |id| !self.last_tracked.contains(&id));
        if missing {
            if let Some(candidate) = candidate {
                self.slots.player_one_mut().bind(candidate.tracking_id);
            }
        }

        let active = self
            .slots
            .player_one()
            .id()
            .and_then(|id| frame.find_tracked(id));
        self.slots
            .player_one_mut()
            .set_index(active.map(|s| s.tracking_index));

        events.announce_users_found(usize::from(active.is_some()));
        self.broadcast_matches(frame, events);
    }

    fn resolve_pair(&mut self, frame: &SkeletonFrame, events: &mut EventHub) {
        let (leftmost, rightmost) = horizontal_extremes(frame);

        // Fill only empty slots: player one from the facing user's
        // right-most body, player two from the left-most.
        if self.slots.player_one().is_empty() {
            if let Some(body) = rightmost {
                self.slots.player_one_mut().bind(body.tracking_id);
            }
        }
        if self.slots.player_two().is_empty() {
            if let Some(body) = leftmost {
                self.slots.player_two_mut().bind(body.tracking_id);
            }
        }

        // When the frame shows two distinct extremes and the right-most body
        // is bound to player two, the pair crossed over; swap so player one
        // stays on the right-most body.
        if let (Some(left), Some(right)) = (leftmost, rightmost) {
            if left.tracking_id != right.tracking_id
                && self.slots.is_player_two(right.tracking_id)
            {
                self.slots.swap();
            }
        }

        // Two roles must never collapse onto one person.
        if let (Some(one), Some(two)) = (self.slots.player_one().id(), self.slots.player_two().id())
        {
            if one == two {
                self.slots.player_two_mut().clear();
            }
        }

        let one = self
            .slots
            .player_one()
            .id()
            .and_then(|id| frame.find_tracked(id));
        let two = self
            .slots
            .player_two()
            .id()
            .and_then(|id| frame.find_tracked(id));
        self.slots
            .player_one_mut()
            .set_index(one.map(|s| s.tracking_index));
        self.slots
            .player_two_mut()
            .set_index(two.map(|s| s.tracking_index));

        events.announce_users_found(usize::from(one.is_some()) + usize::from(two.is_some()));
        self.broadcast_matches(frame, events);
    }

    /// Emit a skeleton update for every tracked skeleton holding a role.
    fn broadcast_matches(&self, frame: &SkeletonFrame, events: &mut EventHub) {
        for skeleton in frame.tracked() {
            if self.slots.is_active(skeleton.tracking_id) {
                events.announce_skeleton(skeleton, &self.slots);
            }
        }
    }
}

/// Tracked skeleton nearest the sensor centerline by absolute spine-base x.
/// Ties keep the first one encountered.
fn nearest_centerline(frame: &SkeletonFrame) -> Option<&Arc<Skeleton>> {
    let mut best: Option<&Arc<Skeleton>> = None;
    let mut lowest = f32::INFINITY;
    for skeleton in frame.tracked() {
        let distance = skeleton.spine_base_x().abs();
        if distance < lowest {
            lowest = distance;
            best = Some(skeleton);
        }
    }
    best
}

/// Tracked skeletons at the extremes of the spine-base x axis, as
/// (left-most, right-most) from the facing user's point of view. One tracked
/// body is both extremes. Ties keep the first one encountered.
fn horizontal_extremes(frame: &SkeletonFrame) -> (Option<&Arc<Skeleton>>, Option<&Arc<Skeleton>>) {
    let mut leftmost: Option<&Arc<Skeleton>> = None;
    let mut rightmost: Option<&Arc<Skeleton>> = None;
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    for skeleton in frame.tracked() {
        let x = skeleton.spine_base_x();
        if x < min_x {
            min_x = x;
            leftmost = Some(skeleton);
        }
        if x > max_x {
            max_x = x;
            rightmost = Some(skeleton);
        }
    }
    (leftmost, rightmost)
}
