//! Stable player-role assignment table.

use crate::skeleton::{TrackingId, TrackingIndex};

/// How many simultaneous users the resolver maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserCount {
    #[default]
    One,
    Two,
}

/// One role's binding: the authoritative tracking id, plus the tracking
/// index of the matching skeleton in the most recent accepted frame.
///
/// The index is per-frame state; it clears whenever the bound id is absent,
/// while the id itself persists until reassignment or reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSlot {
    id: Option<TrackingId>,
    index: Option<TrackingIndex>,
}

impl ActiveSlot {
    #[inline]
    pub fn id(&self) -> Option<TrackingId> {
        self.id
    }

    #[inline]
    pub fn index(&self) -> Option<TrackingIndex> {
        self.index
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this slot is bound to the given id.
    #[inline]
    pub fn matches(&self, id: TrackingId) -> bool {
        self.id == Some(id)
    }

    pub(crate) fn bind(&mut self, id: TrackingId) {
        self.id = Some(id);
        self.index = None;
    }

    pub(crate) fn set_index(&mut self, index: Option<TrackingIndex>) {
        self.index = index;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The resolver's id-to-role table, sized for the two supported roles.
///
/// Invariant (resolver-enforced): an id occupies at most one slot at a time.
/// Copyable, so fan-out events carry a consistent snapshot of the assignment
/// the frame was resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSlots {
    player_one: ActiveSlot,
    player_two: ActiveSlot,
}

impl ActiveSlots {
    #[inline]
    pub fn player_one(&self) -> &ActiveSlot {
        &self.player_one
    }

    #[inline]
    pub fn player_two(&self) -> &ActiveSlot {
        &self.player_two
    }

    /// Whether this id is bound to the player-one role.
    #[inline]
    pub fn is_player_one(&self, id: TrackingId) -> bool {
        self.player_one.matches(id)
    }

    /// Whether this id is bound to the player-two role.
    #[inline]
    pub fn is_player_two(&self, id: TrackingId) -> bool {
        self.player_two.matches(id)
    }

    /// Whether this body-index pixel value belongs to player one in the most
    /// recent accepted frame.
    #[inline]
    pub fn is_player_one_index(&self, index: TrackingIndex) -> bool {
        self.player_one.index() == Some(index)
    }

    /// Whether this body-index pixel value belongs to player two in the most
    /// recent accepted frame.
    #[inline]
    pub fn is_player_two_index(&self, index: TrackingIndex) -> bool {
        self.player_two.index() == Some(index)
    }

    /// Whether this id holds either role.
    #[inline]
    pub fn is_active(&self, id: TrackingId) -> bool {
        self.is_player_one(id) || self.is_player_two(id)
    }

    pub(crate) fn player_one_mut(&mut self) -> &mut ActiveSlot {
        &mut self.player_one
    }

    pub(crate) fn player_two_mut(&mut self) -> &mut ActiveSlot {
        &mut self.player_two
    }

    /// Exchange the two role bindings.
    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.player_one, &mut self.player_two);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
