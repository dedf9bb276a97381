//! Skeleton and frame value types shared by every sensor backend.

use std::sync::Arc;

use crate::skeleton::joint::{Joint, JointKind, Joints};

/// Opaque body identifier assigned by the sensor backend.
///
/// Not stable across a user leaving and re-entering the sensor's view, and
/// not guaranteed unused after a body is dropped. Continuity across frames is
/// the resolver's job, never this value's.
pub type TrackingId = u64;

/// Small-integer body slot used by body-index imagery for pixel
/// classification. A separate namespace from [`TrackingId`].
pub type TrackingIndex = u8;

/// One tracked person's joint-position snapshot for a single frame.
///
/// Adapters construct these fresh on every acquired frame; consumers must not
/// rely on object identity surviving into the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub tracking_id: TrackingId,
    pub tracking_index: TrackingIndex,
    /// True only while the sensor currently has high-confidence tracking.
    pub is_tracked: bool,
    pub joints: Joints,
}

impl Skeleton {
    pub fn new(
        tracking_id: TrackingId,
        tracking_index: TrackingIndex,
        is_tracked: bool,
        joints: Joints,
    ) -> Self {
        Self {
            tracking_id,
            tracking_index,
            is_tracked,
            joints,
        }
    }

    /// Joint for the given label.
    #[inline]
    pub fn joint(&self, kind: JointKind) -> &Joint {
        &self.joints[kind.index()]
    }

    /// Horizontal camera-space offset of the spine base, the resolver's
    /// "distance from the sensor centerline" measure.
    #[inline]
    pub fn spine_base_x(&self) -> f32 {
        self.joint(JointKind::SpineBase).position.x
    }
}

/// Ordered collection of the skeletons delivered in one sensor frame.
///
/// Zero skeletons is a normal state, not an error. Skeletons are shared so a
/// poll adapter re-reporting an unchanged acquisition preserves per-element
/// identity, which the driver's change-detection keys on.
#[derive(Debug, Clone, Default)]
pub struct SkeletonFrame {
    pub skeletons: Vec<Arc<Skeleton>>,
}

impl SkeletonFrame {
    pub fn new(skeletons: Vec<Arc<Skeleton>>) -> Self {
        Self { skeletons }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }

    /// Skeletons currently under high-confidence tracking.
    pub fn tracked(&self) -> impl Iterator<Item = &Arc<Skeleton>> {
        self.skeletons.iter().filter(|s| s.is_tracked)
    }

    /// Whether a tracked skeleton with this id is present.
    pub fn contains_tracked(&self, id: TrackingId) -> bool {
        self.tracked().any(|s| s.tracking_id == id)
    }

    /// First tracked skeleton with this id, if any.
    pub fn find_tracked(&self, id: TrackingId) -> Option<&Arc<Skeleton>> {
        self.tracked().find(|s| s.tracking_id == id)
    }

    /// Identity comparison against a previously delivered frame: same length
    /// and the same shared skeleton at every position.
    ///
    /// This is deliberately not a value comparison. A backend that rebuilds
    /// its skeletons each frame compares unequal even when the numbers are
    /// unchanged, so live-but-steady input is never starved.
    pub fn same_capture(&self, other: &SkeletonFrame) -> bool {
        self.skeletons.len() == other.skeletons.len()
            && self
                .skeletons
                .iter()
                .zip(other.skeletons.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::joint::zeroed_joints;

    fn body(id: TrackingId, index: TrackingIndex, tracked: bool) -> Arc<Skeleton> {
        Arc::new(Skeleton::new(id, index, tracked, zeroed_joints()))
    }

    #[test]
    fn test_tracked_filter() {
        let frame = SkeletonFrame::new(vec![body(1, 0, true), body(2, 1, false), body(3, 2, true)]);
        let ids: Vec<TrackingId> = frame.tracked().map(|s| s.tracking_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(frame.contains_tracked(3));
        assert!(!frame.contains_tracked(2));
    }

    #[test]
    fn test_same_capture_shares_identity() {
        let frame = SkeletonFrame::new(vec![body(1, 0, true), body(2, 1, true)]);
        let replay = frame.clone();
        assert!(frame.same_capture(&replay));
    }

    #[test]
    fn test_same_capture_rejects_rebuilt_skeletons() {
        let frame = SkeletonFrame::new(vec![body(1, 0, true)]);
        let rebuilt = SkeletonFrame::new(vec![body(1, 0, true)]);
        // Equal values, distinct allocations.
        assert_eq!(frame.skeletons[0], rebuilt.skeletons[0]);
        assert!(!frame.same_capture(&rebuilt));
    }

    #[test]
    fn test_same_capture_rejects_count_change() {
        let a = body(1, 0, true);
        let frame = SkeletonFrame::new(vec![a.clone()]);
        let grown = SkeletonFrame::new(vec![a, body(2, 1, true)]);
        assert!(!frame.same_capture(&grown));
    }
}
