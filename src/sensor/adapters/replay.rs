//! Scripted frame source replaying recorded Kinect v2 frames.
//!
//! Lets the whole pipeline run without hardware: feed it a recorded frame
//! sequence and hand it to [`KinectV2Adapter`](super::kinect_v2::KinectV2Adapter)
//! in place of the device bindings.

use std::collections::VecDeque;

use crate::sensor::adapters::kinect_v2::{BodyFrameReader, raw};

/// In-memory [`BodyFrameReader`] that yields one scripted frame per
/// acquisition, optionally looping back to the start when exhausted.
#[derive(Debug, Default)]
pub struct ReplayReader {
    body_frames: VecDeque<raw::NativeBodyFrame>,
    body_index_frames: VecDeque<raw::NativeBodyIndexFrame>,
    looping: bool,
    open: bool,
}

impl ReplayReader {
    pub fn new(body_frames: Vec<raw::NativeBodyFrame>) -> Self {
        Self {
            body_frames: body_frames.into(),
            ..Self::default()
        }
    }

    /// Attach a body-index frame sequence, consumed one per acquisition.
    pub fn with_body_index(mut self, frames: Vec<raw::NativeBodyIndexFrame>) -> Self {
        self.body_index_frames = frames.into();
        self
    }

    /// Replay the recording forever instead of running dry.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

impl BodyFrameReader for ReplayReader {
    fn open(&mut self) -> bool {
        self.open = true;
        true
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn acquire_body_frame(&mut self) -> Option<raw::NativeBodyFrame> {
        if !self.open {
            return None;
        }
        let frame = self.body_frames.pop_front()?;
        if self.looping {
            self.body_frames.push_back(frame.clone());
        }
        Some(frame)
    }

    fn acquire_body_index_frame(&mut self) -> Option<raw::NativeBodyIndexFrame> {
        if !self.open {
            return None;
        }
        let frame = self.body_index_frames.pop_front()?;
        if self.looping {
            self.body_index_frames.push_back(frame.clone());
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> Vec<raw::NativeBodyFrame> {
        vec![
            raw::NativeBodyFrame::empty().with_body(0, raw::NativeBody::tracked(1)),
            raw::NativeBodyFrame::empty().with_body(0, raw::NativeBody::tracked(2)),
        ]
    }

    #[test]
    fn test_yields_nothing_while_closed() {
        let mut reader = ReplayReader::new(script());
        assert!(reader.acquire_body_frame().is_none());
        assert!(reader.open());
        assert!(reader.acquire_body_frame().is_some());
        reader.close();
        assert!(reader.acquire_body_frame().is_none());
    }

    #[test]
    fn test_runs_dry_without_looping() {
        let mut reader = ReplayReader::new(script());
        reader.open();
        assert!(reader.acquire_body_frame().is_some());
        assert!(reader.acquire_body_frame().is_some());
        assert!(reader.acquire_body_frame().is_none());
    }

    #[test]
    fn test_looping_restarts_recording() {
        let mut reader = ReplayReader::new(script()).looping();
        reader.open();
        let first = reader.acquire_body_frame().unwrap();
        reader.acquire_body_frame().unwrap();
        let wrapped = reader.acquire_body_frame().unwrap();
        assert_eq!(first, wrapped);
    }
}
