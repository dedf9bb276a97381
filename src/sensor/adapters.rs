//! Concrete sensor backends and their device seams.

pub mod azure_kinect;
pub mod kinect_v2;
pub mod replay;

pub use azure_kinect::{AzureKinectAdapter, CaptureStream};
pub use kinect_v2::{BodyFrameReader, KinectV2Adapter};
pub use replay::ReplayReader;
