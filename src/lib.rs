//! Depth-sensor body tracking with stable active-user assignment.
//!
//! This crate drives a depth camera's body-tracking stream and maintains a
//! stable notion of "player one" and "player two" on top of the sensor's
//! unstable tracking ids. Concrete backends (Kinect v2, Orbbec Astra Pro,
//! Azure Kinect) plug in behind the [`sensor::SensorAdapter`] trait; hosts
//! construct a [`SensorDriver`], subscribe a [`SensorListener`] and pump the
//! driver's two ticks from their own loop.

pub mod sensor;
pub mod skeleton;
pub mod tracking;

pub use sensor::{DriverConfig, SensorDriver};
pub use tracking::SensorListener;
