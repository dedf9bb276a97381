//! Sensor backends and the driver that runs them.
//!
//! The [`SensorAdapter`] trait is the seam between device SDKs and the rest
//! of the pipeline. Everything above it consumes translated skeleton and
//! body-index frames and never sees SDK types.

mod adapter;
pub mod adapters;
mod driver;
mod settings;

pub use adapter::{FrameDelivery, SensorAdapter};
pub use driver::{AdapterFactory, DriverConfig, SensorDriver};
pub use settings::{PluginSettings, SensorKind, SettingsError};
