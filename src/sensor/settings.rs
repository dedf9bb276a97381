//! Backend selection from the external plugin settings file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Supported sensor backends.
///
/// `AstraPro` devices speak the Kinect-v2 wire protocol, so both select the
/// same adapter; the distinction is kept because the settings file records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorKind {
    #[default]
    KinectV2,
    AstraPro,
    AzureKinect,
}

impl SensorKind {
    /// Map the final dot-separated segment of a plugin type name, compared
    /// case-insensitively. Unrecognized names select the default backend.
    fn from_plugin_type(type_name: &str) -> SensorKind {
        let last = type_name.rsplit('.').next().unwrap_or(type_name);
        match last.to_ascii_lowercase().as_str() {
            "azurekinectplugin" => SensorKind::AzureKinect,
            "orbbecplugin" => SensorKind::AstraPro,
            _ => SensorKind::KinectV2,
        }
    }
}

/// Raised when the settings file cannot be read or parsed. Callers fall back
/// to the previously selected backend; this error only feeds logging.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse settings xml: {0}")]
    Parse(#[from] quick_xml::DeError),
}

#[derive(Debug, Deserialize)]
struct ConfigurationXml {
    #[serde(default)]
    plugins: PluginsXml,
}

#[derive(Debug, Default, Deserialize)]
struct PluginsXml {
    #[serde(default)]
    plugin: Vec<PluginXml>,
}

#[derive(Debug, Deserialize)]
struct PluginXml {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
}

/// Backend selection read from `VSClientSettings.xml`.
///
/// The file is re-read on every initialization attempt; a missing or
/// malformed file keeps the current selection, so the pipeline always has a
/// backend to construct.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    path: PathBuf,
    kind: SensorKind,
}

impl PluginSettings {
    /// Conventional settings file name next to the executable.
    pub const DEFAULT_FILE: &'static str = "VSClientSettings.xml";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SensorKind::default(),
        }
    }

    /// Currently selected backend.
    #[inline]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the settings file. On failure the current selection stands.
    pub fn reload(&mut self) -> SensorKind {
        match Self::read_kind(&self.path) {
            Ok(kind) => {
                debug!(backend = ?kind, path = %self.path.display(), "plugin settings loaded");
                self.kind = kind;
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    backend = ?self.kind,
                    "plugin settings unavailable, keeping current backend"
                );
            }
        }
        self.kind
    }

    fn read_kind(path: &Path) -> Result<SensorKind, SettingsError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Select a backend from settings xml. The entry named `kinect2`
    /// (case-insensitive) decides; no such entry selects the default.
    pub fn parse(xml: &str) -> Result<SensorKind, SettingsError> {
        let config: ConfigurationXml = quick_xml::de::from_str(xml)?;
        for plugin in config.plugins.plugin {
            let Some(name) = plugin.name else { continue };
            if !name.eq_ignore_ascii_case("kinect2") {
                continue;
            }
            let Some(type_name) = plugin.type_name else {
                continue;
            };
            return Ok(SensorKind::from_plugin_type(&type_name));
        }
        Ok(SensorKind::default())
    }
}
