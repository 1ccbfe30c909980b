//! Audio device enumeration and input access
//!
//! Devices are identified by their backend name; only the selected id is
//! persisted (in settings), the list itself is refreshed on demand.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::{Error, Result};

/// Direction of an audio endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Capture endpoint (microphone)
    Input,
    /// Playback endpoint (speakers, headset)
    Output,
}

/// An audio endpoint offered for user selection
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Backend identifier, stable enough to persist across sessions
    pub id: String,

    /// Direction
    pub kind: DeviceKind,

    /// Human-readable label
    pub label: String,
}

/// Grants (or denies) access to an input device
///
/// A session start requests access scoped to the selected input id when one
/// is set, else to any default input. Denial aborts the start.
#[async_trait]
pub trait MicrophoneAccess: Send + Sync {
    /// Request access to the given input device, or the default when `None`
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] when access is refused or the
    /// device is unavailable
    async fn request(&self, device_id: Option<&str>) -> Result<()>;
}

/// Enumerates host audio endpoints via cpal
#[derive(Debug, Default)]
pub struct DeviceRegistry;

impl DeviceRegistry {
    /// Create a registry for the default host
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Enumerate current input and output endpoints
    ///
    /// # Errors
    ///
    /// Returns error if the host cannot enumerate devices
    pub fn refresh(&self) -> Result<Vec<AudioDevice>> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        let inputs = host
            .input_devices()
            .map_err(|e| Error::Audio(e.to_string()))?;
        for device in inputs {
            if let Ok(name) = device.name() {
                devices.push(AudioDevice {
                    id: name.clone(),
                    kind: DeviceKind::Input,
                    label: name,
                });
            }
        }

        let outputs = host
            .output_devices()
            .map_err(|e| Error::Audio(e.to_string()))?;
        for device in outputs {
            if let Ok(name) = device.name() {
                devices.push(AudioDevice {
                    id: name.clone(),
                    kind: DeviceKind::Output,
                    label: name,
                });
            }
        }

        tracing::debug!(count = devices.len(), "enumerated audio devices");
        Ok(devices)
    }

    /// Resolve an input device by id, or the default input when `None`
    pub(crate) fn resolve_input(device_id: Option<&str>) -> Result<cpal::Device> {
        let host = cpal::default_host();

        match device_id {
            Some(id) => host
                .input_devices()
                .map_err(|e| Error::PermissionDenied(e.to_string()))?
                .find(|d| d.name().is_ok_and(|n| n == id))
                .ok_or_else(|| Error::PermissionDenied(format!("input device '{id}' unavailable"))),
            None => host
                .default_input_device()
                .ok_or_else(|| Error::PermissionDenied("no input device available".to_string())),
        }
    }
}

#[async_trait]
impl MicrophoneAccess for DeviceRegistry {
    async fn request(&self, device_id: Option<&str>) -> Result<()> {
        let device = Self::resolve_input(device_id)?;

        // Probing the config is the closest the backend has to an access
        // check; an unopenable device fails here.
        device
            .default_input_config()
            .map_err(|e| Error::PermissionDenied(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "input device access granted"
        );
        Ok(())
    }
}
