//! DeviceCaptureService: the one entry point for camera, geolocation and
//! file capture during a session.
//!
//! The service is cheap to clone. Clones share the camera reservation, so a
//! capture view can hold its own handle and call
//! [`DeviceCaptureService::abandon_camera`] while the wizard is awaiting an
//! acquisition.
use civic_core::{CameraFailure, CivicError, DeviceError, ImagePayload, Location};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::camera::{CameraDevice, CameraSession, CameraState, Facing, Reservation};
use crate::files::{read_image_file, DEFAULT_MAX_IMAGE_BYTES};
use crate::geolocation::{locate_once, GeolocationProvider, PositionOptions};

/// Device-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Preferred camera; falls back to any camera when none faces this way
    pub facing: Facing,
    pub geolocation_timeout_ms: u64,
    pub high_accuracy: bool,
    pub max_image_bytes: u64,
}

impl CaptureSettings {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.geolocation_timeout_ms),
            high_accuracy: self.high_accuracy,
            maximum_age: Duration::ZERO,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            geolocation_timeout_ms: 10_000,
            high_accuracy: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct DeviceCaptureService {
    camera: Option<Arc<dyn CameraDevice>>,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    camera_state: Arc<CameraState>,
    settings: CaptureSettings,
}

impl DeviceCaptureService {
    /// Service with no devices attached; every capability reports
    /// `Unsupported` until one is wired in.
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            camera: None,
            geolocation: None,
            camera_state: Arc::new(CameraState::default()),
            settings,
        }
    }

    pub fn with_camera(mut self, camera: Arc<dyn CameraDevice>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn has_geolocation(&self) -> bool {
        self.geolocation.is_some()
    }

    /// A camera session is currently holding the stream
    pub fn camera_busy(&self) -> bool {
        self.camera_state.is_busy()
    }

    // ========================================================================
    // CAMERA
    // ========================================================================

    /// Open the camera for a new capture view.
    ///
    /// Fails with `Busy` while another session is open. If the view is
    /// abandoned before the device answers, the stream is released on
    /// arrival and `Abandoned` is returned.
    pub async fn open_camera(&self) -> Result<CameraSession, CivicError> {
        let camera = self
            .camera
            .as_ref()
            .ok_or(DeviceError::Camera(CameraFailure::Unsupported))?;

        let reservation = Reservation::take(&self.camera_state).map_err(DeviceError::Camera)?;
        let generation = self.camera_state.generation();
        info!(generation, facing = ?self.settings.facing, "requesting camera stream");

        let stream = match camera.open_stream(self.settings.facing).await {
            Err(CameraFailure::NotFound) if self.settings.facing != Facing::Any => {
                info!(facing = ?self.settings.facing, "preferred camera missing, trying any camera");
                camera.open_stream(Facing::Any).await
            }
            other => other,
        };

        match stream {
            Ok(stream) => CameraSession::bind(stream, reservation, generation),
            Err(failure) => {
                warn!(%failure, "camera acquisition failed");
                Err(DeviceError::Camera(failure).into())
            }
        }
    }

    /// Mark the current capture view as closed. An open stream is stopped
    /// and the camera freed right away; an in-flight acquisition is
    /// discarded when it lands.
    pub fn abandon_camera(&self) {
        let generation = self.camera_state.abandon();
        info!(generation, "camera view abandoned");
    }

    // ========================================================================
    // GEOLOCATION
    // ========================================================================

    /// Single position fix with a placeholder address
    pub async fn locate(&self) -> Result<Location, CivicError> {
        let options = self.settings.position_options();
        match locate_once(self.geolocation.as_deref(), &options).await {
            Ok(location) => {
                info!(address = %location.address, "position fix acquired");
                Ok(location)
            }
            Err(failure) => {
                warn!(%failure, "position request failed");
                Err(DeviceError::Geolocation(failure).into())
            }
        }
    }

    // ========================================================================
    // FILES
    // ========================================================================

    pub async fn read_image(&self, path: &Path) -> Result<ImagePayload, CivicError> {
        read_image_file(path, self.settings.max_image_bytes).await
    }
}

impl std::fmt::Debug for DeviceCaptureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCaptureService")
            .field("camera", &self.has_camera())
            .field("geolocation", &self.has_geolocation())
            .field("camera_busy", &self.camera_busy())
            .field("settings", &self.settings)
            .finish()
    }
}
