//! Unified Error Model
//!
//! Every failure the wizard can report. None of them is fatal: each maps to
//! an interactive state the user can recover from.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CivicError {
    /// Finalize was attempted on a draft that does not meet every stage's
    /// requirements. Advancing reports the same condition as a value instead.
    #[error("VALIDATION/{stage}: missing {}", .missing.join(", "))]
    ValidationIncomplete { stage: String, missing: Vec<String> },

    #[error("DEVICE/{0}")]
    DeviceUnavailable(#[from] DeviceError),

    #[error("SUBMIT/{0}")]
    SubmissionFailed(#[from] SinkError),

    #[error("STATE/{0}")]
    InvalidState(String),

    #[error("SLOT/index {index} outside capacity {capacity}")]
    InvalidSlot { index: usize, capacity: usize },

    #[error("PAYLOAD/{0}")]
    PayloadError(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),

    #[error("SERIALIZE/{0}")]
    SerializeError(String),
}

impl CivicError {
    /// Message suitable for showing inline next to the failed action
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationIncomplete { missing, .. } => {
                format!("Please complete the following before continuing: {}.", missing.join(", "))
            }
            Self::DeviceUnavailable(err) => err.user_message(),
            Self::SubmissionFailed(err) => err.user_message(),
            Self::InvalidSlot { capacity, .. } => {
                format!("Only {} image slot(s) are available.", capacity)
            }
            Self::PayloadError(_) => "That image could not be read. Please try another one.".to_string(),
            Self::InvalidState(_) | Self::ConfigError(_) | Self::SerializeError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Whether the error came from a device capability
    pub fn is_device(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }
}

// ============================================================================
// DEVICE ERRORS
// ============================================================================

/// Failure of a camera, geolocation or file capture
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera/{0}")]
    Camera(CameraFailure),

    #[error("geolocation/{0}")]
    Geolocation(GeoFailure),

    #[error("file/{0}")]
    File(String),

    /// The capture view was closed while the request was in flight; the late
    /// result was released and not applied.
    #[error("abandoned")]
    Abandoned,
}

impl DeviceError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Camera(failure) => failure.user_message().to_string(),
            Self::Geolocation(failure) => failure.user_message().to_string(),
            Self::File(reason) => format!("Could not use that file: {}.", reason),
            Self::Abandoned => "The camera was closed before the picture was taken.".to_string(),
        }
    }
}

impl From<CameraFailure> for DeviceError {
    fn from(failure: CameraFailure) -> Self {
        Self::Camera(failure)
    }
}

impl From<GeoFailure> for DeviceError {
    fn from(failure: GeoFailure) -> Self {
        Self::Geolocation(failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFailure {
    PermissionDenied,
    /// No device matches the requested facing mode
    NotFound,
    /// Another capture view already holds the stream
    Busy,
    Unsupported,
    /// The stream stopped delivering frames
    StreamEnded,
}

impl CameraFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::Busy => "busy",
            Self::Unsupported => "unsupported",
            Self::StreamEnded => "stream_ended",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access denied. Please allow camera access or upload a picture instead."
            }
            Self::NotFound => "No camera was found on this device. Please upload a picture instead.",
            Self::Busy => "The camera is already open. Close it before opening it again.",
            Self::Unsupported => "Camera capture is not supported here. Please upload a picture instead.",
            Self::StreamEnded => "The camera stopped responding. Please reopen it and try again.",
        }
    }
}

impl fmt::Display for CameraFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified one-shot position failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// The platform has no geolocation capability at all
    Unsupported,
}

impl GeoFailure {
    pub const ALL: [GeoFailure; 4] = [
        Self::PermissionDenied,
        Self::PositionUnavailable,
        Self::Timeout,
        Self::Unsupported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access denied. Please enter your location manually or enable location services."
            }
            Self::PositionUnavailable => {
                "Location information unavailable. Please enter your location manually."
            }
            Self::Timeout => {
                "Location request timed out. Please try again or enter your location manually."
            }
            Self::Unsupported => {
                "Geolocation is not supported by this device. Please enter your location manually."
            }
        }
    }
}

impl fmt::Display for GeoFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SINK ERRORS
// ============================================================================

/// Classified failure returned by a submission sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unreachable: {0}")]
    Unreachable(String),
}

impl SinkError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(reason) => format!("Your complaint was not accepted: {}.", reason),
            Self::Unreachable(_) => {
                "We could not reach the complaint service. Your draft is saved, please try again."
                    .to_string()
            }
        }
    }
}
