//! One-shot geolocation
//!
//! A single position request per call: no watching, no polling, no retry.
//! The address is a formatted coordinate placeholder; nothing is reverse
//! geocoded.
use async_trait::async_trait;
use civic_core::{GeoFailure, Location};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options passed to the platform position request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    /// Accept a cached fix at most this old
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Raw position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters, when reported
    pub accuracy_m: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn to_location(&self) -> Location {
        Location::from_fix(self.latitude, self.longitude)
    }
}

/// Platform position source
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, GeoFailure>;
}

/// Run one bounded position request and turn the fix into a location
pub(crate) async fn locate_once(
    provider: Option<&dyn GeolocationProvider>,
    options: &PositionOptions,
) -> Result<Location, GeoFailure> {
    let provider = provider.ok_or(GeoFailure::Unsupported)?;

    let coords = tokio::time::timeout(options.timeout, provider.current_position(options))
        .await
        .map_err(|_| GeoFailure::Timeout)??;

    if !coords.is_valid() {
        return Err(GeoFailure::PositionUnavailable);
    }
    Ok(coords.to_location())
}
