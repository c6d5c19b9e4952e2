//! Simulated devices for hosts without hardware and for tests.
//!
//! Both keep counters so callers can observe acquisition and release.
use async_trait::async_trait;
use civic_core::{CameraFailure, GeoFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::camera::{CameraDevice, Facing, Frame, VideoStream};
use crate::geolocation::{Coordinates, GeolocationProvider, PositionOptions};

const SIMULATED_FRAME: &[u8] = b"\xFF\xD8\xFF\xE0simulated-frame\xFF\xD9";

/// Camera that hands out in-memory streams
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    has_rear: bool,
    failure: Option<CameraFailure>,
    delay: Duration,
    tracks_per_stream: usize,
    live_tracks: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            has_rear: true,
            failure: None,
            delay: Duration::ZERO,
            tracks_per_stream: 1,
            live_tracks: Arc::new(AtomicUsize::new(0)),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Only a front-facing camera is present
    pub fn front_only(mut self) -> Self {
        self.has_rear = false;
        self
    }

    /// Every open fails with `failure`
    pub fn failing(mut self, failure: CameraFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Acquisition takes `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_tracks(mut self, tracks: usize) -> Self {
        self.tracks_per_stream = tracks.max(1);
        self
    }

    /// Tracks started and not yet stopped
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// Streams successfully handed out
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SimulatedCamera {
    async fn open_stream(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CameraFailure> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        let facing = match facing {
            Facing::Environment if !self.has_rear => return Err(CameraFailure::NotFound),
            Facing::Any if !self.has_rear => Facing::User,
            Facing::Any => Facing::Environment,
            other => other,
        };

        self.live_tracks.fetch_add(self.tracks_per_stream, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedStream {
            facing,
            tracks: self.tracks_per_stream,
            live_tracks: Arc::clone(&self.live_tracks),
            stopped: false,
        }))
    }
}

/// Stream whose tracks are counted on the owning camera. Dropping it does
/// not stop the tracks; only `stop` does.
#[derive(Debug)]
pub struct SimulatedStream {
    facing: Facing,
    tracks: usize,
    live_tracks: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for SimulatedStream {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraFailure> {
        if self.stopped {
            return Err(CameraFailure::StreamEnded);
        }
        Ok(Frame {
            mime: "image/jpeg".to_string(),
            bytes: SIMULATED_FRAME.to_vec(),
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live_tracks.fetch_sub(self.tracks, Ordering::SeqCst);
        }
    }
}

/// Position source with a scripted answer
#[derive(Debug, Clone)]
pub struct SimulatedGeolocation {
    outcome: Result<Coordinates, GeoFailure>,
    delay: Duration,
    requests: Arc<AtomicUsize>,
}

impl SimulatedGeolocation {
    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self {
            outcome: Ok(Coordinates::new(latitude, longitude)),
            delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(failure: GeoFailure) -> Self {
        Self {
            outcome: Err(failure),
            delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Position requests received
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeolocationProvider for SimulatedGeolocation {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, GeoFailure> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
    }
}
