//! Camera capture with acquire-on-open, release-on-every-exit discipline
//!
//! A [`CameraSession`] is the handle to the live stream. Closing it,
//! dropping it or abandoning the view that opened it stops every track and
//! frees the single-stream reservation.
use async_trait::async_trait;
use civic_core::{CameraFailure, CivicError, DeviceError, ImagePayload};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Which camera to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Rear-facing
    Environment,
    /// Front-facing
    User,
    Any,
}

/// A still frame grabbed from a live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Platform camera access
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request a live stream. Suspends until the hardware and permission
    /// grant resolve.
    async fn open_stream(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CameraFailure>;
}

/// A live video stream made of one or more hardware tracks
pub trait VideoStream: Send {
    fn facing(&self) -> Facing;

    fn grab_frame(&mut self) -> Result<Frame, CameraFailure>;

    /// Stop every underlying track. Calling it twice is harmless.
    fn stop(&mut self);
}

/// Stream held on behalf of the view with generation `generation`
struct LiveStream {
    generation: u64,
    stream: Box<dyn VideoStream>,
}

/// Shared between the service and its sessions. The live stream lives here,
/// not in the session, so abandoning a view can stop it immediately.
#[derive(Default)]
pub(crate) struct CameraState {
    busy: AtomicBool,
    view_generation: AtomicU64,
    live: Mutex<Option<LiveStream>>,
}

impl CameraState {
    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.view_generation.load(Ordering::Acquire)
    }

    fn live(&self) -> MutexGuard<'_, Option<LiveStream>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate the current view and stop its stream, if any. Returns the
    /// new generation.
    pub(crate) fn abandon(&self) -> u64 {
        let generation = self.view_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut live = self.live();
        if let Some(mut held) = live.take() {
            held.stream.stop();
            self.busy.store(false, Ordering::Release);
            info!(generation = held.generation, "camera stream stopped on abandon");
        }
        generation
    }

    /// Store a freshly acquired stream unless its view is already gone.
    /// The generation is compared under the lock so a concurrent abandon
    /// either rejects the stream here or finds and stops it.
    fn install(&self, generation: u64, stream: Box<dyn VideoStream>) -> Result<(), Box<dyn VideoStream>> {
        let mut live = self.live();
        if self.generation() != generation {
            return Err(stream);
        }
        *live = Some(LiveStream { generation, stream });
        Ok(())
    }

    fn holds(&self, generation: u64) -> bool {
        matches!(&*self.live(), Some(held) if held.generation == generation)
    }

    fn with_stream<R>(&self, generation: u64, f: impl FnOnce(&mut Box<dyn VideoStream>) -> R) -> Option<R> {
        match &mut *self.live() {
            Some(held) if held.generation == generation => Some(f(&mut held.stream)),
            _ => None,
        }
    }

    /// Stop the stream of `generation`. Streams of later views are left alone.
    fn release(&self, generation: u64) -> bool {
        let mut live = self.live();
        match live.take() {
            Some(mut held) if held.generation == generation => {
                held.stream.stop();
                self.busy.store(false, Ordering::Release);
                true
            }
            other => {
                *live = other;
                false
            }
        }
    }
}

/// Holds the single-stream slot while a stream is being acquired. Dropping
/// it without handing it to a session frees the slot, so a failed or
/// cancelled acquisition never leaks the reservation.
pub(crate) struct Reservation {
    state: Arc<CameraState>,
    armed: bool,
}

impl Reservation {
    pub(crate) fn take(state: &Arc<CameraState>) -> Result<Self, CameraFailure> {
        state
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CameraFailure::Busy)?;
        Ok(Self {
            state: Arc::clone(state),
            armed: true,
        })
    }

    fn disarm(mut self) -> Arc<CameraState> {
        self.armed = false;
        Arc::clone(&self.state)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            self.state.busy.store(false, Ordering::Release);
        }
    }
}

/// Open camera handle bound to the view that opened it
pub struct CameraSession {
    state: Arc<CameraState>,
    generation: u64,
    facing: Facing,
    captures: usize,
}

impl CameraSession {
    /// Bind an acquired stream to a session, unless the view that asked for
    /// it has been closed in the meantime.
    pub(crate) fn bind(
        stream: Box<dyn VideoStream>,
        reservation: Reservation,
        generation: u64,
    ) -> Result<Self, CivicError> {
        let facing = stream.facing();
        if let Err(mut late) = reservation.state.install(generation, stream) {
            warn!(generation, "camera view closed during acquisition, releasing late stream");
            late.stop();
            drop(reservation);
            return Err(DeviceError::Abandoned.into());
        }

        info!(generation, ?facing, "camera stream opened");
        Ok(Self {
            state: reservation.disarm(),
            generation,
            facing,
            captures: 0,
        })
    }

    pub fn facing(&self) -> Option<Facing> {
        self.is_open().then_some(self.facing)
    }

    pub fn is_open(&self) -> bool {
        self.state.holds(self.generation)
    }

    /// The view that owns this session has been closed
    pub fn is_abandoned(&self) -> bool {
        self.state.generation() != self.generation
    }

    /// Number of frames captured so far
    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Take a still frame and encode it as an image payload.
    ///
    /// A session whose view was abandoned has already lost its stream; the
    /// request is discarded. A failing stream is released.
    pub fn capture(&mut self) -> Result<ImagePayload, CivicError> {
        if self.is_abandoned() {
            self.release();
            return Err(DeviceError::Abandoned.into());
        }

        let frame = match self.state.with_stream(self.generation, |stream| stream.grab_frame()) {
            Some(Ok(frame)) => frame,
            Some(Err(failure)) => {
                warn!(%failure, "frame grab failed, releasing camera");
                self.release();
                return Err(DeviceError::Camera(failure).into());
            }
            None => return Err(DeviceError::Camera(CameraFailure::StreamEnded).into()),
        };

        let payload = ImagePayload::encode(&frame.mime, &frame.bytes)?;
        self.captures += 1;
        debug!(bytes = frame.bytes.len(), mime = %frame.mime, "frame captured");
        Ok(payload)
    }

    /// Explicit close
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.state.release(self.generation) {
            info!(generation = self.generation, captures = self.captures, "camera stream released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("open", &self.is_open())
            .field("generation", &self.generation)
            .field("captures", &self.captures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedCamera;

    async fn open(camera: &SimulatedCamera, state: &Arc<CameraState>) -> CameraSession {
        let reservation = Reservation::take(state).unwrap();
        let generation = state.generation();
        let stream = camera.open_stream(Facing::Environment).await.unwrap();
        CameraSession::bind(stream, reservation, generation).unwrap()
    }

    #[tokio::test]
    async fn test_abandon_stops_live_stream() {
        let camera = SimulatedCamera::new();
        let state = Arc::new(CameraState::default());
        let session = open(&camera, &state).await;

        state.abandon();
        assert_eq!(camera.live_tracks(), 0);
        assert!(!state.is_busy());
        assert!(!session.is_open());
        assert_eq!(session.facing(), None);
    }

    #[tokio::test]
    async fn test_stale_session_drop_keeps_newer_stream() {
        let camera = SimulatedCamera::new();
        let state = Arc::new(CameraState::default());
        let stale = open(&camera, &state).await;
        state.abandon();

        let fresh = open(&camera, &state).await;
        drop(stale);
        assert!(fresh.is_open());
        assert!(state.is_busy());
        assert_eq!(camera.live_tracks(), 1);
    }
}
