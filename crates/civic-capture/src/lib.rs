//! Civic Capture: device resources used while building a draft
//!
//! - **Camera**: acquire on open, guaranteed release on close, drop,
//!   failure or abandonment. At most one stream at a time.
//! - **Geolocation**: one-shot fix with classified failures.
//! - **Files**: local image → data-URI payload.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use civic_capture::{CaptureSettings, DeviceCaptureService, SimulatedCamera};
//!
//! # tokio_test_block(async {
//! let camera = SimulatedCamera::new();
//! let service = DeviceCaptureService::new(CaptureSettings::default())
//!     .with_camera(Arc::new(camera.clone()));
//!
//! let mut session = service.open_camera().await.unwrap();
//! let image = session.capture().unwrap();
//! assert!(image.to_data_uri().starts_with("data:image/jpeg;base64,"));
//! session.close();
//! assert_eq!(camera.live_tracks(), 0);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod camera;
pub mod files;
pub mod geolocation;
pub mod service;
pub mod simulated;

pub use camera::{CameraDevice, CameraSession, Facing, Frame, VideoStream};
pub use files::{mime_for_path, read_image_file, DEFAULT_MAX_IMAGE_BYTES};
pub use geolocation::{Coordinates, GeolocationProvider, PositionOptions};
pub use service::{CaptureSettings, DeviceCaptureService};
pub use simulated::{SimulatedCamera, SimulatedGeolocation, SimulatedStream};
