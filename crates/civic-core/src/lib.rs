//! Civic Core: draft data model, merge patches, image payloads and errors
//!
//! Leaf crate shared by every stage of the complaint wizard. Nothing here
//! performs I/O; device access, validation and sequencing live in the
//! crates built on top.

pub mod context;
pub mod data_model;
pub mod error;
pub mod patch;
pub mod payload;
pub mod telemetry;

pub use context::SessionContext;
pub use data_model::{
    ComplaintStatus, CompletedComplaint, DraftRecord, Frequency, ImageSlots, Location, Urgency,
    IMAGE_SLOT_CAPACITY, SUBMITTED_PROGRESS,
};
pub use error::{CameraFailure, CivicError, DeviceError, GeoFailure, SinkError};
pub use patch::{DraftPatch, Patch};
pub use payload::ImagePayload;

/// Engine version stamped into session contexts
pub const CIVIC_VERSION: &str = "1.0.0";
