//! Civic Wizard: guided complaint drafting
//!
//! One [`WizardController`] per session walks the user through the stages of
//! a [`WizardConfig`], merges edits into the draft through a [`DraftStore`]
//! and hands the finalized complaint to a [`SubmissionSink`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use civic_wizard::{MemorySink, WizardConfig, WizardController};
//!
//! let sink = Arc::new(MemorySink::new());
//! let mut wizard = WizardController::new(WizardConfig::two_stage(), sink.clone())?;
//!
//! wizard.set_description("Pothole on Main St")?;
//! wizard.set_manual_address("Main St & 5th")?;
//! wizard.advance()?;
//!
//! let complaint = wizard.finalize().await?;
//! assert_eq!(sink.len().await, 1);
//! ```

pub mod config;
pub mod controller;
pub mod sink;
pub mod store;

pub use config::WizardConfig;
pub use controller::{Transition, WizardController, WizardState, WizardView};
pub use sink::{MemorySink, SubmissionSink};
pub use store::DraftStore;

pub use civic_capture::{CameraSession, DeviceCaptureService};
pub use civic_core::{CivicError, CompletedComplaint, DraftPatch, DraftRecord};
