//! Civic Stages: stage plans and the validators that gate them
//!
//! # Flow
//!
//! ```text
//! report (capture) → classify (optional) → review (confirm) → finalize
//!       ↓                   ↓                     ↓
//!  description +        category             nothing new
//!  image | address
//! ```
//!
//! # Example
//!
//! ```
//! use civic_core::{DraftPatch, DraftRecord, Location};
//! use civic_stages::{StagePlan, StageValidator};
//!
//! let validator = StageValidator::new(StagePlan::two_stage());
//! let mut draft = DraftRecord::new();
//! assert!(!validator.can_leave(0, &draft));
//!
//! draft.apply(
//!     DraftPatch::new()
//!         .with_description("Pothole on Main St")
//!         .with_location(Location::manual("Main St & 5th").unwrap()),
//! );
//! assert!(validator.can_leave(0, &draft));
//! ```

pub mod plan;
pub mod requirement;
pub mod validator;

pub use plan::{StageKind, StagePlan, StageSpec};
pub use requirement::Requirement;
pub use validator::{StageCheck, StageValidator};
