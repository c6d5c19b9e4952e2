//! Stage validation: may the user leave the current stage?
//!
//! Pure functions of the draft. The wizard re-runs them after every field
//! change so the advance affordance tracks live state.

use civic_core::{CivicError, DraftRecord};
use serde::{Deserialize, Serialize};

use crate::plan::{StageKind, StagePlan};
use crate::requirement::Requirement;

/// Outcome of checking one stage against a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCheck {
    pub stage: String,
    pub kind: StageKind,
    pub passed: bool,
    /// Unmet requirements, in the order the stage lists them
    pub missing: Vec<Requirement>,
}

impl StageCheck {
    pub fn missing_names(&self) -> Vec<String> {
        self.missing.iter().map(|r| r.as_str().to_string()).collect()
    }

    /// Inline hint for a disabled "next" action, `None` when passed
    pub fn hint(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        let parts: Vec<&str> = self.missing.iter().map(Requirement::hint).collect();
        Some(format!("Add {} to continue.", parts.join(" and ")))
    }

    /// Blocked check as a finalize error
    pub fn into_error(self) -> CivicError {
        CivicError::ValidationIncomplete {
            missing: self.missing_names(),
            stage: self.stage,
        }
    }
}

/// Validator bound to a stage plan
#[derive(Debug, Clone)]
pub struct StageValidator {
    plan: StagePlan,
}

impl StageValidator {
    pub fn new(plan: StagePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Check stage `index` against the draft. Indexes past the plan have
    /// nothing left to require.
    pub fn check(&self, index: usize, draft: &DraftRecord) -> StageCheck {
        match self.plan.stage(index) {
            Some(stage) => StageCheck {
                stage: stage.name.clone(),
                kind: stage.kind,
                passed: stage.requirements().iter().all(|r| r.is_met(draft)),
                missing: stage
                    .requirements()
                    .iter()
                    .copied()
                    .filter(|r| !r.is_met(draft))
                    .collect(),
            },
            None => StageCheck {
                stage: format!("#{}", index),
                kind: StageKind::Confirm,
                passed: true,
                missing: Vec::new(),
            },
        }
    }

    pub fn can_leave(&self, index: usize, draft: &DraftRecord) -> bool {
        self.check(index, draft).passed
    }

    /// First stage, in plan order, whose requirements the draft misses
    pub fn first_blocking(&self, draft: &DraftRecord) -> Option<StageCheck> {
        (0..self.plan.len())
            .map(|index| self.check(index, draft))
            .find(|check| !check.passed)
    }

    /// Every stage's requirements are met
    pub fn is_complete(&self, draft: &DraftRecord) -> bool {
        self.first_blocking(draft).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::{DraftPatch, ImagePayload, Location};

    fn draft_with(patch: DraftPatch) -> DraftRecord {
        let mut draft = DraftRecord::new();
        draft.apply(patch);
        draft
    }

    #[test]
    fn test_capture_passes_with_address_only() {
        let validator = StageValidator::new(StagePlan::three_stage());
        let draft = draft_with(
            DraftPatch::new()
                .with_description("Pothole on Main St")
                .with_location(Location::manual("Main St & 5th").unwrap()),
        );
        assert!(validator.can_leave(0, &draft));
    }

    #[test]
    fn test_capture_blocks_without_evidence() {
        let validator = StageValidator::new(StagePlan::three_stage());
        let draft = draft_with(DraftPatch::new().with_description("Pothole on Main St"));

        let check = validator.check(0, &draft);
        assert!(!check.passed);
        assert_eq!(check.missing, vec![Requirement::Evidence]);
        assert_eq!(check.hint().unwrap(), "Add a picture or the location to continue.");
    }

    #[test]
    fn test_capture_blocks_without_description() {
        let validator = StageValidator::new(StagePlan::two_stage());
        let png = ImagePayload::encode("image/png", b"x").unwrap();
        let draft = draft_with(
            DraftPatch::new().with_images(civic_core::ImageSlots::new().with_slot(0, Some(png)).unwrap()),
        );
        assert_eq!(validator.check(0, &draft).missing, vec![Requirement::Description]);
    }

    #[test]
    fn test_classify_and_confirm() {
        let validator = StageValidator::new(StagePlan::three_stage());
        let mut draft = DraftRecord::new();
        assert!(!validator.can_leave(1, &draft));
        assert!(validator.can_leave(2, &draft));

        draft.apply(DraftPatch::new().with_category("Traffic"));
        assert!(validator.can_leave(1, &draft));
    }

    #[test]
    fn test_first_blocking_reports_earliest_stage() {
        let validator = StageValidator::new(StagePlan::three_stage());
        let draft = draft_with(DraftPatch::new().with_category("Sanitation"));

        let blocking = validator.first_blocking(&draft).unwrap();
        assert_eq!(blocking.stage, "report");

        let err = blocking.into_error();
        assert_eq!(
            err,
            CivicError::ValidationIncomplete {
                stage: "report".to_string(),
                missing: vec!["description".to_string(), "evidence".to_string()],
            }
        );
    }
}
