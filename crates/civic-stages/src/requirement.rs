//! Field requirements a stage can impose on the draft
use civic_core::DraftRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One required-field rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Non-blank description
    Description,
    /// Any populated image slot OR a non-empty location address
    Evidence,
    Category,
    Urgency,
    Frequency,
    AssignedTo,
}

impl Requirement {
    pub fn is_met(&self, draft: &DraftRecord) -> bool {
        match self {
            Self::Description => draft.has_description(),
            Self::Evidence => draft.has_evidence(),
            Self::Category => draft.category().is_some(),
            Self::Urgency => draft.urgency.is_some(),
            Self::Frequency => draft.frequency.is_some(),
            Self::AssignedTo => draft.assigned_to().is_some(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Evidence => "evidence",
            Self::Category => "category",
            Self::Urgency => "urgency",
            Self::Frequency => "frequency",
            Self::AssignedTo => "assigned_to",
        }
    }

    /// What the user has to provide
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Description => "a description of the issue",
            Self::Evidence => "a picture or the location",
            Self::Category => "an issue category",
            Self::Urgency => "an urgency level",
            Self::Frequency => "how often it happens",
            Self::AssignedTo => "a department",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
