//! Stage plans: the ordered stages of a wizard and what each one requires
//!
//! Stage count and per-stage required fields are data. A plan can come from
//! one of the presets or be loaded from YAML.

use civic_core::CivicError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::requirement::Requirement;

/// Role a stage plays in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Evidence and description capture
    Capture,
    /// Category selection and routing
    Classify,
    /// Read-only review before submission
    Confirm,
}

impl StageKind {
    /// Requirements a stage of this kind imposes when the plan names none
    pub fn default_requirements(&self) -> &'static [Requirement] {
        match self {
            Self::Capture => &[Requirement::Description, Requirement::Evidence],
            Self::Classify => &[Requirement::Category],
            Self::Confirm => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Classify => "classify",
            Self::Confirm => "confirm",
        }
    }
}

/// A single named stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub kind: StageKind,
    /// Overrides the kind's default requirements when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<Requirement>>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            requires: None,
        }
    }

    pub fn requiring(mut self, requirements: Vec<Requirement>) -> Self {
        self.requires = Some(requirements);
        self
    }

    /// Effective requirement set
    pub fn requirements(&self) -> &[Requirement] {
        match &self.requires {
            Some(explicit) => explicit.as_slice(),
            None => self.kind.default_requirements(),
        }
    }
}

/// Ordered list of stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub name: String,
    pub stages: Vec<StageSpec>,
}

impl StagePlan {
    /// Capture → Confirm
    pub fn two_stage() -> Self {
        Self {
            name: "two-stage@1.0".to_string(),
            stages: vec![
                StageSpec::new("report", StageKind::Capture),
                StageSpec::new("review", StageKind::Confirm),
            ],
        }
    }

    /// Capture → Classify → Confirm
    pub fn three_stage() -> Self {
        Self {
            name: "three-stage@1.0".to_string(),
            stages: vec![
                StageSpec::new("report", StageKind::Capture),
                StageSpec::new("classify", StageKind::Classify),
                StageSpec::new("review", StageKind::Confirm),
            ],
        }
    }

    /// Three stages where classification also asks for urgency and frequency
    pub fn citizen_connect() -> Self {
        Self {
            name: "citizen-connect@1.0".to_string(),
            stages: vec![
                StageSpec::new("report", StageKind::Capture),
                StageSpec::new("details", StageKind::Classify).requiring(vec![
                    Requirement::Category,
                    Requirement::Urgency,
                    Requirement::Frequency,
                ]),
                StageSpec::new("review", StageKind::Confirm),
            ],
        }
    }

    /// Get plan by preset name
    pub fn for_preset(name: &str) -> Option<Self> {
        match name {
            "two-stage" => Some(Self::two_stage()),
            "three-stage" => Some(Self::three_stage()),
            "citizen-connect" => Some(Self::citizen_connect()),
            _ => None,
        }
    }

    /// Load and validate a plan from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, CivicError> {
        let plan: Self = serde_yaml::from_str(yaml).map_err(|e| CivicError::ConfigError(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// At least two stages, unique names, ending in a confirm stage
    pub fn validate(&self) -> Result<(), CivicError> {
        if self.stages.len() < 2 {
            return Err(CivicError::ConfigError(format!(
                "plan '{}' needs at least 2 stages, has {}",
                self.name,
                self.stages.len()
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(CivicError::ConfigError("stage name must not be empty".to_string()));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(CivicError::ConfigError(format!("duplicate stage '{}'", stage.name)));
            }
        }

        match self.stages.last() {
            Some(last) if last.kind == StageKind::Confirm => Ok(()),
            _ => Err(CivicError::ConfigError(format!(
                "plan '{}' must end with a confirm stage",
                self.name
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> Option<&StageSpec> {
        self.stages.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    /// Whether any stage of the plan requires `requirement`
    pub fn requires(&self, requirement: Requirement) -> bool {
        self.stages.iter().any(|s| s.requirements().contains(&requirement))
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::three_stage()
    }
}
