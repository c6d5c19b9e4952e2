//! Wizard configuration
//!
//! One struct carries the stage plan, image slot count and device settings.
//! Presets cover the known flows; anything else loads from YAML.

use civic_capture::CaptureSettings;
use civic_core::{CivicError, IMAGE_SLOT_CAPACITY};
use civic_stages::StagePlan;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Config name (e.g., "three-stage@1.0")
    pub name: String,

    /// Ordered stages and their requirements
    pub plan: StagePlan,

    // === Images ===

    /// Usable image slots, 1 to 3
    pub image_slots: usize,

    // === Devices ===

    pub capture: CaptureSettings,

    /// Simulated latency of the placeholder classifier
    pub classifier_delay_ms: u64,

    // === Routing ===

    /// Fill the department from the category when leaving a classify stage
    pub auto_assign_department: bool,
}

impl WizardConfig {
    /// Capture → Confirm, single image
    pub fn two_stage() -> Self {
        Self {
            name: "two-stage@1.0".to_string(),
            plan: StagePlan::two_stage(),
            image_slots: 1,
            ..Self::three_stage()
        }
    }

    /// Capture → Classify → Confirm, three images
    pub fn three_stage() -> Self {
        Self {
            name: "three-stage@1.0".to_string(),
            plan: StagePlan::three_stage(),
            image_slots: IMAGE_SLOT_CAPACITY,
            capture: CaptureSettings::default(),
            classifier_delay_ms: 2000,
            auto_assign_department: true,
        }
    }

    /// Three stages, classification also asks for urgency and frequency
    pub fn citizen_connect() -> Self {
        Self {
            name: "citizen-connect@1.0".to_string(),
            plan: StagePlan::citizen_connect(),
            image_slots: 1,
            ..Self::three_stage()
        }
    }

    /// Get config by preset name
    pub fn for_preset(name: &str) -> Option<Self> {
        match name {
            "two-stage" => Some(Self::two_stage()),
            "three-stage" => Some(Self::three_stage()),
            "citizen-connect" => Some(Self::citizen_connect()),
            _ => None,
        }
    }

    /// Load and validate a config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, CivicError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| CivicError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CivicError> {
        self.plan.validate()?;
        if !(1..=IMAGE_SLOT_CAPACITY).contains(&self.image_slots) {
            return Err(CivicError::ConfigError(format!(
                "image_slots must be between 1 and {}, got {}",
                IMAGE_SLOT_CAPACITY, self.image_slots
            )));
        }
        if self.capture.geolocation_timeout_ms == 0 {
            return Err(CivicError::ConfigError("geolocation timeout must be positive".to_string()));
        }
        if self.capture.max_image_bytes == 0 {
            return Err(CivicError::ConfigError("max_image_bytes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn classifier_delay(&self) -> Duration {
        Duration::from_millis(self.classifier_delay_ms)
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self::three_stage()
    }
}
