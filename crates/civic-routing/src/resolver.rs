//! Category → department lookup
//!
//! Pure and total: every input, including none, resolves to a department.
use civic_core::DraftRecord;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Categories the routing table and the placeholder classifier know about
pub const KNOWN_CATEGORIES: [&str; 6] = [
    "Infrastructure",
    "Public Safety",
    "Sanitation",
    "Traffic",
    "Environment",
    "Public Services",
];

/// Downstream routing target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Road Department")]
    Roads,
    #[serde(rename = "Water & Sanitation")]
    WaterAndSanitation,
    #[serde(rename = "Electrical Department")]
    Electrical,
    #[serde(rename = "Parks & Recreation")]
    ParksAndRecreation,
    #[serde(rename = "Traffic Management")]
    TrafficManagement,
    #[serde(rename = "Environmental Services")]
    EnvironmentalServices,
    #[serde(rename = "Public Safety")]
    PublicSafety,
    #[serde(rename = "Building & Permits")]
    BuildingAndPermits,
    #[serde(rename = "General Services")]
    GeneralServices,
}

impl Department {
    pub const ALL: [Department; 9] = [
        Self::Roads,
        Self::WaterAndSanitation,
        Self::Electrical,
        Self::ParksAndRecreation,
        Self::TrafficManagement,
        Self::EnvironmentalServices,
        Self::PublicSafety,
        Self::BuildingAndPermits,
        Self::GeneralServices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Roads => "Road Department",
            Self::WaterAndSanitation => "Water & Sanitation",
            Self::Electrical => "Electrical Department",
            Self::ParksAndRecreation => "Parks & Recreation",
            Self::TrafficManagement => "Traffic Management",
            Self::EnvironmentalServices => "Environmental Services",
            Self::PublicSafety => "Public Safety",
            Self::BuildingAndPermits => "Building & Permits",
            Self::GeneralServices => "General Services",
        }
    }

    /// Look a department up by its display name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercased category → department
static ROUTING_TABLE: Lazy<HashMap<String, Department>> = Lazy::new(|| {
    [
        ("Infrastructure", Department::Roads),
        ("Public Safety", Department::PublicSafety),
        ("Sanitation", Department::WaterAndSanitation),
        ("Traffic", Department::TrafficManagement),
        ("Environment", Department::EnvironmentalServices),
        ("Public Services", Department::BuildingAndPermits),
    ]
    .into_iter()
    .map(|(category, department)| (category.to_ascii_lowercase(), department))
    .collect()
});

/// Fallback for unknown or missing categories
pub const FALLBACK_DEPARTMENT: Department = Department::GeneralServices;

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryResolver;

impl CategoryResolver {
    pub fn new() -> Self {
        Self
    }

    /// Recommended department for a category. Matching trims whitespace and
    /// ignores ASCII case.
    pub fn resolve(&self, category: Option<&str>) -> Department {
        category
            .map(|c| c.trim().to_ascii_lowercase())
            .and_then(|key| ROUTING_TABLE.get(&key).copied())
            .unwrap_or(FALLBACK_DEPARTMENT)
    }

    /// Recommendation for a draft's current category
    pub fn recommend(&self, draft: &DraftRecord) -> Department {
        self.resolve(draft.category())
    }

    /// Canonical spelling of a known category
    pub fn canonical(&self, category: &str) -> Option<&'static str> {
        let category = category.trim();
        KNOWN_CATEGORIES.into_iter().find(|known| known.eq_ignore_ascii_case(category))
    }
}
