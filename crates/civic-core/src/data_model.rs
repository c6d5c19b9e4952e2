//! Data Model: DraftRecord, ImageSlots, Location, CompletedComplaint
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CivicError;
use crate::payload::ImagePayload;

/// Fixed number of image slots on a draft
pub const IMAGE_SLOT_CAPACITY: usize = 3;

/// Progress stamped on a freshly submitted complaint
pub const SUBMITTED_PROGRESS: u8 = 10;

// ============================================================================
// LOCATION
// ============================================================================

/// Where the incident happened.
///
/// Once a draft holds a location its address is non-empty. Manually entered
/// locations carry `0.0` coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Location {
    /// Location from a position fix, addressed by its formatted coordinates
    pub fn from_fix(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: format!("{:.4}, {:.4}", latitude, longitude),
        }
    }

    /// Manually typed address. Blank input yields no location.
    pub fn manual(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return None;
        }
        Some(Self {
            latitude: 0.0,
            longitude: 0.0,
            address,
        })
    }

    /// False for manual entries
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

// ============================================================================
// IMAGE SLOTS
// ============================================================================

/// Fixed-capacity ordered image sequence; empty slots hold `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSlots([Option<ImagePayload>; IMAGE_SLOT_CAPACITY]);

impl ImageSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn capacity(&self) -> usize {
        IMAGE_SLOT_CAPACITY
    }

    pub fn get(&self, index: usize) -> Option<&ImagePayload> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Copy of these slots with `index` replaced; other slots are untouched
    pub fn with_slot(&self, index: usize, payload: Option<ImagePayload>) -> Result<Self, CivicError> {
        let mut next = self.clone();
        next.put(index, payload)?;
        Ok(next)
    }

    /// Replace a single slot in place, returning the previous occupant
    pub fn put(
        &mut self,
        index: usize,
        payload: Option<ImagePayload>,
    ) -> Result<Option<ImagePayload>, CivicError> {
        let slot = self.0.get_mut(index).ok_or(CivicError::InvalidSlot {
            index,
            capacity: IMAGE_SLOT_CAPACITY,
        })?;
        Ok(std::mem::replace(slot, payload))
    }

    pub fn any_populated(&self) -> bool {
        self.0.iter().any(Option::is_some)
    }

    pub fn populated_count(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    /// Populated slots with their indexes, in slot order
    pub fn populated(&self) -> impl Iterator<Item = (usize, &ImagePayload)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|payload| (index, payload)))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ImagePayload>> {
        self.0.iter().map(Option::as_ref)
    }
}

// ============================================================================
// ROUTING FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Can wait",
            Self::Medium => "Should be addressed",
            Self::High => "Needs attention",
            Self::Critical => "Immediate action",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    FirstTime,
    Recurring,
    Ongoing,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Self::FirstTime, Self::Recurring, Self::Ongoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTime => "first-time",
            Self::Recurring => "recurring",
            Self::Ongoing => "ongoing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstTime => "First Time",
            Self::Recurring => "Recurring",
            Self::Ongoing => "Ongoing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FirstTime => "Never happened before",
            Self::Recurring => "Happens occasionally",
            Self::Ongoing => "Continuous problem",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DRAFT RECORD
// ============================================================================

/// The in-progress complaint, owned by one wizard session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub images: ImageSlots,
    pub location: Option<Location>,
    pub description: String,
    pub category: Option<String>,
    pub urgency: Option<Urgency>,
    pub frequency: Option<Frequency>,
    pub assigned_to: Option<String>,
    /// Set when the draft is frozen by a successful finalize
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DraftRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// Non-empty location address, if any
    pub fn address(&self) -> Option<&str> {
        self.location
            .as_ref()
            .map(|loc| loc.address.as_str())
            .filter(|addr| !addr.trim().is_empty())
    }

    /// At least one image or a location address
    pub fn has_evidence(&self) -> bool {
        self.images.any_populated() || self.address().is_some()
    }

    /// Non-blank category
    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn assigned_to(&self) -> Option<&str> {
        non_blank(self.assigned_to.as_deref())
    }

    pub fn is_frozen(&self) -> bool {
        self.created_at.is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// COMPLETED COMPLAINT
// ============================================================================

/// Lifecycle status of a finalized complaint. Later statuses belong to the
/// storage side and never originate here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ComplaintStatus {
    Submitted,
}

/// Immutable snapshot handed to the submission sink.
///
/// Only produced by [`CompletedComplaint::freeze`], which the wizard calls
/// once per session on finalize. There is no deserializer: a sink that
/// reads records back owns its own stored representation. Fields are
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedComplaint {
    id: Uuid,
    description: String,
    category: Option<String>,
    location: Option<Location>,
    images: Vec<ImagePayload>,
    urgency: Option<Urgency>,
    frequency: Option<Frequency>,
    assigned_to: Option<String>,
    status: ComplaintStatus,
    progress: u8,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    digest: String,
}

/// Fields covered by the digest
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestBody<'a> {
    id: &'a Uuid,
    description: &'a str,
    category: Option<&'a str>,
    location: Option<&'a Location>,
    images: &'a [ImagePayload],
    urgency: Option<Urgency>,
    frequency: Option<Frequency>,
    assigned_to: Option<&'a str>,
    created_at: &'a DateTime<Utc>,
}

impl CompletedComplaint {
    /// Freeze a draft into a submittable record stamped at `at`. A draft
    /// that has already been frozen cannot produce a second complaint.
    pub fn freeze(draft: &DraftRecord, id: Uuid, at: DateTime<Utc>) -> Result<Self, CivicError> {
        if draft.is_frozen() {
            return Err(CivicError::InvalidState("draft was already finalized".to_string()));
        }

        let images: Vec<ImagePayload> = draft.images.populated().map(|(_, p)| p.clone()).collect();
        let category = draft.category().map(str::to_string);
        let assigned_to = draft.assigned_to().map(str::to_string);
        let location = draft.address().and(draft.location.clone());

        let body = DigestBody {
            id: &id,
            description: draft.description.trim(),
            category: category.as_deref(),
            location: location.as_ref(),
            images: &images,
            urgency: draft.urgency,
            frequency: draft.frequency,
            assigned_to: assigned_to.as_deref(),
            created_at: &at,
        };
        let bytes = serde_json::to_vec(&body).map_err(|e| CivicError::SerializeError(e.to_string()))?;
        let digest = format!("blake3:{}", blake3::hash(&bytes));

        Ok(Self {
            id,
            description: draft.description.trim().to_string(),
            category,
            location,
            images,
            urgency: draft.urgency,
            frequency: draft.frequency,
            assigned_to,
            status: ComplaintStatus::Submitted,
            progress: SUBMITTED_PROGRESS,
            created_at: at,
            updated_at: at,
            digest,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn images(&self) -> &[ImagePayload] {
        &self.images
    }

    pub fn urgency(&self) -> Option<Urgency> {
        self.urgency
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `blake3:<hex>` over the complaint body; stable for a given record
    pub fn digest(&self) -> &str {
        &self.digest
    }
}
