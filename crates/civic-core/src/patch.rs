//! Partial draft updates with merge-patch semantics
//!
//! An absent field keeps its value, an explicit `null` clears it and any
//! other value replaces it. Image slots are replaced as a whole array.
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data_model::{DraftRecord, Frequency, ImageSlots, Location, Urgency};

/// Three-state field update
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    fn apply_to(self, field: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Clear => *field = None,
            Self::Set(value) => *field = Some(value),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Keep | Self::Clear => serializer.serialize_none(),
        }
    }
}

/// A partial set of draft fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub images: Patch<ImageSlots>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub location: Patch<Location>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub category: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub urgency: Patch<Urgency>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub frequency: Patch<Frequency>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub assigned_to: Patch<String>,
}

impl DraftPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(mut self, images: ImageSlots) -> Self {
        self.images = Patch::Set(images);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Patch::Set(location);
        self
    }

    pub fn clear_location(mut self) -> Self {
        self.location = Patch::Clear;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Patch::Set(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Patch::Set(category.into());
        self
    }

    pub fn clear_category(mut self) -> Self {
        self.category = Patch::Clear;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Patch::Set(urgency);
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Patch::Set(frequency);
        self
    }

    pub fn with_assigned_to(mut self, department: impl Into<String>) -> Self {
        self.assigned_to = Patch::Set(department.into());
        self
    }

    /// True when applying the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.images.is_keep()
            && self.location.is_keep()
            && self.description.is_keep()
            && self.category.is_keep()
            && self.urgency.is_keep()
            && self.frequency.is_keep()
            && self.assigned_to.is_keep()
    }

    /// Names of the fields this patch touches, for logging
    pub fn touched(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if !self.images.is_keep() {
            fields.push("images");
        }
        if !self.location.is_keep() {
            fields.push("location");
        }
        if !self.description.is_keep() {
            fields.push("description");
        }
        if !self.category.is_keep() {
            fields.push("category");
        }
        if !self.urgency.is_keep() {
            fields.push("urgency");
        }
        if !self.frequency.is_keep() {
            fields.push("frequency");
        }
        if !self.assigned_to.is_keep() {
            fields.push("assignedTo");
        }
        fields
    }
}

impl DraftRecord {
    /// Shallow merge of `patch` into this draft.
    ///
    /// A location with a blank address and blank category or department
    /// strings count as clears.
    pub fn apply(&mut self, patch: DraftPatch) {
        match patch.images {
            Patch::Keep => {}
            Patch::Clear => self.images = ImageSlots::default(),
            Patch::Set(images) => self.images = images,
        }

        match patch.location {
            Patch::Set(loc) if loc.address.trim().is_empty() => self.location = None,
            other => other.apply_to(&mut self.location),
        }

        match patch.description {
            Patch::Keep => {}
            Patch::Clear => self.description.clear(),
            Patch::Set(text) => self.description = text,
        }

        blank_as_clear(patch.category).apply_to(&mut self.category);
        patch.urgency.apply_to(&mut self.urgency);
        patch.frequency.apply_to(&mut self.frequency);
        blank_as_clear(patch.assigned_to).apply_to(&mut self.assigned_to);
    }
}

fn blank_as_clear(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Set(value) if value.trim().is_empty() => Patch::Clear,
        other => other,
    }
}
