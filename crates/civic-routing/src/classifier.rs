//! Classifier hook: suggest a category from an image
//!
//! Real inference services and the placeholder implement the same trait,
//! so the wizard never knows which one it is talking to.
use async_trait::async_trait;
use civic_core::ImagePayload;
use std::time::Duration;
use tracing::debug;

use crate::resolver::KNOWN_CATEGORIES;

/// Result of asking a classifier for a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierOutcome {
    Suggested(String),
    /// No suggestion; the user picks the category manually
    Unavailable(String),
}

impl ClassifierOutcome {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Suggested(category) => Some(category),
            Self::Unavailable(_) => None,
        }
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, image: &ImagePayload) -> ClassifierOutcome;
}

/// Stand-in for a real model: waits `delay`, then picks one of the known
/// categories from the image digest. The same image always yields the same
/// category.
#[derive(Debug, Clone)]
pub struct PlaceholderClassifier {
    delay: Duration,
}

impl PlaceholderClassifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No simulated latency
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    fn pick(image: &ImagePayload) -> &'static str {
        let digest = image.digest();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        let index = u64::from_le_bytes(prefix) % KNOWN_CATEGORIES.len() as u64;
        KNOWN_CATEGORIES[index as usize]
    }
}

impl Default for PlaceholderClassifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl Classifier for PlaceholderClassifier {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn classify(&self, image: &ImagePayload) -> ClassifierOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let category = Self::pick(image);
        debug!(classifier = "placeholder", category, "category suggested");
        ClassifierOutcome::Suggested(category.to_string())
    }
}

/// Used when no classifier is wired in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassifier;

#[async_trait]
impl Classifier for NoClassifier {
    fn name(&self) -> &str {
        "none"
    }

    async fn classify(&self, _image: &ImagePayload) -> ClassifierOutcome {
        ClassifierOutcome::Unavailable("no classifier configured".to_string())
    }
}
