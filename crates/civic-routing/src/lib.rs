//! Civic Routing: where a complaint should go
//!
//! - [`CategoryResolver`] maps a category to the recommended department.
//! - [`Classifier`] is the hook an image classifier plugs into;
//!   [`PlaceholderClassifier`] stands in until a real one exists.

pub mod classifier;
pub mod resolver;

pub use classifier::{Classifier, ClassifierOutcome, NoClassifier, PlaceholderClassifier};
pub use resolver::{CategoryResolver, Department, FALLBACK_DEPARTMENT, KNOWN_CATEGORIES};
