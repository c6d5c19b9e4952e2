//! Session Context: identity and metadata of one reporting session
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    pub engine_version: String,
    pub metadata: HashMap<String, Value>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            trace_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            engine_version: crate::CIVIC_VERSION.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
