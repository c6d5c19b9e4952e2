//! Submission sinks: where finalized complaints go
use async_trait::async_trait;
use civic_core::{CompletedComplaint, SinkError};
use tokio::sync::Mutex;
use tracing::info;

/// External destination that durably records a finalized complaint
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, complaint: &CompletedComplaint) -> Result<(), SinkError>;
}

/// In-memory sink keeping accepted complaints newest first
#[derive(Debug, Default)]
pub struct MemorySink {
    complaints: Mutex<Vec<CompletedComplaint>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn complaints(&self) -> Vec<CompletedComplaint> {
        self.complaints.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.complaints.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.complaints.lock().await.is_empty()
    }
}

#[async_trait]
impl SubmissionSink for MemorySink {
    async fn submit(&self, complaint: &CompletedComplaint) -> Result<(), SinkError> {
        let mut complaints = self.complaints.lock().await;
        if complaints.iter().any(|c| c.digest() == complaint.digest()) {
            return Err(SinkError::Rejected(format!("duplicate complaint {}", complaint.id())));
        }
        complaints.insert(0, complaint.clone());
        info!(id = %complaint.id(), stored = complaints.len(), "complaint stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civic_core::DraftRecord;
    use uuid::Uuid;

    fn complaint(text: &str) -> CompletedComplaint {
        let mut draft = DraftRecord::new();
        draft.description = text.to_string();
        CompletedComplaint::freeze(&draft, Uuid::new_v4(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_newest_first() {
        let sink = MemorySink::new();
        sink.submit(&complaint("first")).await.unwrap();
        sink.submit(&complaint("second")).await.unwrap();

        let stored = sink.complaints().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].description(), "second");
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let sink = MemorySink::new();
        let c = complaint("same");
        sink.submit(&c).await.unwrap();

        let err = sink.submit(&c).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected(_)));
        assert_eq!(sink.len().await, 1);
    }
}
