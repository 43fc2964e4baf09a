use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ProcessingStatus;

/// Tracks one queued PDF upload through extraction, embedding and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    id: Uuid,
    filename: String,
    status: ProcessingStatus,
    progress: f32, // 0.0 to 1.0
    message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    result_summary: Option<JobResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub pages: i32,
    pub text_chunks: i32,
    pub code_chunks: i32,
    pub embedded: i32,
    pub missing_embeddings: i32,
    pub processing_time_ms: u64,
}

impl ProcessingJob {
    pub fn new_upload(filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            status: ProcessingStatus::Queued,
            progress: 0.0,
            message: Some("Queued".to_string()),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            result_summary: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result_summary(&self) -> Option<&JobResult> {
        self.result_summary.as_ref()
    }

    pub fn start_processing(&mut self) -> Result<(), String> {
        if !self.status.can_transition_to(ProcessingStatus::Processing) {
            return Err(format!("Job is not queued: {}", self.status));
        }

        self.status = ProcessingStatus::Processing;
        self.started_at = Some(Utc::now());
        self.progress = 0.1;
        self.message = Some("Extracting text".to_string());
        Ok(())
    }

    pub fn complete_processing(&mut self, result: JobResult) -> Result<(), String> {
        if !self.status.can_transition_to(ProcessingStatus::Completed) {
            return Err("Job is not in processing state".to_string());
        }

        self.status = ProcessingStatus::Completed;
        self.progress = 1.0;
        self.completed_at = Some(Utc::now());
        self.message = Some("Completed".to_string());
        self.result_summary = Some(result);
        Ok(())
    }

    pub fn fail_processing(&mut self, error: String) -> Result<(), String> {
        if !self.status.can_transition_to(ProcessingStatus::Failed) {
            return Err(format!("Job is already {}", self.status));
        }

        self.status = ProcessingStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.message = Some("Failed".to_string());
        self.error_message = Some(error);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) if self.status.is_processing() => Some(Utc::now() - start),
            _ => None,
        }
    }
}
