use crate::core::model::{JobId, JobRecord, JobStatus};
use crate::core::store::JobRegistry;
use crate::error::{ServiceError, ServiceResult};
use serde::Serialize;
use std::path::Path;

/// How many log lines a snapshot carries.
pub const LOG_TAIL: usize = 10;

/// Polling view of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub status: JobStatus,
    pub progress: f64,
    pub speed: f64,
    pub eta: u64,
    #[serde(rename = "downloaded")]
    pub downloaded_bytes: u64,
    #[serde(rename = "total")]
    pub total_bytes: u64,
    pub filename: String,
    pub error: Option<String>,
    pub logs: Vec<String>,
}

impl ProgressView {
    pub fn from_record(record: &JobRecord) -> Self {
        let tail_start = record.logs.len().saturating_sub(LOG_TAIL);
        Self {
            status: record.status,
            progress: round2(record.progress),
            speed: record.speed,
            eta: record.eta,
            downloaded_bytes: record.downloaded_bytes,
            total_bytes: record.total_bytes,
            filename: basename(&record.filename),
            error: record.error.clone(),
            logs: record.logs[tail_start..].to_vec(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

pub async fn snapshot(registry: &JobRegistry, job_id: JobId) -> ServiceResult<ProgressView> {
    registry
        .view(job_id, ProgressView::from_record)
        .await
        .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn basename(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
