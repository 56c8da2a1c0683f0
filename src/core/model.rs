use crate::core::events::{LogLevel, ProgressEvent};
use crate::i18n::Messages;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type JobId = Uuid;

/// What a caller asks for when starting a job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_only: bool,
}

/// Browsers send `null` for unset fields; treat it like an absent one.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    pub fn with_format(mut self, format_id: impl Into<String>) -> Self {
        self.format_id = Some(format_id.into());
        self
    }

    pub fn audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    /// Turn the request into the engine-facing plan: trimmed URL plus the
    /// format selector and post-processing it implies.
    pub fn plan(&self) -> DownloadPlan {
        let url = self.url.trim().to_string();
        if self.audio_only {
            return DownloadPlan {
                url,
                format: "bestaudio/best".to_string(),
                extract_audio: Some(AudioExtraction::default()),
            };
        }

        let format = match self.format_id.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() && f != "best" => f.to_string(),
            _ => "bestvideo+bestaudio/best".to_string(),
        };
        DownloadPlan { url, format, extract_audio: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: String,
    pub quality_kbps: u32,
}

impl Default for AudioExtraction {
    fn default() -> Self {
        Self { codec: "mp3".to_string(), quality_kbps: 192 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub url: String,
    pub format: String,
    pub extract_audio: Option<AudioExtraction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Downloading,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Progress-driven transitions. Staying in the same non-terminal state is
    /// allowed so repeated events of one phase are accepted.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Completed | Error, _) => false,
            (_, Error) => true,
            (Starting, Downloading) => true,
            (Downloading, Downloading | Processing) => true,
            (Processing, Processing | Completed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one job. Written by its worker only, read by any poller.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub status: JobStatus,
    pub progress: f64,
    pub speed: f64,
    pub eta: u64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub filename: String,
    pub error: Option<String>,
    pub logs: Vec<String>,
    pending_error: Option<String>,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            status: JobStatus::Starting,
            progress: 0.0,
            speed: 0.0,
            eta: 0,
            downloaded_bytes: 0,
            total_bytes: 0,
            filename: String::new(),
            error: None,
            logs: Vec::new(),
            pending_error: None,
        }
    }
}

impl JobRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&mut self, next: JobStatus) -> bool {
        if self.status == next && !next.is_terminal() {
            return true;
        }
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    /// Apply one progress event. Returns false when the event was ignored
    /// because the current status does not allow it.
    pub fn apply_progress(&mut self, event: &ProgressEvent, messages: &Messages) -> bool {
        match event {
            ProgressEvent::Downloading {
                filename,
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed,
                eta,
            } => {
                if !self.enter(JobStatus::Downloading) {
                    return false;
                }
                let total = total_bytes
                    .filter(|t| *t > 0)
                    .or(total_bytes_estimate.filter(|t| *t > 0));

                self.filename = filename.clone();
                self.progress = match total {
                    Some(t) => percent(*downloaded_bytes, t),
                    None => 0.0,
                };
                self.speed = speed.filter(|s| s.is_finite()).unwrap_or(0.0).max(0.0);
                self.eta = eta.unwrap_or(0);
                self.downloaded_bytes = *downloaded_bytes;
                self.total_bytes = total.unwrap_or(0);
                true
            }
            ProgressEvent::Finished { filename } => {
                let filename = filename.as_ref().filter(|f| !f.is_empty());
                if !self.enter(JobStatus::Processing) {
                    // a source without download hooks still names its file
                    if let (Some(f), false) = (filename, self.status.is_terminal()) {
                        self.filename = f.clone();
                    }
                    return false;
                }
                self.progress = 100.0;
                if let Some(f) = filename {
                    self.filename = f.clone();
                }
                true
            }
            ProgressEvent::Error { message } => {
                let message = message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| self.pending_error.clone())
                    .unwrap_or_else(|| messages.download_failed.to_string());
                self.fail(message)
            }
        }
    }

    /// Append an engine log line. Never changes status.
    pub fn append_log(&mut self, level: LogLevel, line: &str, messages: &Messages) {
        match level {
            LogLevel::Debug => {
                if !line.starts_with("[debug] ") {
                    self.logs.push(line.to_string());
                }
            }
            LogLevel::Info => self.logs.push(line.to_string()),
            LogLevel::Warning => self.logs.push(format!("{}{}", messages.warning_marker, line)),
            LogLevel::Error => {
                self.logs.push(format!("{}{}", messages.error_marker, line));
                self.pending_error = Some(line.to_string());
            }
        }
    }

    /// Engine returned successfully.
    pub fn complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        true
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Error;
        self.error = Some(message.into());
        true
    }
}

/// `downloaded / total * 100`, clamped so a revised-down estimate cannot push
/// progress past 100.
pub fn percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((downloaded as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}
