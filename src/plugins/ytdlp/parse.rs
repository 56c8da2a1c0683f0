//! Turning yt-dlp console output into engine events.
//!
//! Progress is requested through `--progress-template` so every progress
//! line is a marker followed by the progress dict as JSON. Everything else
//! is a log line; severity comes from yt-dlp's `ERROR:`/`WARNING:` prefixes.

use crate::core::events::{EngineEvent, LogLevel, ProgressEvent};
use serde::Deserialize;

pub const PROGRESS_MARKER: &str = "__ytdlp_web_progress__";

pub fn progress_template() -> String {
    format!("download:{}%(progress)j", PROGRESS_MARKER)
}

#[derive(Debug, Deserialize)]
struct RawProgress {
    status: String,
    filename: Option<String>,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
    error: Option<String>,
}

pub fn parse_progress(json: &str) -> Option<ProgressEvent> {
    let raw: RawProgress = serde_json::from_str(json.trim()).ok()?;
    let non_negative = |v: Option<f64>| v.filter(|b| b.is_finite() && *b >= 0.0).map(|b| b as u64);

    match raw.status.as_str() {
        "downloading" => Some(ProgressEvent::Downloading {
            filename: raw.filename.unwrap_or_default(),
            downloaded_bytes: non_negative(raw.downloaded_bytes).unwrap_or(0),
            total_bytes: non_negative(raw.total_bytes),
            total_bytes_estimate: non_negative(raw.total_bytes_estimate),
            speed: raw.speed,
            eta: non_negative(raw.eta),
        }),
        "finished" => Some(ProgressEvent::Finished { filename: raw.filename }),
        "error" => Some(ProgressEvent::Error { message: raw.error }),
        _ => None,
    }
}

pub fn classify_stdout(line: &str) -> Option<EngineEvent> {
    if let Some(json) = line.strip_prefix(PROGRESS_MARKER) {
        return parse_progress(json).map(EngineEvent::Progress);
    }
    if line.trim().is_empty() {
        return None;
    }
    Some(EngineEvent::Log { level: LogLevel::Info, message: line.to_string() })
}

pub fn classify_stderr(line: &str) -> Option<EngineEvent> {
    if line.trim().is_empty() {
        return None;
    }
    let (level, message) = if let Some(rest) = line.strip_prefix("ERROR: ") {
        (LogLevel::Error, rest)
    } else if let Some(rest) = line.strip_prefix("WARNING: ") {
        (LogLevel::Warning, rest)
    } else if line.starts_with("[debug] ") {
        (LogLevel::Debug, line)
    } else {
        (LogLevel::Info, line)
    };
    Some(EngineEvent::Log { level, message: message.to_string() })
}
