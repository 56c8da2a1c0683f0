//! Metadata lookup: the engine does the extraction, this module only picks
//! the fields the front end shows and fills in defaults for missing ones.

use crate::error::{ServiceError, ServiceResult};
use crate::i18n::Messages;
use crate::plugins::registry::{EngineContext, MediaEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DESCRIPTION_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub uploader: String,
    pub view_count: u64,
    pub description: String,
    pub formats: Vec<FormatInfo>,
    pub webpage_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub filesize: u64,
    pub vcodec: String,
    pub acodec: String,
    pub format_note: String,
    pub fps: f64,
    pub tbr: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    view_count: Option<f64>,
    description: Option<String>,
    #[serde(default)]
    formats: Option<Vec<RawFormat>>,
    webpage_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    resolution: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    format_note: Option<String>,
    fps: Option<f64>,
    tbr: Option<f64>,
}

impl MediaInfo {
    pub fn from_json(raw: serde_json::Value, requested_url: &str) -> ServiceResult<Self> {
        let raw: RawInfo = serde_json::from_value(raw)
            .map_err(|e| ServiceError::Engine(format!("unexpected metadata shape: {e}")))?;

        let formats = raw
            .formats
            .unwrap_or_default()
            .into_iter()
            .map(FormatInfo::from_raw)
            .collect();

        Ok(Self {
            title: raw.title.unwrap_or_else(|| "Unknown title".to_string()),
            thumbnail: raw.thumbnail.unwrap_or_default(),
            duration: raw.duration.unwrap_or(0.0),
            uploader: raw.uploader.unwrap_or_else(|| "Unknown".to_string()),
            view_count: raw.view_count.map(|v| v.max(0.0) as u64).unwrap_or(0),
            description: raw
                .description
                .map(|d| d.chars().take(DESCRIPTION_LIMIT).collect())
                .unwrap_or_default(),
            formats,
            webpage_url: raw.webpage_url.unwrap_or_else(|| requested_url.to_string()),
        })
    }
}

impl FormatInfo {
    fn from_raw(f: RawFormat) -> Self {
        let size = f.filesize.filter(|s| *s > 0.0).or(f.filesize_approx).unwrap_or(0.0);
        Self {
            format_id: f.format_id.unwrap_or_default(),
            ext: f.ext.unwrap_or_default(),
            resolution: f.resolution.unwrap_or_else(|| "audio only".to_string()),
            filesize: size.max(0.0) as u64,
            vcodec: f.vcodec.unwrap_or_else(|| "none".to_string()),
            acodec: f.acodec.unwrap_or_else(|| "none".to_string()),
            format_note: f.format_note.unwrap_or_default(),
            fps: f.fps.unwrap_or(0.0),
            tbr: f.tbr.unwrap_or(0.0),
        }
    }
}

pub async fn fetch_info(
    engine: &dyn MediaEngine,
    ctx: &EngineContext,
    url: &str,
    messages: &Messages,
) -> ServiceResult<MediaInfo> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ServiceError::InvalidRequest(messages.url_required.to_string()));
    }

    debug!(engine = engine.name(), url = %url, "extracting metadata");
    let raw = engine
        .extract_info(url, &ctx.resolved())
        .await
        .map_err(ServiceError::engine)?;
    MediaInfo::from_json(raw, url)
}
