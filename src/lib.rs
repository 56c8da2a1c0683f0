//! # ytdlp-web
//!
//! Background download jobs on top of yt-dlp with a polling-friendly view of
//! each job's progress, logs and outcome.
//!
//! - `core`: job registry, dispatcher, worker and progress reporter
//! - `plugins`: the media engine seam and its yt-dlp implementation
//! - `server`: axum HTTP endpoints and the download folder

pub mod config;
pub mod core;
pub mod error;
pub mod i18n;
pub mod plugins;
pub mod server;

pub use crate::core::dispatcher::Dispatcher;
pub use crate::core::model::{DownloadRequest, JobId, JobRecord, JobStatus};
pub use crate::core::reporter::{snapshot, ProgressView};
pub use crate::core::store::JobRegistry;
pub use error::{ServiceError, ServiceResult};
