use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::info::{fetch_info, MediaInfo};
use crate::core::model::DownloadRequest;
use crate::core::reporter::{snapshot, ProgressView};
use crate::error::{ServiceError, ServiceResult};
use crate::server::extract::JsonBody;
use crate::server::files::StoredFile;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(default, deserialize_with = "crate::core::model::null_as_default")]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadStarted {
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

// POST /api/info
pub async fn get_info(State(state): State<AppState>, JsonBody(req): JsonBody<InfoRequest>) -> ServiceResult<Json<MediaInfo>> {
    let d = &state.dispatcher;
    let info = fetch_info(d.engine().as_ref(), d.context(), &req.url, d.messages()).await?;
    Ok(Json(info))
}

// POST /api/download
pub async fn start_download(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DownloadRequest>,
) -> ServiceResult<Json<DownloadStarted>> {
    let task_id = state.dispatcher.dispatch(req).await?;
    Ok(Json(DownloadStarted { task_id }))
}

// GET /api/progress/{task_id}
pub async fn get_progress(State(state): State<AppState>, Path(task_id): Path<String>) -> ServiceResult<Json<ProgressView>> {
    let id = Uuid::parse_str(&task_id).map_err(|_| ServiceError::JobNotFound(task_id.clone()))?;
    let view = snapshot(state.dispatcher.registry(), id).await?;
    Ok(Json(view))
}

// GET /api/downloads
pub async fn list_downloads(State(state): State<AppState>) -> ServiceResult<Json<Vec<StoredFile>>> {
    Ok(Json(state.folder.list().await?))
}

// DELETE /api/delete/{filename}
pub async fn delete_file(State(state): State<AppState>, Path(filename): Path<String>) -> ServiceResult<Json<Deleted>> {
    state.folder.delete(&filename).await?;
    Ok(Json(Deleted { success: true }))
}
