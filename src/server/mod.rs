//! HTTP surface: job dispatch and polling, metadata lookup and the download
//! folder, as JSON endpoints.

pub mod extract;
pub mod files;
pub mod handlers;

use crate::core::dispatcher::Dispatcher;
use crate::error::ServiceError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use files::DownloadFolder;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub folder: Arc<DownloadFolder>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, folder: DownloadFolder) -> Self {
        Self { dispatcher, folder: Arc::new(folder) }
    }
}

pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    // stored files are offered as downloads, not rendered inline
    let downloads = SetResponseHeader::overriding(
        ServeDir::new(state.folder.root()),
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment"),
    );

    let router = Router::new()
        .route("/api/info", post(handlers::get_info))
        .route("/api/download", post(handlers::start_download))
        .route("/api/progress/{task_id}", get(handlers::get_progress))
        .route("/api/downloads", get(handlers::list_downloads))
        .route("/api/delete/{filename}", delete(handlers::delete_file))
        .nest_service("/download", downloads)
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServiceError::JobNotFound(_) => (StatusCode::NOT_FOUND, "JOB_NOT_FOUND"),
            ServiceError::FileNotFound(_) => (StatusCode::NOT_FOUND, "FILE_NOT_FOUND"),
            ServiceError::Engine(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_ERROR"),
            ServiceError::Io(e) => {
                tracing::error!(error = %e, "io error while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR")
            }
        };

        let message = match &self {
            ServiceError::InvalidRequest(m) | ServiceError::Engine(m) => m.clone(),
            other => other.to_string(),
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}
