use crate::i18n::Locale;
use crate::plugins::registry::EngineContext;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Runtime settings assembled from CLI flags and environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub download_dir: PathBuf,
    /// Explicit `--proxy`; when unset the environment is consulted per call.
    pub proxy: Option<String>,
    pub ytdlp_bin: PathBuf,
    pub locale: Locale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            proxy: None,
            ytdlp_bin: PathBuf::from("yt-dlp"),
            locale: Locale::default(),
        }
    }
}

impl Settings {
    pub fn engine_context(&self) -> EngineContext {
        EngineContext::new(self.download_dir.clone()).with_proxy(self.proxy.clone())
    }
}

impl EngineContext {
    /// Fill in the proxy from the environment when none was configured.
    pub fn resolved(&self) -> EngineContext {
        let mut ctx = self.clone();
        if ctx.proxy.is_none() {
            ctx.proxy = proxy_from_env();
        }
        ctx
    }
}

/// `HTTP_PROXY`, falling back to `HTTPS_PROXY`.
pub fn proxy_from_env() -> Option<String> {
    select_proxy(std::env::var("HTTP_PROXY").ok(), std::env::var("HTTPS_PROXY").ok())
}

pub fn select_proxy(http: Option<String>, https: Option<String>) -> Option<String> {
    let candidate = [http, https]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())?;

    match url::Url::parse(&candidate) {
        Ok(_) => Some(candidate),
        Err(e) => {
            warn!(proxy = %candidate, error = %e, "ignoring malformed proxy url");
            None
        }
    }
}
