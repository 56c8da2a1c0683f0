use crate::config::Settings;
use crate::core::events::EventSink;
use crate::core::model::DownloadPlan;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything an engine needs besides the plan itself.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub download_dir: PathBuf,
    pub output_template: String,
    pub proxy: Option<String>,
}

impl EngineContext {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            output_template: "%(title)s.%(ext)s".to_string(),
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn output_path_template(&self) -> PathBuf {
        self.download_dir.join(&self.output_template)
    }
}

/// The external media engine. Implementations report metadata as raw JSON
/// and stream download progress through the sink; returning `Ok` means the
/// download and any post-processing finished.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract_info(&self, url: &str, ctx: &EngineContext) -> anyhow::Result<serde_json::Value>;

    async fn download(&self, plan: &DownloadPlan, ctx: &EngineContext, events: EventSink) -> anyhow::Result<()>;
}

pub trait CliPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn augment_command(&self, cmd: Command) -> Command;
    fn apply_matches(&self, matches: &ArgMatches, settings: &mut Settings) -> anyhow::Result<()>;
}

pub struct PluginRegistry {
    cli_plugins: Vec<Box<dyn CliPlugin>>,
}

impl PluginRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self { cli_plugins: vec![] };
        reg.cli_plugins.push(Box::new(crate::plugins::ytdlp::cli::YtDlpCliPlugin::new()));
        reg
    }

    pub fn augment_command(&self, cmd: Command) -> Command {
        self.cli_plugins
            .iter()
            .fold(cmd, |c, p| p.augment_command(c))
    }

    pub fn apply_matches(&self, matches: &ArgMatches, settings: &mut Settings) -> anyhow::Result<()> {
        for p in &self.cli_plugins {
            tracing::debug!(plugin = p.name(), "applying cli options");
            p.apply_matches(matches, settings)?;
        }
        Ok(())
    }

    /// Build the engine selected by the settings.
    pub fn engine(&self, settings: &Settings) -> Arc<dyn MediaEngine> {
        Arc::new(crate::plugins::ytdlp::driver::YtDlpEngine::new(settings.ytdlp_bin.clone()))
    }
}
