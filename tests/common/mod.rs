#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use ytdlp_web::core::events::{EventSink, LogLevel, ProgressEvent};
use ytdlp_web::core::model::DownloadPlan;
use ytdlp_web::i18n::EN;
use ytdlp_web::plugins::registry::{EngineContext, MediaEngine};
use ytdlp_web::{snapshot, Dispatcher, JobId, JobRegistry, ProgressView};

#[derive(Clone)]
pub enum Step {
    Log(LogLevel, &'static str),
    Progress { downloaded: u64, total: Option<u64>, estimate: Option<u64> },
    Finished,
    ErrorEvent(Option<&'static str>),
    Wait(Arc<Notify>),
    Sleep(Duration),
}

#[derive(Clone)]
pub enum Outcome {
    Ok,
    Fail(&'static str),
    Panic,
}

/// Engine double that replays a fixed script for every job. File names are
/// derived from the last URL segment so jobs stay distinguishable.
pub struct ScriptedEngine {
    steps: Vec<Step>,
    outcome: Outcome,
    info: serde_json::Value,
    pub plans: Mutex<Vec<DownloadPlan>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>, outcome: Outcome) -> Self {
        Self {
            steps,
            outcome,
            info: serde_json::json!({}),
            plans: Mutex::new(vec![]),
        }
    }

    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }
}

pub fn filename_for(url: &str) -> String {
    format!("/downloads/{}.mp4", url.rsplit('/').next().unwrap_or(url))
}

#[async_trait]
impl MediaEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract_info(&self, url: &str, _ctx: &EngineContext) -> anyhow::Result<serde_json::Value> {
        if url.contains("broken") {
            anyhow::bail!("Unsupported URL: {}", url);
        }
        Ok(self.info.clone())
    }

    async fn download(&self, plan: &DownloadPlan, _ctx: &EngineContext, events: EventSink) -> anyhow::Result<()> {
        self.plans.lock().unwrap().push(plan.clone());
        let filename = filename_for(&plan.url);

        for step in &self.steps {
            match step {
                Step::Log(level, msg) => events.log(*level, *msg).await,
                Step::Progress { downloaded, total, estimate } => {
                    events
                        .progress(ProgressEvent::Downloading {
                            filename: filename.clone(),
                            downloaded_bytes: *downloaded,
                            total_bytes: *total,
                            total_bytes_estimate: *estimate,
                            speed: Some(1024.0),
                            eta: Some(1),
                        })
                        .await
                }
                Step::Finished => {
                    events
                        .progress(ProgressEvent::Finished { filename: Some(filename.clone()) })
                        .await
                }
                Step::ErrorEvent(msg) => {
                    events
                        .progress(ProgressEvent::Error { message: msg.map(str::to_string) })
                        .await
                }
                Step::Wait(gate) => gate.notified().await,
                Step::Sleep(d) => tokio::time::sleep(*d).await,
            }
        }

        match self.outcome {
            Outcome::Ok => Ok(()),
            Outcome::Fail(msg) => Err(anyhow::anyhow!(msg).context("yt-dlp download")),
            Outcome::Panic => panic!("engine exploded"),
        }
    }
}

pub fn dispatcher_with(engine: Arc<ScriptedEngine>) -> Dispatcher {
    Dispatcher::new(
        Arc::new(JobRegistry::new()),
        engine,
        EngineContext::new("/downloads"),
        &EN,
    )
}

pub async fn finished_view(dispatcher: &Dispatcher, id: JobId) -> ProgressView {
    dispatcher.wait_job(id).await;
    snapshot(dispatcher.registry(), id).await.expect("job exists")
}

/// Transfer of 1000 bytes in four steps, then the finished hook.
pub fn full_transfer() -> Vec<Step> {
    let mut steps: Vec<Step> = [0u64, 250, 500, 1000]
        .into_iter()
        .map(|d| Step::Progress { downloaded: d, total: Some(1000), estimate: None })
        .collect();
    steps.push(Step::Finished);
    steps
}
