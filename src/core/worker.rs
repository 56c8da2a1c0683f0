use crate::core::events::{EngineEvent, EventSink};
use crate::core::model::{DownloadPlan, JobId};
use crate::core::store::JobRegistry;
use crate::i18n::Messages;
use crate::plugins::registry::{EngineContext, MediaEngine};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capacity of the engine -> worker event channel. A full channel makes the
/// engine wait instead of dropping updates.
pub const EVENT_BUFFER: usize = 256;

/// Drives a single job from `starting` to a terminal status.
pub struct Worker {
    job_id: JobId,
    registry: Arc<JobRegistry>,
    engine: Arc<dyn MediaEngine>,
    ctx: EngineContext,
    messages: &'static Messages,
}

impl Worker {
    pub fn new(
        job_id: JobId,
        registry: Arc<JobRegistry>,
        engine: Arc<dyn MediaEngine>,
        ctx: EngineContext,
        messages: &'static Messages,
    ) -> Self {
        Self { job_id, registry, engine, ctx, messages }
    }

    pub async fn run(self, plan: DownloadPlan) {
        info!(job_id = %self.job_id, engine = self.engine.name(), url = %plan.url, format = %plan.format, "job started");

        let (sink, mut rx) = EventSink::channel(EVENT_BUFFER);
        let download = self.engine.download(&plan, &self.ctx, sink);
        let consume = async {
            while let Some(event) = rx.recv().await {
                self.apply(event).await;
            }
        };

        // the sink is owned by the download future, so `consume` drains every
        // event before the final status below is written
        let (result, ()) = tokio::join!(download, consume);

        match result {
            Ok(()) => {
                self.registry.mutate(self.job_id, |r| r.complete()).await;
                info!(job_id = %self.job_id, "job completed");
            }
            Err(e) => {
                let message = format!("{:#}", e);
                let recorded = self.registry.mutate(self.job_id, |r| r.fail(message.clone())).await;
                warn!(job_id = %self.job_id, error = %message, recorded = ?recorded, "job failed");
            }
        }
    }

    async fn apply(&self, event: EngineEvent) {
        let messages = self.messages;
        let applied = match &event {
            EngineEvent::Log { level, message } => self
                .registry
                .mutate(self.job_id, |r| r.append_log(*level, message, messages))
                .await
                .map(|_| true),
            EngineEvent::Progress(progress) => {
                self.registry
                    .mutate(self.job_id, |r| r.apply_progress(progress, messages))
                    .await
            }
        };

        match applied {
            None => debug!(job_id = %self.job_id, "record gone, dropping event"),
            Some(false) => debug!(job_id = %self.job_id, event = ?event, "event ignored in current status"),
            Some(true) => {}
        }
    }
}
