use crate::core::model::{DownloadRequest, JobId};
use crate::core::store::JobRegistry;
use crate::core::worker::Worker;
use crate::error::{ServiceError, ServiceResult};
use crate::i18n::Messages;
use crate::plugins::registry::{EngineContext, MediaEngine};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Accepts download requests and runs each one on its own task.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    engine: Arc<dyn MediaEngine>,
    ctx: EngineContext,
    messages: &'static Messages,
    workers: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        engine: Arc<dyn MediaEngine>,
        ctx: EngineContext,
        messages: &'static Messages,
    ) -> Self {
        Self {
            registry,
            engine,
            ctx,
            messages,
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn messages(&self) -> &'static Messages {
        self.messages
    }

    /// Create a job and start its worker. Returns as soon as the worker task
    /// is spawned; the outcome is only observable by polling.
    pub async fn dispatch(&self, request: DownloadRequest) -> ServiceResult<JobId> {
        if request.url.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(self.messages.url_required.to_string()));
        }

        let plan = request.plan();
        let job_id = self.registry.create().await;
        let worker = Worker::new(
            job_id,
            self.registry.clone(),
            self.engine.clone(),
            self.ctx.resolved(),
            self.messages,
        );

        let registry = self.registry.clone();
        let crashed = self.messages.worker_crashed;
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(worker.run(plan)).catch_unwind().await;
            if let Err(panic) = outcome {
                let message = format!("{}: {}", crashed, panic_message(panic.as_ref()));
                error!(job_id = %job_id, error = %message, "worker panicked");
                registry.mutate(job_id, |r| r.fail(message)).await;
            }
        });

        {
            let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            workers.retain(|_, h| !h.is_finished());
            workers.insert(job_id, handle);
        }

        info!(job_id = %job_id, url = %request.url.trim(), "job dispatched");
        Ok(job_id)
    }

    /// Wait for a job's worker to exit. Returns immediately for unknown or
    /// already reaped jobs.
    pub async fn wait_job(&self, job_id: JobId) {
        let handle = {
            let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            workers.remove(&job_id)
        };
        if let Some(h) = handle {
            let _ = h.await;
        }
    }

    pub fn active_workers(&self) -> usize {
        let workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        workers.values().filter(|h| !h.is_finished()).count()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
