use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One moment of a transfer as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        filename: String,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
        speed: Option<f64>,
        eta: Option<u64>,
    },
    Finished { filename: Option<String> },
    Error { message: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Log { level: LogLevel, message: String },
    Progress(ProgressEvent),
}

/// Sending half of a job's event channel, handed to the engine for the
/// duration of one download. Dropping it ends the worker's event loop.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: EngineEvent) {
        // receiver only goes away once the job is over
        let _ = self.tx.send(event).await;
    }

    pub async fn progress(&self, event: ProgressEvent) {
        self.emit(EngineEvent::Progress(event)).await;
    }

    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(EngineEvent::Log { level, message: message.into() }).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }
}
