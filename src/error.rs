use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Flatten an engine failure into its full context chain.
    pub fn engine(err: anyhow::Error) -> Self {
        Self::Engine(format!("{:#}", err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
