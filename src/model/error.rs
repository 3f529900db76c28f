use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("missing configuration: {0}")]
    Config(String),

    #[error("unauthorized, token rejected after reauthentication")]
    Unauthorized,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("service unavailable after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    #[error("listing path must be empty or end with '/': {0:?}")]
    InvalidPath(String),

    #[error("unexpected status {status}: {message}")]
    Protocol { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("{command} exited with status {code:?}")]
    Process { command: String, code: Option<i32> },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
