use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfError {
    /// the tf binary exited unsuccessfully
    #[error("{message}")]
    Execution { message: String, code: Option<i32> },

    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tf output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("tf did not finish within {secs}s")]
    TimedOut { secs: u64 },

    /// workspace bootstrap failed; `step` names the last thing attempted
    #[error("workspace setup failed while {step}: {message}")]
    Workspace { step: &'static str, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TfError>;
