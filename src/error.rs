use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipstormError {
    /// A required batch input (prefix, hook, voice-over) is absent.
    /// The only error that aborts a whole batch before any job starts.
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClipstormError>;
