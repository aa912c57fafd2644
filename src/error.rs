use thiserror::Error;

/// Main error type for RegAssist
#[derive(Error, Debug)]
pub enum RegassistError {
    /// Audit database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding API errors
    #[error("Embedding API error: {0}")]
    Embedding(String),

    /// Chat completion API errors
    #[error("Generation API error: {0}")]
    Generation(String),

    /// Evidence retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using RegassistError
pub type Result<T> = std::result::Result<T, RegassistError>;
