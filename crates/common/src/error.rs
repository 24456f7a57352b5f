use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed numeric field '{field}' = '{value}' at datetime {datetime}")]
    Format {
        field: &'static str,
        value: String,
        datetime: i64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used when logging fatal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Channel,
    Store,
    Format,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Channel(_) | Error::Json(_) => ErrorKind::Channel,
            Error::Store(_) | Error::Database(_) | Error::Io(_) => ErrorKind::Store,
            Error::Format { .. } => ErrorKind::Format,
            Error::Config(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
