use thiserror::Error;

/// Failure raised by the email parser. Unlike the task parser, which folds
/// every problem into an invalid command, the email side reports unknown
/// verbs and bad indices through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EmailParseError(pub String);

impl EmailParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Problems found while splitting a raw line into body and options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("Please enter a value after option '-{0}'")]
    EmptyOptionValue(String),
    #[error("Option '-{0}' accepts only one value")]
    RepeatedOption(String),
}

/// Read/write failures at the storage boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed data file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid save file at line {line}: {record}")]
    CorruptRecord { line: usize, record: String },
}

/// Failures while pulling mail from the network collaborator.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("No mail source is configured")]
    NotConfigured,
    #[error("Credentials unavailable: {0}")]
    Credentials(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Mail server error: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
