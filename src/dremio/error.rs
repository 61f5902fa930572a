use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while taking a Dremio snapshot
#[derive(Debug, Error)]
pub enum DremioError {
    /// Invalid setting value (unparseable flag, empty dataset path, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required keys absent from the properties file, one message line per key
    #[error("{}", missing_properties_message(.0))]
    MissingProperties(Vec<String>),

    /// Properties file does not exist
    #[error("could not find required property file {}", .0.display())]
    PropertiesNotFound(PathBuf),

    /// Reading or writing the properties file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure (connection refused, TLS, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected, or a freshly issued token rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Unexpected HTTP status for a request
    #[error("attempt to {action} failed. status code {status}")]
    Status { action: String, status: u16 },

    /// Response missing a field the server contract requires
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// No catalog entry matched a path prefix
    #[error("could not find catalog entry {0}")]
    CatalogPathNotFound(String),

    /// Terminal catalog entry exists but is not a dataset
    #[error("{path} is not of type dataset : entityType is {entity_type}")]
    NotADataset { path: String, entity_type: String },

    /// Job reached CANCELED or FAILED
    #[error("job {job_id} ended in state {state} for sql {sql}. error message was : {message}")]
    JobFailed {
        job_id: String,
        sql: String,
        state: String,
        message: String,
    },

    /// Poll budget exhausted before the job reached a terminal state
    #[error("maximum wait time exceeded after {polls} polls and job {job_id} had not completed for sql {sql} (last state {last_state})")]
    JobTimeout {
        job_id: String,
        sql: String,
        polls: u32,
        last_state: String,
    },

    /// Collected rows disagree with the job's declared row count
    #[error("completed job {job_id} has {expected} rows, but obtained results have only {actual} records")]
    RowCountMismatch {
        job_id: String,
        expected: u64,
        actual: u64,
    },

    /// A record lacks one of the dataset's fields
    #[error("record {record} has no value for field '{field}'")]
    MissingField { record: usize, field: String },
}

fn missing_properties_message(keys: &[String]) -> String {
    keys.iter()
        .map(|key| format!("property '{}' is required but missing from the properties file.", key))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Type alias for Results using DremioError
pub type Result<T> = std::result::Result<T, DremioError>;
