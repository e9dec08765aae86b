use mongodb::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),
    #[error("Store rejected operation: {0}")]
    Operation(String),
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::Authentication { .. } => StoreError::Connection(err.to_string()),
            _ => StoreError::Operation(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Document {document_id} has an unexpected shape: {source}")]
    DataShape {
        document_id: String,
        #[source]
        source: bson::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid report row: {0}")]
    Decode(#[from] bson::de::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
