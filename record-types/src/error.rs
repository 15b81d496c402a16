use thiserror::Error;

/// Errors raised while encoding or decoding record documents
#[derive(Error, Debug)]
pub enum RecordError {
    /// The document could not be (de)serialized
    #[error("Failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document decoded but is not structurally well formed
    #[error("Malformed document: {0}")]
    Malformed(String),
}
