use record_types::RecordError;
use thiserror::Error;

/// Errors that abort a fuzzing run.
///
/// Probabilistic misses (an unregistered mutator, an exhausted escalation
/// budget) are not errors; they are logged and the run continues.
#[derive(Error, Debug)]
pub enum FuzzError {
    /// A caller broke an operation's contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal state does not match what dispatch expected
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The configuration record could not be parsed
    #[error("Failed to parse fuzz configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The validator oracle could not encode a value
    #[error("Failed to encode value: {0}")]
    Encode(#[from] RecordError),

    /// Reading seeds or writing artifacts failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_error_display() {
        let errors = vec![
            (FuzzError::InvalidArgument("test".to_string()), "Invalid argument: test"),
            (FuzzError::IllegalState("test".to_string()), "Illegal state: test"),
            (
                FuzzError::Encode(RecordError::Malformed("bad id".to_string())),
                "Failed to encode value: Malformed document: bad id",
            ),
        ];

        for (error, expected_message) in errors {
            assert_eq!(error.to_string(), expected_message);
        }
    }
}
