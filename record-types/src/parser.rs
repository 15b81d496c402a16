//! Encoding and structural validation of record documents

use crate::error::RecordError;
use crate::model::Document;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Textual encodings a document can be rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingFormat {
    #[default]
    Json,
    PrettyJson,
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingFormat::Json => write!(f, "json"),
            EncodingFormat::PrettyJson => write!(f, "pretty-json"),
        }
    }
}

/// Parser for record documents.
///
/// A document is considered valid when it decodes into the typed model and
/// reports no structural issues.
#[derive(Debug, Clone, Default)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, document: &Document, format: EncodingFormat) -> Result<String, RecordError> {
        let encoded = match format {
            EncodingFormat::Json => serde_json::to_string(document)?,
            EncodingFormat::PrettyJson => serde_json::to_string_pretty(document)?,
        };
        Ok(encoded)
    }

    pub fn decode(&self, text: &str) -> Result<Document, RecordError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode and reject documents with structural issues
    pub fn decode_strict(&self, text: &str) -> Result<Document, RecordError> {
        let document = self.decode(text)?;
        let issues = document.structural_issues();
        if issues.is_empty() {
            Ok(document)
        } else {
            Err(RecordError::Malformed(issues.join("; ")))
        }
    }

    pub fn is_valid(&self, text: &str) -> bool {
        match self.decode_strict(text) {
            Ok(_) => true,
            Err(err) => {
                debug!("document rejected: {}", err);
                false
            }
        }
    }
}
