// record-fuzzing/src/oracle.rs
//! Encode-and-validate seam used to judge fuzzed values

use crate::error::FuzzError;
use record_types::{Document, EncodingFormat, RecordParser};

/// External yes/no validity check for values of type `T`
pub trait ValidityOracle<T> {
    /// Render `value` in the given textual format
    fn encode(&self, value: &T, format: EncodingFormat) -> Result<String, FuzzError>;

    /// Whether `encoded` is accepted
    fn is_valid(&self, encoded: &str) -> bool;
}

impl ValidityOracle<Document> for RecordParser {
    fn encode(&self, value: &Document, format: EncodingFormat) -> Result<String, FuzzError> {
        Ok(RecordParser::encode(self, value, format)?)
    }

    fn is_valid(&self, encoded: &str) -> bool {
        RecordParser::is_valid(self, encoded)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use record_types::{Element, Patient};

    #[test]
    fn test_record_parser_oracle() {
        let oracle: &dyn ValidityOracle<Document> = &RecordParser::new();
        let mut document = Document::new().with_entry(Element::Patient(Patient {
            id: Some("p-1".to_string()),
            ..Default::default()
        }));

        let encoded = oracle.encode(&document, EncodingFormat::Json).unwrap();
        assert!(oracle.is_valid(&encoded));

        document.language = Some("not a tag".to_string());
        let encoded = oracle.encode(&document, EncodingFormat::PrettyJson).unwrap();
        assert!(!oracle.is_valid(&encoded));
    }
}
