// record-fuzzing/src/generators/mod.rs
//! Baseline generators for fuzzing runs

use crate::error::FuzzError;
use log::info;
use record_types::{Document, RecordParser};
use std::fs;
use std::path::Path;

/// Generator trait for creating baseline inputs
pub trait Generator<T>: Send + Sync {
    /// Generate a new instance of T
    fn generate(&self) -> T;

    /// Generate a set of new instances of T
    fn generate_set(&self, count: usize) -> Vec<T> {
        (0..count).map(|_| self.generate()).collect()
    }
}

/// Hands out copies of one seed value
#[derive(Debug, Clone)]
pub struct SeedGenerator<T> {
    seed: T,
}

impl<T: Clone + Send + Sync> SeedGenerator<T> {
    pub fn new(seed: T) -> Self {
        Self { seed }
    }
}

impl SeedGenerator<Document> {
    /// Load a seed document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, FuzzError> {
        let text = fs::read_to_string(path)?;
        let document = RecordParser::new().decode(&text)?;
        info!(
            "Loaded seed document from {} ({} entries)",
            path.display(),
            document.entry_count()
        );
        Ok(Self::new(document))
    }
}

impl<T: Clone + Send + Sync> Generator<T> for SeedGenerator<T> {
    fn generate(&self) -> T {
        self.seed.clone()
    }
}
