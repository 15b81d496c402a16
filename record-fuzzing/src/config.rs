// record-fuzzing/src/config.rs
//! Configuration of a fuzzing run

use crate::constants::{DEFAULT_ITERATIONS, DEFAULT_PERCENT};
use crate::error::FuzzError;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

fn default_percent() -> f64 {
    DEFAULT_PERCENT
}

/// Fuzzing configuration options
///
/// Percentages are expressed in the range 0-100. Values outside that range
/// are accepted and give degenerate but well-defined sampling behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzConfig {
    /// Name of the configuration, shown in logs
    #[serde(default)]
    pub name: String,
    /// Share of a mutator list drawn by each sampling pass
    #[serde(default = "default_percent")]
    pub used_percent_of_mutators: f64,
    /// Probability an entry or field is touched at all
    #[serde(default = "default_percent")]
    pub percent_of_all: f64,
    /// Probability used for per-part decisions inside a mutator
    #[serde(default = "default_percent")]
    pub percent_of_each: f64,
    /// Apply every mutator of a list instead of sampling
    #[serde(default)]
    pub use_all_mutators: bool,
    /// Iterations of a run; 0 selects the default
    #[serde(default)]
    pub iterations: u32,
    /// Free-form settings
    #[serde(default)]
    pub detail_setup: HashMap<String, String>,
    /// Persist per-iteration artifacts
    #[serde(default)]
    pub should_print_to_file: bool,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            used_percent_of_mutators: DEFAULT_PERCENT,
            percent_of_all: DEFAULT_PERCENT,
            percent_of_each: DEFAULT_PERCENT,
            use_all_mutators: false,
            iterations: DEFAULT_ITERATIONS,
            detail_setup: HashMap::new(),
            should_print_to_file: false,
        }
    }
}

impl FuzzConfig {
    /// Parse a serialized configuration record
    pub fn from_json(text: &str) -> Result<Self, FuzzError> {
        let config: FuzzConfig = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    /// Build a configuration with randomized knobs
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            name: "random".to_string(),
            used_percent_of_mutators: rng.gen_range(1.0..100.0),
            percent_of_all: rng.gen_range(0.5..50.0),
            percent_of_each: rng.gen_range(0.5..50.0),
            use_all_mutators: rng.gen_bool(0.1),
            iterations: rng.gen_range(1..=DEFAULT_ITERATIONS),
            detail_setup: HashMap::new(),
            should_print_to_file: false,
        }
    }

    /// Replace NaN percentages with the default
    pub fn normalized(mut self) -> Self {
        for (label, value) in [
            ("usedPercentOfMutators", &mut self.used_percent_of_mutators),
            ("percentOfAll", &mut self.percent_of_all),
            ("percentOfEach", &mut self.percent_of_each),
        ] {
            if value.is_nan() {
                info!("{} was not a number, set up default to {}%", label, DEFAULT_PERCENT);
                *value = DEFAULT_PERCENT;
            }
        }
        self
    }

    pub fn intensity(&self) -> Intensity {
        Intensity {
            percent_of_all: self.percent_of_all,
            percent_of_each: self.percent_of_each,
            used_percent_of_mutators: self.used_percent_of_mutators,
        }
    }

    pub fn set_intensity(&mut self, intensity: Intensity) {
        self.percent_of_all = intensity.percent_of_all;
        self.percent_of_each = intensity.percent_of_each;
        self.used_percent_of_mutators = intensity.used_percent_of_mutators;
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.detail_setup.get(key).map(String::as_str)
    }
}

impl fmt::Display for FuzzConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FuzzConfig(name={}, usedPercentOfMutators={}, percentOfAll={}, percentOfEach={}, useAllMutators={}, iterations={}, shouldPrintToFile={}, detailSetup={:?})",
            self.name,
            self.used_percent_of_mutators,
            self.percent_of_all,
            self.percent_of_each,
            self.use_all_mutators,
            self.iterations,
            self.should_print_to_file,
            self.detail_setup,
        )
    }
}

/// The three knobs the escalation driver raises between rounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intensity {
    pub percent_of_all: f64,
    pub percent_of_each: f64,
    pub used_percent_of_mutators: f64,
}

impl Intensity {
    /// Raise every knob by `step` absolute percentage points
    pub fn escalated(self, step: f64) -> Self {
        Self {
            percent_of_all: self.percent_of_all + step,
            percent_of_each: self.percent_of_each + step,
            used_percent_of_mutators: self.used_percent_of_mutators + step,
        }
    }
}
