// record-fuzzing/src/constants.rs
//! Shared constants for the fuzzing engine

/// Percentage used when a configured percentage is unset or NaN
pub const DEFAULT_PERCENT: f64 = 5.0;

/// Iterations of a run when the configuration asks for zero
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Escalation rounds of the fuzz-until-invalid driver
pub const ESCALATION_ROUNDS: u32 = 5;

/// Mutation attempts per escalation round
pub const ATTEMPTS_PER_ROUND: u32 = 5;

/// Absolute percentage points added to each intensity knob per round
pub const ESCALATION_STEP: f64 = 1.0;

/// Upper bound (in ms since the epoch) of a random date with skew 1
pub const DATE_SCALE_MILLIS: i64 = 900_000_000_000;

/// Date skew used when none is given; most dates land after 2000
pub const DEFAULT_DATE_SKEW: i64 = 10;

/// Default artifact directory
pub const DEFAULT_ARTIFACT_DIR: &str = "./fuzzing-artifacts";

/// Key in `detailSetup` overriding the artifact directory
pub const DETAIL_OUTPUT_DIR: &str = "outputDir";

/// Log levels
pub mod log_levels {
    /// No logging
    pub const NONE: u8 = 0;
    /// Error logging only
    pub const ERROR: u8 = 1;
    /// Warning and error logging
    pub const WARN: u8 = 2;
    /// Info, warning, and error logging
    pub const INFO: u8 = 3;
    /// Debug and above logging
    pub const DEBUG: u8 = 4;
    /// Trace and above logging (most verbose)
    pub const TRACE: u8 = 5;
}

/// Fuzzing modes
pub mod modes {
    /// Standard fuzzing mode
    pub const STANDARD: &str = "standard";
    /// CI mode (errors only)
    pub const CI: &str = "ci";
    /// Debug mode (extra logging)
    pub const DEBUG: &str = "debug";
}

/// Environment variables read by the engine
pub mod env_vars {
    pub const MODE: &str = "RECORD_FUZZING_MODE";
    pub const LOG_LEVEL: &str = "RECORD_FUZZING_LOG_LEVEL";
    pub const OUTPUT_DIR: &str = "RECORD_FUZZING_OUTPUT_DIR";
}
