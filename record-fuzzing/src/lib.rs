// Medical record fuzzing engine
// Core library definition

pub mod constants;
pub mod error;
pub mod utils;

// Engine
pub mod config;
pub mod context;
pub mod document;
pub mod escalation;
pub mod operation_log;
pub mod oracle;
pub mod random;
pub mod registry;
pub mod slot;

pub mod generators;
pub mod mutators;
pub mod reporters;
pub mod runner;

// Re-exports for convenience
pub use config::{FuzzConfig, Intensity};
pub use context::FuzzerContext;
pub use document::DocumentMutator;
pub use error::FuzzError;
pub use escalation::{EscalationOutcome, EscalationStatus};
pub use mutators::{Mutator, ResourceMutator};
pub use oracle::ValidityOracle;
pub use runner::{FuzzRunner, RunOptions, RunSummary};

use log::info;

/// Initialize logging for the fuzzing process.
///
/// The level comes from the environment (see [`utils::get_log_level`]) and
/// can be refined through `RUST_LOG`. Should be called at the start of each
/// fuzzing binary.
pub fn init() {
    let level = utils::level_filter(utils::get_log_level());
    let initialized = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .is_ok();

    if initialized {
        info!("Fuzzing mode: {}", utils::get_fuzzing_mode());
    }
}
