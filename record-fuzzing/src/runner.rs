// record-fuzzing/src/runner.rs
//! Iterate / validate / persist loop of a fuzzing run

use crate::constants::{DEFAULT_ITERATIONS, DETAIL_OUTPUT_DIR};
use crate::context::FuzzerContext;
use crate::document::DocumentMutator;
use crate::error::FuzzError;
use crate::escalation::EscalationStatus;
use crate::mutators::{Mutator, ResourceMutator};
use crate::operation_log::OperationEntry;
use crate::oracle::ValidityOracle;
use crate::utils;
use log::{error, info, warn};
use record_types::{Document, EncodingFormat};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Options of a run that are not part of the fuzz configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Artifact directory; overrides `detailSetup["outputDir"]`
    pub output_dir: Option<PathBuf>,
    /// Escalate each iteration until the oracle rejects the document
    pub until_invalid: bool,
}

/// Result of one iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: u32,
    pub valid_before: bool,
    pub valid_after: bool,
    pub escalation: Option<EscalationStatus>,
    pub operations: usize,
    pub artifacts: Vec<PathBuf>,
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub config_name: String,
    pub reports: Vec<IterationReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn iterations(&self) -> usize {
        self.reports.len()
    }

    pub fn valid_after(&self) -> usize {
        self.reports.iter().filter(|report| report.valid_after).count()
    }

    pub fn invalid_after(&self) -> usize {
        self.iterations() - self.valid_after()
    }

    pub fn exhausted(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.escalation == Some(EscalationStatus::Exhausted))
            .count()
    }
}

/// Drives a document mutator against an oracle for a number of iterations
pub struct FuzzRunner<O: ValidityOracle<Document>> {
    context: FuzzerContext,
    mutator: DocumentMutator,
    oracle: O,
    options: RunOptions,
}

impl<O: ValidityOracle<Document>> FuzzRunner<O> {
    pub fn new(context: FuzzerContext, mutator: DocumentMutator, oracle: O, options: RunOptions) -> Self {
        Self {
            context,
            mutator,
            oracle,
            options,
        }
    }

    pub fn context(&self) -> &FuzzerContext {
        &self.context
    }

    /// Run every iteration, starting each from `seed` or from a generated baseline.
    ///
    /// The first error aborts the run; its log is persisted when artifacts
    /// are enabled.
    pub fn run(&mut self, seed: Option<&Document>) -> Result<RunSummary, FuzzError> {
        let iterations = match self.context.config().iterations {
            0 => DEFAULT_ITERATIONS,
            n => n,
        };
        let output_dir = if self.context.config().should_print_to_file {
            Some(self.resolve_output_dir()?)
        } else {
            None
        };

        info!(
            "Starting run '{}' with {} iterations",
            self.context.config().name,
            iterations
        );
        let start = Instant::now();
        let mut reports = Vec::with_capacity(iterations as usize);

        for iteration in 0..iterations {
            match self.run_iteration(iteration, seed, output_dir.as_deref()) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!("Iteration {} failed: {}", iteration, err);
                    if let Some(dir) = output_dir.as_deref() {
                        self.persist_failure(dir, iteration, &err);
                    }
                    return Err(err);
                }
            }
        }

        Ok(RunSummary {
            config_name: self.context.config().name.clone(),
            reports,
            elapsed: start.elapsed(),
        })
    }

    fn resolve_output_dir(&self) -> Result<PathBuf, FuzzError> {
        let explicit = self
            .options
            .output_dir
            .clone()
            .or_else(|| self.context.config().detail(DETAIL_OUTPUT_DIR).map(PathBuf::from));
        Ok(utils::get_output_dir(explicit.as_deref())?)
    }

    fn run_iteration(
        &mut self,
        iteration: u32,
        seed: Option<&Document>,
        output_dir: Option<&Path>,
    ) -> Result<IterationReport, FuzzError> {
        self.context.clear_operation_logs();
        self.context.reset_intensity();
        let config_line = self.context.config().to_string();
        self.context
            .add_log(OperationEntry::event(format!("Fuzz config: {}", config_line)));

        let original = match seed {
            Some(document) => document.clone(),
            None => self.mutator.generate_random(&mut self.context)?,
        };
        let original_text = self.oracle.encode(&original, EncodingFormat::PrettyJson)?;
        let valid_before = self.oracle.is_valid(&original_text);

        let (fuzzed, escalation) = if self.options.until_invalid {
            let outcome = self
                .mutator
                .fuzz_til_invalid(&mut self.context, original, &self.oracle)?;
            let status = outcome.status;
            (outcome.into_value(), Some(status))
        } else {
            (self.mutator.mutate(&mut self.context, original)?, None)
        };
        let fuzzed_text = self.oracle.encode(&fuzzed, EncodingFormat::PrettyJson)?;
        let valid_after = self.oracle.is_valid(&fuzzed_text);

        info!(
            "Iteration {}: valid before {}, valid after {}, {} operations",
            iteration,
            valid_before,
            valid_after,
            self.context.operation_log().len()
        );

        let mut artifacts = Vec::new();
        if let Some(dir) = output_dir {
            let files = [
                (utils::run_artifact_name(iteration, "fuzzedDocument", Some(valid_after), "json"), fuzzed_text),
                (utils::run_artifact_name(iteration, "originalDocument", Some(valid_before), "json"), original_text),
                (utils::run_artifact_name(iteration, "fuzzLog", None, "txt"), self.context.operation_log().render()),
            ];
            for (name, contents) in files {
                artifacts.push(utils::write_artifact(dir, &name, &contents)?);
            }
        }

        Ok(IterationReport {
            iteration,
            valid_before,
            valid_after,
            escalation,
            operations: self.context.operation_log().len(),
            artifacts,
        })
    }

    fn persist_failure(&self, dir: &Path, iteration: u32, err: &FuzzError) {
        let contents = format!("{}\n\n{}", err, self.context.operation_log().render());
        let name = utils::run_artifact_name(iteration, "error", None, "txt");
        if let Err(write_err) = utils::write_artifact(dir, &name, &contents) {
            warn!("Could not persist failure of iteration {}: {}", iteration, write_err);
        }
    }
}
