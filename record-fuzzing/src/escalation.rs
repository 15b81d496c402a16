// record-fuzzing/src/escalation.rs
//! Fuzz-until-invalid driver.
//!
//! Mutates a value repeatedly, checking each result with a validity oracle.
//! Every round without a rejection raises the intensity of the active
//! configuration, up to a fixed number of rounds.

use crate::constants::{ATTEMPTS_PER_ROUND, ESCALATION_ROUNDS, ESCALATION_STEP};
use crate::context::FuzzerContext;
use crate::error::FuzzError;
use crate::mutators::Mutator;
use crate::oracle::ValidityOracle;
use log::{debug, info};
use record_types::EncodingFormat;
use std::fmt;

/// How an escalation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationStatus {
    /// The oracle rejected the final value
    Invalidated,
    /// The budget ran out while the value was still accepted
    Exhausted,
}

impl fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationStatus::Invalidated => write!(f, "invalidated"),
            EscalationStatus::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Result of [`fuzz_until_invalid`]
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationOutcome<T> {
    pub value: T,
    pub status: EscalationStatus,
    pub mutation_calls: u32,
    pub rounds: u32,
}

impl<T> EscalationOutcome<T> {
    pub fn is_invalid(&self) -> bool {
        self.status == EscalationStatus::Invalidated
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Mutate `value` until `oracle` rejects it or the escalation budget is spent.
///
/// The intensity active on entry is restored before returning, on success
/// and on error alike.
pub fn fuzz_until_invalid<T, M>(
    mutator: &M,
    ctx: &mut FuzzerContext,
    value: T,
    oracle: &dyn ValidityOracle<T>,
) -> Result<EscalationOutcome<T>, FuzzError>
where
    M: Mutator<T> + ?Sized,
{
    let entry = ctx.config().intensity();
    let result = escalate(mutator, ctx, value, oracle);
    ctx.apply_intensity(entry);
    result
}

fn escalate<T, M>(
    mutator: &M,
    ctx: &mut FuzzerContext,
    mut value: T,
    oracle: &dyn ValidityOracle<T>,
) -> Result<EscalationOutcome<T>, FuzzError>
where
    M: Mutator<T> + ?Sized,
{
    let mut rounds_left = ESCALATION_ROUNDS;
    let mut mutation_calls = 0;
    let mut rounds = 0;

    let valid = loop {
        rounds += 1;
        let mut attempts_left = ATTEMPTS_PER_ROUND;

        let valid = loop {
            value = mutator.mutate(ctx, value)?;
            mutation_calls += 1;
            let encoded = oracle.encode(&value, EncodingFormat::Json)?;
            let valid = oracle.is_valid(&encoded);
            attempts_left -= 1;
            if !valid || attempts_left == 0 {
                break valid;
            }
        };

        rounds_left -= 1;
        let raised = ctx.config().intensity().escalated(ESCALATION_STEP);
        ctx.apply_intensity(raised);
        debug!("{} escalated to {:?}", mutator.name(), raised);

        if !valid || rounds_left == 0 {
            break valid;
        }
    };

    let status = if valid {
        info!(
            "{} could not invalidate the value in {} mutations",
            mutator.name(),
            mutation_calls
        );
        EscalationStatus::Exhausted
    } else {
        EscalationStatus::Invalidated
    };

    Ok(EscalationOutcome {
        value,
        status,
        mutation_calls,
        rounds,
    })
}
