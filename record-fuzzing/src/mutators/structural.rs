// record-fuzzing/src/mutators/structural.rs
//! Mutators for sub-elements nested inside datatypes

use crate::context::FuzzerContext;
use crate::error::FuzzError;
use crate::mutators::{apply_ops, FieldOp, Mutator};
use crate::operation_log::{describe, OperationEntry};
use rand::Rng;
use record_types::TimingRepeat;

/// Mutator for the repeat rule of a dosage timing
pub struct TimingRepeatMutator;

const TIMING_REPEAT_OPS: [FieldOp<TimingRepeat>; 4] = [
    |ctx, v| ctx.fuzz_int("TimingRepeat.count", &mut v.count),
    |ctx, v| ctx.fuzz_int("TimingRepeat.frequency", &mut v.frequency),
    fuzz_period,
    |ctx, v| ctx.fuzz_enum("TimingRepeat.periodUnit", &mut v.period_unit),
];

/// Periods are positive; zero and negative values are the interesting ones
fn fuzz_period(ctx: &mut FuzzerContext, value: &mut TimingRepeat) -> Result<(), FuzzError> {
    let before = value.period;
    let current = before.unwrap_or(1);
    value.period = Some(match ctx.random().bounded_index(3) {
        0 => 0,
        1 => -current.max(1),
        _ => ctx.random().bounded_long(i64::MAX),
    });
    ctx.add_log(OperationEntry::new(
        "Mutate TimingRepeat.period",
        describe(&before),
        describe(&value.period),
    ));
    Ok(())
}

impl Mutator<TimingRepeat> for TimingRepeatMutator {
    fn name(&self) -> &str {
        "TimingRepeatMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: TimingRepeat) -> Result<TimingRepeat, FuzzError> {
        apply_ops(ctx, &TIMING_REPEAT_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<TimingRepeat, FuzzError> {
        let period_unit = ctx.random().uniform_enum(&[])?;
        let rng = ctx.random().rng_mut();
        Ok(TimingRepeat {
            count: Some(rng.gen_range(1..=10)),
            frequency: Some(rng.gen_range(1..=4)),
            period: Some(rng.gen_range(1..=24)),
            period_unit: Some(period_unit),
        })
    }
}
