// record-fuzzing/src/mutators/mod.rs
//! Mutator contracts and the built-in mutators

pub mod datatypes;
pub mod resources;
pub mod scalar;
pub mod structural;

use crate::context::FuzzerContext;
use crate::error::FuzzError;
use crate::escalation::{self, EscalationOutcome};
use crate::operation_log::OperationEntry;
use crate::oracle::ValidityOracle;
use crate::slot::FieldSlot;
use log::debug;

/// A single mutation step applied to a value in place
pub type FieldOp<T> = fn(&mut FuzzerContext, &mut T) -> Result<(), FuzzError>;

/// Trait for mutating values of one element kind
pub trait Mutator<T>: Send + Sync {
    /// Name shown in logs
    fn name(&self) -> &str;

    /// Mutate the given value
    fn mutate(&self, ctx: &mut FuzzerContext, value: T) -> Result<T, FuzzError>;

    /// Generate a fresh random value
    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<T, FuzzError>;

    /// Mutate the value held by `slot`.
    ///
    /// With probability `percentOfAll` the value is replaced by a fresh one;
    /// otherwise a present value is mutated and an absent one left absent.
    fn mutate_field(&self, ctx: &mut FuzzerContext, slot: &mut FieldSlot<'_, T>) -> Result<(), FuzzError> {
        if ctx.should_fuzz() {
            let fresh = self.generate_random(ctx)?;
            let replaced = slot.replace(fresh).is_some();
            debug!("{} fabricated a value (replaced existing: {})", self.name(), replaced);
            ctx.add_log(OperationEntry::event(format!("{}: fabricate", self.name())));
        } else if let Some(value) = slot.take() {
            let mutated = self.mutate(ctx, value)?;
            slot.replace(mutated);
        }
        Ok(())
    }

    /// Like [`Mutator::mutate_field`], but an absent value is always fabricated
    fn mutate_optional(&self, ctx: &mut FuzzerContext, slot: &mut FieldSlot<'_, T>) -> Result<(), FuzzError> {
        if slot.is_present() {
            return self.mutate_field(ctx, slot);
        }
        let fresh = self.generate_random(ctx)?;
        slot.replace(fresh);
        ctx.add_log(OperationEntry::event(format!("{}: fabricate missing value", self.name())));
        Ok(())
    }
}

/// Mutators of top-level elements, which can drive the escalation loop
pub trait ResourceMutator<T>: Mutator<T> {
    /// Mutate `value` with rising intensity until `oracle` rejects it
    fn fuzz_til_invalid(
        &self,
        ctx: &mut FuzzerContext,
        value: T,
        oracle: &dyn ValidityOracle<T>,
    ) -> Result<EscalationOutcome<T>, FuzzError> {
        escalation::fuzz_until_invalid(self, ctx, value, oracle)
    }
}

/// Apply a sampled part of `ops` to `value`, in draw order
pub fn apply_ops<T>(ctx: &mut FuzzerContext, ops: &[FieldOp<T>], mut value: T) -> Result<T, FuzzError> {
    for op in ctx.sample(ops) {
        op(ctx, &mut value)?;
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::testing::CountingMutator;
    use super::*;
    use crate::config::FuzzConfig;

    fn context(percent_of_all: f64) -> FuzzerContext {
        FuzzerContext::seeded(
            FuzzConfig {
                percent_of_all,
                ..Default::default()
            },
            17,
        )
    }

    fn counter() -> CountingMutator<String> {
        CountingMutator::new(|_, value: String| format!("{}!", value), || "fresh".to_string())
    }

    #[test]
    fn test_mutate_field_fabricates_when_trial_passes() {
        let mut ctx = context(100.0);
        let mutator = counter();
        let mut field = Some("old".to_string());
        mutator.mutate_field(&mut ctx, &mut FieldSlot::new(&mut field)).unwrap();
        assert_eq!(field.as_deref(), Some("fresh"));
        assert_eq!(mutator.generations(), 1);
        assert_eq!(mutator.mutations(), 0);
    }

    #[test]
    fn test_mutate_field_mutates_present_value() {
        let mut ctx = context(0.0);
        let mutator = counter();
        let mut field = Some("old".to_string());
        mutator.mutate_field(&mut ctx, &mut FieldSlot::new(&mut field)).unwrap();
        assert_eq!(field.as_deref(), Some("old!"));
        assert_eq!(mutator.mutations(), 1);
    }

    #[test]
    fn test_mutate_field_leaves_absent_value_absent() {
        let mut ctx = context(0.0);
        let mutator = counter();
        let mut field: Option<String> = None;
        mutator.mutate_field(&mut ctx, &mut FieldSlot::new(&mut field)).unwrap();
        assert!(field.is_none());
        assert_eq!(mutator.mutations() + mutator.generations(), 0);
    }

    #[test]
    fn test_mutate_optional_fabricates_absent_value() {
        let mut ctx = context(0.0);
        let mutator = counter();
        let mut field: Option<String> = None;
        mutator.mutate_optional(&mut ctx, &mut FieldSlot::new(&mut field)).unwrap();
        assert_eq!(field.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_apply_ops_with_all_mutators() {
        fn push_a(_: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
            value.push('a');
            Ok(())
        }
        fn push_b(_: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
            value.push('b');
            Ok(())
        }

        let mut ctx = FuzzerContext::seeded(
            FuzzConfig {
                use_all_mutators: true,
                ..Default::default()
            },
            1,
        );
        let ops: [FieldOp<String>; 2] = [push_a, push_b];
        assert_eq!(apply_ops(&mut ctx, &ops, String::new()).unwrap(), "ab");
    }
}
