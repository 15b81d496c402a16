// record-fuzzing/src/mutators/datatypes.rs
//! Mutators for datatypes embedded in elements

use crate::context::{FuzzerContext, TextKind};
use crate::constants::DEFAULT_DATE_SKEW;
use crate::error::FuzzError;
use crate::mutators::{apply_ops, FieldOp, Mutator};
use crate::operation_log::{describe, OperationEntry};
use chrono::Duration;
use fake::faker::address::en::{CityName, CountryCode, StreetName, ZipCode};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use record_types::*;

pub struct CodingMutator;

const CODING_OPS: [FieldOp<Coding>; 3] = [
    |ctx, v| ctx.fuzz_text(TextKind::Url, "Coding.system", &mut v.system),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Coding.code", &mut v.code),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Coding.display", &mut v.display),
];

impl Mutator<Coding> for CodingMutator {
    fn name(&self) -> &str {
        "CodingMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Coding) -> Result<Coding, FuzzError> {
        apply_ops(ctx, &CODING_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Coding, FuzzError> {
        Ok(Coding {
            system: Some(ctx.generate_text(TextKind::Url)?),
            code: Some(ctx.random().alphanumeric(6)),
            display: Some(Word().fake_with_rng(ctx.random().rng_mut())),
        })
    }
}

pub struct IdentifierMutator;

const IDENTIFIER_OPS: [FieldOp<Identifier>; 4] = [
    |ctx, v| ctx.fuzz_enum("Identifier.use", &mut v.use_),
    |ctx, v| ctx.fuzz_text(TextKind::Url, "Identifier.system", &mut v.system),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Identifier.value", &mut v.value),
    |ctx, v| ctx.fuzz_field(&mut v.period).map(|_| ()),
];

impl Mutator<Identifier> for IdentifierMutator {
    fn name(&self) -> &str {
        "IdentifierMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Identifier) -> Result<Identifier, FuzzError> {
        apply_ops(ctx, &IDENTIFIER_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Identifier, FuzzError> {
        Ok(Identifier {
            use_: Some(ctx.random().uniform_enum(&[])?),
            system: Some(ctx.generate_text(TextKind::Url)?),
            value: Some(ctx.random().alphanumeric(10)),
            period: None,
        })
    }
}

pub struct MetaMutator;

const META_OPS: [FieldOp<Meta>; 3] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Meta.versionId", &mut v.version_id),
    |ctx, v| ctx.fuzz_date("Meta.lastUpdated", &mut v.last_updated),
    |ctx, v| ctx.fuzz_texts(TextKind::Url, "Meta.profile", &mut v.profile),
];

impl Mutator<Meta> for MetaMutator {
    fn name(&self) -> &str {
        "MetaMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Meta) -> Result<Meta, FuzzError> {
        apply_ops(ctx, &META_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Meta, FuzzError> {
        Ok(Meta {
            version_id: Some((1 + ctx.random().bounded_index(9)).to_string()),
            last_updated: Some(ctx.random().bounded_date(DEFAULT_DATE_SKEW)),
            profile: vec![ctx.generate_text(TextKind::Url)?],
        })
    }
}

pub struct SignatureMutator;

const SIGNATURE_OPS: [FieldOp<Signature>; 5] = [
    |ctx, v| ctx.fuzz_list("Signature.type", &mut v.type_),
    |ctx, v| ctx.fuzz_date("Signature.when", &mut v.when),
    |ctx, v| ctx.fuzz_field(&mut v.who).map(|_| ()),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Signature.sigFormat", &mut v.sig_format),
    fuzz_signature_data,
];

/// Signature data is hex: either re-sign with fresh bytes or break the encoding
fn fuzz_signature_data(ctx: &mut FuzzerContext, value: &mut Signature) -> Result<(), FuzzError> {
    let before = value.data.clone();
    if ctx.should_fuzz_part() {
        ctx.fuzz_text(TextKind::Plain, "Signature.data", &mut value.data)?;
    } else {
        value.data = Some(signature_bytes(ctx));
        ctx.add_log(OperationEntry::new("Re-sign Signature.data", before, value.data.clone()));
    }
    Ok(())
}

fn signature_bytes(ctx: &mut FuzzerContext) -> String {
    let bytes: [u8; 32] = ctx.random().rng_mut().gen();
    hex::encode(bytes)
}

impl Mutator<Signature> for SignatureMutator {
    fn name(&self) -> &str {
        "SignatureMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Signature) -> Result<Signature, FuzzError> {
        apply_ops(ctx, &SIGNATURE_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Signature, FuzzError> {
        Ok(Signature {
            type_: ctx.fabricate::<Coding>()?.into_iter().collect(),
            when: Some(ctx.random().bounded_date(DEFAULT_DATE_SKEW)),
            who: ctx.fabricate::<Reference>()?,
            sig_format: Some("application/jose".to_string()),
            data: Some(signature_bytes(ctx)),
        })
    }
}

pub struct ReferenceMutator;

const REFERENCE_OPS: [FieldOp<Reference>; 2] = [
    fuzz_reference_target,
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Reference.display", &mut v.display),
];

/// `Kind/id` references keep their kind and get a broken id; anything else
/// is treated as a URL
fn fuzz_reference_target(ctx: &mut FuzzerContext, value: &mut Reference) -> Result<(), FuzzError> {
    let split = value
        .reference
        .as_deref()
        .filter(|target| !is_uri(target))
        .and_then(|target| target.split_once('/'))
        .map(|(kind, id)| (kind.to_string(), id.to_string()));

    match split {
        Some((kind, id)) => {
            let before = value.reference.clone();
            let mut id = Some(id);
            ctx.fuzz_text(TextKind::Id, "Reference.reference id", &mut id)?;
            value.reference = Some(format!("{}/{}", kind, id.unwrap_or_default()));
            ctx.add_log(OperationEntry::new("Mutate Reference.reference", before, value.reference.clone()));
            Ok(())
        }
        None => ctx.fuzz_text(TextKind::Url, "Reference.reference", &mut value.reference),
    }
}

impl Mutator<Reference> for ReferenceMutator {
    fn name(&self) -> &str {
        "ReferenceMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Reference) -> Result<Reference, FuzzError> {
        apply_ops(ctx, &REFERENCE_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Reference, FuzzError> {
        let kind = ctx
            .random()
            .pick(&ElementKind::LEAVES)
            .copied()
            .unwrap_or(ElementKind::Patient);
        let id = ctx.generate_text(TextKind::Id)?;
        Ok(Reference {
            reference: Some(format!("{}/{}", kind, id)),
            display: None,
        })
    }
}

pub struct HumanNameMutator;

const HUMAN_NAME_OPS: [FieldOp<HumanName>; 4] = [
    |ctx, v| ctx.fuzz_enum("HumanName.use", &mut v.use_),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "HumanName.family", &mut v.family),
    |ctx, v| ctx.fuzz_texts(TextKind::Plain, "HumanName.given", &mut v.given),
    |ctx, v| ctx.fuzz_texts(TextKind::Plain, "HumanName.prefix", &mut v.prefix),
];

impl Mutator<HumanName> for HumanNameMutator {
    fn name(&self) -> &str {
        "HumanNameMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: HumanName) -> Result<HumanName, FuzzError> {
        apply_ops(ctx, &HUMAN_NAME_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<HumanName, FuzzError> {
        let rng = ctx.random().rng_mut();
        Ok(HumanName {
            use_: Some(NameUse::Official),
            family: Some(LastName().fake_with_rng(rng)),
            given: vec![FirstName().fake_with_rng(rng)],
            prefix: Vec::new(),
        })
    }
}

pub struct AddressMutator;

const ADDRESS_OPS: [FieldOp<Address>; 5] = [
    |ctx, v| ctx.fuzz_enum("Address.use", &mut v.use_),
    |ctx, v| ctx.fuzz_texts(TextKind::Plain, "Address.line", &mut v.line),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Address.city", &mut v.city),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Address.postalCode", &mut v.postal_code),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Address.country", &mut v.country),
];

impl Mutator<Address> for AddressMutator {
    fn name(&self) -> &str {
        "AddressMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Address) -> Result<Address, FuzzError> {
        apply_ops(ctx, &ADDRESS_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Address, FuzzError> {
        let use_ = ctx.random().uniform_enum(&[])?;
        let rng = ctx.random().rng_mut();
        Ok(Address {
            use_: Some(use_),
            line: vec![StreetName().fake_with_rng(rng)],
            city: Some(CityName().fake_with_rng(rng)),
            postal_code: Some(ZipCode().fake_with_rng(rng)),
            country: Some(CountryCode().fake_with_rng(rng)),
        })
    }
}

pub struct PeriodMutator;

const PERIOD_OPS: [FieldOp<Period>; 3] = [
    |ctx, v| ctx.fuzz_date("Period.start", &mut v.start),
    |ctx, v| ctx.fuzz_date("Period.end", &mut v.end),
    invert_period,
];

/// Swap start and end so the period runs backwards
fn invert_period(ctx: &mut FuzzerContext, value: &mut Period) -> Result<(), FuzzError> {
    let before = describe(&Some(value.clone()));
    std::mem::swap(&mut value.start, &mut value.end);
    ctx.add_log(OperationEntry::new("Invert Period", before, describe(&Some(value.clone()))));
    Ok(())
}

impl Mutator<Period> for PeriodMutator {
    fn name(&self) -> &str {
        "PeriodMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Period) -> Result<Period, FuzzError> {
        apply_ops(ctx, &PERIOD_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Period, FuzzError> {
        let start = ctx.random().bounded_date(DEFAULT_DATE_SKEW);
        let days = 1 + ctx.random().bounded_long(365);
        Ok(Period {
            start: Some(start),
            end: Some(start + Duration::days(days)),
        })
    }
}

pub struct DosageMutator;

const DOSAGE_OPS: [FieldOp<Dosage>; 2] = [
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Dosage.text", &mut v.text),
    |ctx, v| ctx.fuzz_field(&mut v.timing_repeat).map(|_| ()),
];

impl Mutator<Dosage> for DosageMutator {
    fn name(&self) -> &str {
        "DosageMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Dosage) -> Result<Dosage, FuzzError> {
        apply_ops(ctx, &DOSAGE_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Dosage, FuzzError> {
        Ok(Dosage {
            text: Some(ctx.generate_text(TextKind::Plain)?),
            timing_repeat: ctx.fabricate::<TimingRepeat>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuzzConfig;

    fn context(config: FuzzConfig) -> FuzzerContext {
        FuzzerContext::seeded(config, 31)
    }

    #[test]
    fn test_generated_datatypes_are_complete() {
        let mut ctx = context(FuzzConfig::default());
        let signature = SignatureMutator.generate_random(&mut ctx).unwrap();
        assert_eq!(signature.type_.len(), 1);
        assert!(signature.who.is_some());
        assert_eq!(signature.data.as_ref().map(String::len), Some(64));

        let period = PeriodMutator.generate_random(&mut ctx).unwrap();
        assert!(period.start < period.end);

        let dosage = DosageMutator.generate_random(&mut ctx).unwrap();
        assert!(dosage.timing_repeat.is_some());
    }

    #[test]
    fn test_generated_reference_is_well_formed() {
        let mut ctx = context(FuzzConfig::default());
        for _ in 0..20 {
            let reference = ReferenceMutator.generate_random(&mut ctx).unwrap();
            let target = reference.reference.unwrap();
            let (kind, id) = target.split_once('/').unwrap();
            assert!(ElementKind::LEAVES.iter().any(|leaf| leaf.to_string() == kind));
            assert!(is_valid_id(id));
        }
    }

    #[test]
    fn test_reference_mutation_keeps_kind() {
        let mut ctx = context(FuzzConfig {
            use_all_mutators: true,
            ..Default::default()
        });
        let reference = Reference {
            reference: Some("Patient/p-1".to_string()),
            display: None,
        };
        let mutated = ReferenceMutator.mutate(&mut ctx, reference).unwrap();
        assert!(mutated.reference.unwrap().starts_with("Patient/"));
        assert!(mutated.display.is_some());
    }

    #[test]
    fn test_invert_period() {
        let mut ctx = context(FuzzConfig::default());
        let mut period = PeriodMutator.generate_random(&mut ctx).unwrap();
        let original = period.clone();
        invert_period(&mut ctx, &mut period).unwrap();
        assert_eq!(period.start, original.end);
        assert_eq!(period.end, original.start);
    }

    #[test]
    fn test_all_ops_touch_every_coding_part() {
        let mut ctx = context(FuzzConfig {
            use_all_mutators: true,
            ..Default::default()
        });
        let mutated = CodingMutator.mutate(&mut ctx, Coding::default()).unwrap();
        assert!(mutated.system.is_some());
        assert!(mutated.code.is_some());
        assert!(mutated.display.is_some());
        assert_eq!(ctx.operation_log().len(), 3 + count_fabrications(&ctx));
    }

    fn count_fabrications(ctx: &FuzzerContext) -> usize {
        ctx.operation_log()
            .iter()
            .filter(|entry| entry.description.ends_with("fabricate missing value"))
            .count()
    }
}
