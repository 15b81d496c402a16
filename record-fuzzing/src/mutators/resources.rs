// record-fuzzing/src/mutators/resources.rs
//! Resource-level mutators, one per leaf element kind

use crate::context::{FuzzerContext, TextKind};
use crate::constants::DEFAULT_DATE_SKEW;
use crate::error::FuzzError;
use crate::mutators::{apply_ops, FieldOp, Mutator, ResourceMutator};
use crate::operation_log::{describe, OperationEntry};
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use record_types::*;

/// Implements the element-level contract for a resource mutator:
/// sample the op list on mutate, build a fresh element on generate.
macro_rules! resource_mutator {
    ($mutator:ident, $ty:ty, $ops:expr, $generate:path) => {
        pub struct $mutator;

        impl Mutator<$ty> for $mutator {
            fn name(&self) -> &str {
                stringify!($mutator)
            }

            fn mutate(&self, ctx: &mut FuzzerContext, value: $ty) -> Result<$ty, FuzzError> {
                apply_ops(ctx, &$ops, value)
            }

            fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<$ty, FuzzError> {
                $generate(ctx)
            }
        }

        impl ResourceMutator<$ty> for $mutator {}
    };
}

fn fresh_id(ctx: &mut FuzzerContext) -> Result<Option<String>, FuzzError> {
    ctx.generate_text(TextKind::Id).map(Some)
}

fn fabricate_list<T: crate::registry::Registered>(ctx: &mut FuzzerContext) -> Result<Vec<T>, FuzzError> {
    Ok(ctx.fabricate::<T>()?.into_iter().collect())
}

const COMPOSITION_OPS: [FieldOp<Composition>; 6] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Composition.id", &mut v.id),
    |ctx, v| ctx.fuzz_enum("Composition.status", &mut v.status),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Composition.title", &mut v.title),
    |ctx, v| ctx.fuzz_date("Composition.date", &mut v.date),
    |ctx, v| ctx.fuzz_field(&mut v.subject).map(|_| ()),
    |ctx, v| ctx.fuzz_list("Composition.author", &mut v.author),
];

fn generate_composition(ctx: &mut FuzzerContext) -> Result<Composition, FuzzError> {
    Ok(Composition {
        id: fresh_id(ctx)?,
        status: Some(ctx.random().uniform_enum(&[])?),
        title: Some(Sentence(2..5).fake_with_rng(ctx.random().rng_mut())),
        date: Some(ctx.random().bounded_date(DEFAULT_DATE_SKEW)),
        subject: ctx.fabricate::<Reference>()?,
        author: fabricate_list(ctx)?,
    })
}

resource_mutator!(CompositionMutator, Composition, COMPOSITION_OPS, generate_composition);

const PATIENT_OPS: [FieldOp<Patient>; 6] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Patient.id", &mut v.id),
    |ctx, v| ctx.fuzz_list("Patient.identifier", &mut v.identifier),
    |ctx, v| ctx.fuzz_list("Patient.name", &mut v.name),
    |ctx, v| ctx.fuzz_enum("Patient.gender", &mut v.gender),
    fuzz_birth_date,
    |ctx, v| ctx.fuzz_list("Patient.address", &mut v.address),
];

fn fuzz_birth_date(ctx: &mut FuzzerContext, value: &mut Patient) -> Result<(), FuzzError> {
    let before = describe(&value.birth_date);
    // birth dates in the future are rarer than ones in the past
    let skew = if ctx.should_fuzz_part() { DEFAULT_DATE_SKEW * 3 } else { 1 };
    value.birth_date = Some(ctx.random().bounded_date(skew).date_naive());
    ctx.add_log(OperationEntry::new("Mutate Patient.birthDate", before, describe(&value.birth_date)));
    Ok(())
}

fn generate_patient(ctx: &mut FuzzerContext) -> Result<Patient, FuzzError> {
    Ok(Patient {
        id: fresh_id(ctx)?,
        identifier: fabricate_list(ctx)?,
        name: fabricate_list(ctx)?,
        gender: Some(ctx.random().uniform_enum(&[])?),
        birth_date: Some(ctx.random().bounded_date(1).date_naive()),
        address: fabricate_list(ctx)?,
    })
}

resource_mutator!(PatientMutator, Patient, PATIENT_OPS, generate_patient);

const PRACTITIONER_OPS: [FieldOp<Practitioner>; 4] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Practitioner.id", &mut v.id),
    |ctx, v| ctx.fuzz_list("Practitioner.identifier", &mut v.identifier),
    |ctx, v| ctx.fuzz_list("Practitioner.name", &mut v.name),
    |ctx, v| ctx.fuzz_list("Practitioner.qualification", &mut v.qualification),
];

fn generate_practitioner(ctx: &mut FuzzerContext) -> Result<Practitioner, FuzzError> {
    Ok(Practitioner {
        id: fresh_id(ctx)?,
        identifier: fabricate_list(ctx)?,
        name: fabricate_list(ctx)?,
        qualification: fabricate_list(ctx)?,
    })
}

resource_mutator!(PractitionerMutator, Practitioner, PRACTITIONER_OPS, generate_practitioner);

const ORGANIZATION_OPS: [FieldOp<Organization>; 4] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Organization.id", &mut v.id),
    |ctx, v| ctx.fuzz_list("Organization.identifier", &mut v.identifier),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Organization.name", &mut v.name),
    |ctx, v| ctx.fuzz_list("Organization.address", &mut v.address),
];

fn generate_organization(ctx: &mut FuzzerContext) -> Result<Organization, FuzzError> {
    Ok(Organization {
        id: fresh_id(ctx)?,
        identifier: fabricate_list(ctx)?,
        name: Some(CompanyName().fake_with_rng(ctx.random().rng_mut())),
        address: fabricate_list(ctx)?,
    })
}

resource_mutator!(OrganizationMutator, Organization, ORGANIZATION_OPS, generate_organization);

const COVERAGE_OPS: [FieldOp<Coverage>; 5] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Coverage.id", &mut v.id),
    |ctx, v| ctx.fuzz_enum("Coverage.status", &mut v.status),
    |ctx, v| ctx.fuzz_field(&mut v.beneficiary).map(|_| ()),
    |ctx, v| ctx.fuzz_list("Coverage.payor", &mut v.payor),
    |ctx, v| ctx.fuzz_field(&mut v.period).map(|_| ()),
];

fn generate_coverage(ctx: &mut FuzzerContext) -> Result<Coverage, FuzzError> {
    Ok(Coverage {
        id: fresh_id(ctx)?,
        status: Some(ctx.random().uniform_enum(&[])?),
        beneficiary: ctx.fabricate::<Reference>()?,
        payor: fabricate_list(ctx)?,
        period: ctx.fabricate::<Period>()?,
    })
}

resource_mutator!(CoverageMutator, Coverage, COVERAGE_OPS, generate_coverage);

const MEDICATION_OPS: [FieldOp<Medication>; 4] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "Medication.id", &mut v.id),
    |ctx, v| ctx.fuzz_field(&mut v.code).map(|_| ()),
    |ctx, v| ctx.fuzz_field(&mut v.form).map(|_| ()),
    |ctx, v| ctx.fuzz_text(TextKind::Plain, "Medication.batch.lotNumber", &mut v.batch_lot),
];

fn generate_medication(ctx: &mut FuzzerContext) -> Result<Medication, FuzzError> {
    Ok(Medication {
        id: fresh_id(ctx)?,
        code: ctx.fabricate::<Coding>()?,
        form: ctx.fabricate::<Coding>()?,
        batch_lot: Some(ctx.random().alphanumeric(8)),
    })
}

resource_mutator!(MedicationMutator, Medication, MEDICATION_OPS, generate_medication);

const MEDICATION_REQUEST_OPS: [FieldOp<MedicationRequest>; 6] = [
    |ctx, v| ctx.fuzz_text(TextKind::Id, "MedicationRequest.id", &mut v.id),
    |ctx, v| ctx.fuzz_enum("MedicationRequest.status", &mut v.status),
    |ctx, v| ctx.fuzz_field(&mut v.medication).map(|_| ()),
    |ctx, v| ctx.fuzz_field(&mut v.subject).map(|_| ()),
    |ctx, v| ctx.fuzz_date("MedicationRequest.authoredOn", &mut v.authored_on),
    |ctx, v| ctx.fuzz_list("MedicationRequest.dosage", &mut v.dosage),
];

fn generate_medication_request(ctx: &mut FuzzerContext) -> Result<MedicationRequest, FuzzError> {
    Ok(MedicationRequest {
        id: fresh_id(ctx)?,
        status: Some(ctx.random().uniform_enum(&[])?),
        medication: ctx.fabricate::<Reference>()?,
        subject: ctx.fabricate::<Reference>()?,
        authored_on: Some(ctx.random().bounded_date(DEFAULT_DATE_SKEW)),
        dosage: fabricate_list(ctx)?,
    })
}

resource_mutator!(
    MedicationRequestMutator,
    MedicationRequest,
    MEDICATION_REQUEST_OPS,
    generate_medication_request
);
