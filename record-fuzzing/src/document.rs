// record-fuzzing/src/document.rs
//! Document orchestrator.
//!
//! Applies a sampled set of root-level mutators to a document, then walks
//! its entries: nested documents are descended into, leaf elements are
//! handed to a registered resource mutator.

use crate::constants::DEFAULT_DATE_SKEW;
use crate::context::{FuzzerContext, TextKind};
use crate::error::FuzzError;
use crate::generators::{Generator, SeedGenerator};
use crate::mutators::{FieldOp, Mutator, ResourceMutator};
use crate::operation_log::{describe, OperationEntry};
use crate::registry::Registered;
use crate::slot::FieldSlot;
use log::{debug, warn};
use rand::Rng;
use record_types::*;
use std::mem;
use std::path::Path;
use std::sync::Arc;
use uuid::Builder;

const ROOT_OPS: [FieldOp<Document>; 6] = [
    |ctx, d| ctx.fuzz_text(TextKind::Id, "Document.id", &mut d.id),
    fuzz_identifier,
    fuzz_category,
    fuzz_meta,
    |ctx, d| ctx.fuzz_text(TextKind::Language, "Document.language", &mut d.language),
    fuzz_signature,
];

fn fuzz_identifier(ctx: &mut FuzzerContext, document: &mut Document) -> Result<(), FuzzError> {
    let before = describe(&document.identifier);
    if ctx.fuzz_optional_field(&mut document.identifier)? {
        ctx.add_log(OperationEntry::new("Mutate Document.identifier", before, describe(&document.identifier)));
    }
    Ok(())
}

fn fuzz_category(ctx: &mut FuzzerContext, document: &mut Document) -> Result<(), FuzzError> {
    ctx.fuzz_enum("Document.type", &mut document.category)
}

fn fuzz_meta(ctx: &mut FuzzerContext, document: &mut Document) -> Result<(), FuzzError> {
    let before = describe(&document.meta);
    if ctx.fuzz_optional_field(&mut document.meta)? {
        ctx.add_log(OperationEntry::new("Mutate Document.meta", before, describe(&document.meta)));
    }
    Ok(())
}

fn fuzz_signature(ctx: &mut FuzzerContext, document: &mut Document) -> Result<(), FuzzError> {
    let before = describe(&document.signature);
    if ctx.fuzz_optional_field(&mut document.signature)? {
        ctx.add_log(OperationEntry::new("Mutate Document.signature", before, describe(&document.signature)));
    }
    Ok(())
}

/// Run the registered resource mutator for `R` over one leaf element
fn apply_leaf<R>(ctx: &mut FuzzerContext, element: &mut R, index: usize) -> Result<(), FuzzError>
where
    R: Registered + Default,
{
    let Some(mutator) = ctx.mutator::<R>()? else {
        ctx.add_log(OperationEntry::event(format!(
            "No mutator for {:?}, entry {} skipped",
            R::kind(),
            index
        )));
        return Ok(());
    };

    let mut holder = Some(mem::take(element));
    mutator.mutate_field(ctx, &mut FieldSlot::new(&mut holder))?;
    *element = holder.unwrap_or_default();
    ctx.add_log(OperationEntry::event(format!("{} applied to entry {}", mutator.name(), index)));
    Ok(())
}

/// Fresh leaf element of `kind` from the registered resource mutators
fn fabricate_element(ctx: &mut FuzzerContext, kind: ElementKind) -> Result<Option<Element>, FuzzError> {
    let element = match kind {
        ElementKind::Composition => ctx.fabricate::<Composition>()?.map(Element::Composition),
        ElementKind::Patient => ctx.fabricate::<Patient>()?.map(Element::Patient),
        ElementKind::Practitioner => ctx.fabricate::<Practitioner>()?.map(Element::Practitioner),
        ElementKind::Organization => ctx.fabricate::<Organization>()?.map(Element::Organization),
        ElementKind::Coverage => ctx.fabricate::<Coverage>()?.map(Element::Coverage),
        ElementKind::Medication => ctx.fabricate::<Medication>()?.map(Element::Medication),
        ElementKind::MedicationRequest => {
            ctx.fabricate::<MedicationRequest>()?.map(Element::MedicationRequest)
        }
        ElementKind::Document => None,
    };
    Ok(element)
}

/// Mutator for whole documents
#[derive(Default, Clone)]
pub struct DocumentMutator {
    generator: Option<Arc<dyn Generator<Document>>>,
}

impl DocumentMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `generator` for baselines instead of composing one
    pub fn with_generator(generator: Arc<dyn Generator<Document>>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Use the document in `path` as the baseline.
    ///
    /// A seed that cannot be read or decoded is logged and baselines are
    /// composed instead.
    pub fn from_seed_file(path: &Path) -> Self {
        match SeedGenerator::from_file(path) {
            Ok(generator) => Self::with_generator(Arc::new(generator)),
            Err(err) => {
                warn!(
                    "Could not load seed document {}: {}, composing baselines instead",
                    path.display(),
                    err
                );
                Self::new()
            }
        }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    fn mutate_at_depth(
        &self,
        ctx: &mut FuzzerContext,
        mut document: Document,
        depth: usize,
    ) -> Result<Document, FuzzError> {
        for op in ctx.sample(&ROOT_OPS) {
            op(ctx, &mut document)?;
        }

        let mut entries = mem::take(&mut document.entries);
        for (index, entry) in entries.iter_mut().enumerate() {
            if !ctx.should_fuzz() {
                continue;
            }
            match &mut entry.element {
                Element::Document(nested) => {
                    debug!("Descending into entry {} at depth {}", index, depth + 1);
                    ctx.add_log(OperationEntry::event(format!(
                        "Descend into nested document at entry {} (depth {})",
                        index,
                        depth + 1
                    )));
                    let inner = mem::take(nested.as_mut());
                    **nested = self.mutate_at_depth(ctx, inner, depth + 1)?;
                }
                Element::Composition(value) => apply_leaf(ctx, value, index)?,
                Element::Patient(value) => apply_leaf(ctx, value, index)?,
                Element::Practitioner(value) => apply_leaf(ctx, value, index)?,
                Element::Organization(value) => apply_leaf(ctx, value, index)?,
                Element::Coverage(value) => apply_leaf(ctx, value, index)?,
                Element::Medication(value) => apply_leaf(ctx, value, index)?,
                Element::MedicationRequest(value) => apply_leaf(ctx, value, index)?,
            }
        }
        document.entries = entries;

        Ok(document)
    }

    fn compose(&self, ctx: &mut FuzzerContext) -> Result<Document, FuzzError> {
        let mut document = Document {
            id: Some(ctx.generate_text(TextKind::Id)?),
            identifier: ctx.fabricate::<Identifier>()?,
            category: Some(DocumentCategory::Document),
            meta: ctx.fabricate::<Meta>()?,
            language: Some(ctx.generate_text(TextKind::Language)?),
            timestamp: Some(ctx.random().bounded_date(DEFAULT_DATE_SKEW)),
            signature: ctx.fabricate::<Signature>()?,
            entries: Vec::new(),
        };

        for kind in ElementKind::LEAVES {
            if let Some(element) = fabricate_element(ctx, kind)? {
                let id = Builder::from_random_bytes(ctx.random().rng_mut().gen()).into_uuid();
                document.entries.push(Entry {
                    full_url: Some(format!("urn:uuid:{}", id)),
                    element,
                });
            }
        }

        Ok(document)
    }
}

impl Mutator<Document> for DocumentMutator {
    fn name(&self) -> &str {
        "DocumentMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: Document) -> Result<Document, FuzzError> {
        self.mutate_at_depth(ctx, value, 0)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<Document, FuzzError> {
        match &self.generator {
            Some(generator) => Ok(generator.generate()),
            None => self.compose(ctx),
        }
    }
}

impl ResourceMutator<Document> for DocumentMutator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuzzConfig;
    use crate::mutators::testing::CountingMutator;

    fn config(percent_of_all: f64, percent_of_each: f64, used_percent: f64) -> FuzzConfig {
        FuzzConfig {
            percent_of_all,
            percent_of_each,
            used_percent_of_mutators: used_percent,
            ..Default::default()
        }
    }

    fn patient(id: &str) -> Patient {
        Patient {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn counting_patients() -> Arc<CountingMutator<Patient>> {
        Arc::new(CountingMutator::new(
            |_, mut value: Patient| {
                value.gender = Some(Gender::Other);
                value
            },
            || patient("generated"),
        ))
    }

    fn descents(ctx: &FuzzerContext) -> usize {
        ctx.operation_log()
            .iter()
            .filter(|entry| entry.description.starts_with("Descend"))
            .count()
    }

    #[test]
    fn test_zero_entry_document_touches_only_root() {
        let mut ctx = FuzzerContext::seeded(
            FuzzConfig {
                use_all_mutators: true,
                ..config(100.0, 50.0, 100.0)
            },
            3,
        );
        let counter = counting_patients();
        ctx.registry_mut().add::<Patient>(counter.clone());

        let document = Document {
            id: Some("root".to_string()),
            ..Default::default()
        };
        let mutated = DocumentMutator::new().mutate(&mut ctx, document).unwrap();

        assert!(mutated.entries.is_empty());
        assert_eq!(counter.mutations() + counter.generations(), 0);
        assert_eq!(descents(&ctx), 0);
        assert!(ctx.operation_log().iter().any(|entry| entry.description == "Mutate Document.id"));
    }

    #[test]
    fn test_full_intensity_replaces_entry_wholesale() {
        let mut ctx = FuzzerContext::seeded(config(100.0, 100.0, 0.0), 3);
        ctx.registry_mut().clear();
        let counter = counting_patients();
        ctx.registry_mut().add::<Patient>(counter.clone());

        let document = Document::new().with_entry(Element::Patient(patient("original")));
        let mutated = DocumentMutator::new().mutate(&mut ctx, document).unwrap();

        assert_eq!(counter.generations(), 1);
        assert_eq!(counter.mutations(), 0);
        assert_eq!(mutated.entries[0].element, Element::Patient(patient("generated")));
    }

    #[test]
    fn test_zero_percent_of_all_touches_no_entry() {
        let mut ctx = FuzzerContext::seeded(config(0.0, 100.0, 0.0), 3);
        let counter = counting_patients();
        ctx.registry_mut().add::<Patient>(counter.clone());

        let nested = Document::new().with_entry(Element::Patient(patient("inner")));
        let document = Document::new()
            .with_entry(Element::Patient(patient("outer")))
            .with_entry(Element::Document(Box::new(nested)));
        let mutated = DocumentMutator::new().mutate(&mut ctx, document.clone()).unwrap();

        assert_eq!(mutated, document);
        assert_eq!(counter.mutations() + counter.generations(), 0);
        assert!(ctx.operation_log().is_empty());
    }

    #[test]
    fn test_absent_root_fields_are_fabricated() {
        let mut ctx = FuzzerContext::seeded(
            FuzzConfig {
                use_all_mutators: true,
                ..config(0.0, 0.0, 0.0)
            },
            3,
        );

        let mutated = DocumentMutator::new().mutate(&mut ctx, Document::new()).unwrap();

        assert!(mutated.id.is_some());
        assert!(mutated.language.is_some());
        assert!(mutated.identifier.is_some());
        assert!(mutated.meta.is_some());
        assert!(mutated.signature.is_some());
        assert!(ctx
            .operation_log()
            .iter()
            .any(|entry| entry.description == "Mutate Document.signature"));
    }

    #[test]
    fn test_nested_documents_are_descended() {
        let mut ctx = FuzzerContext::seeded(config(100.0, 0.0, 0.0), 3);
        let level_two = Document::new().with_entry(Element::Medication(Medication::default()));
        let level_one = Document::new().with_entry(Element::Document(Box::new(level_two)));
        let document = Document::new().with_entry(Element::Document(Box::new(level_one)));

        DocumentMutator::new().mutate(&mut ctx, document).unwrap();

        assert_eq!(descents(&ctx), 2);
        assert!(ctx
            .operation_log()
            .iter()
            .any(|entry| entry.description.contains("(depth 2)")));
    }

    #[test]
    fn test_registry_miss_skips_entry() {
        let mut ctx = FuzzerContext::seeded(config(100.0, 0.0, 0.0), 3);
        ctx.registry_mut().clear();
        let document = Document::new().with_entry(Element::Coverage(Coverage::default()));

        let mutated = DocumentMutator::new().mutate(&mut ctx, document.clone()).unwrap();

        assert_eq!(mutated, document);
        assert!(ctx
            .operation_log()
            .iter()
            .any(|entry| entry.description == "No mutator for Coverage, entry 0 skipped"));
    }

    #[test]
    fn test_generate_random_composes_every_leaf_kind() {
        let mut ctx = FuzzerContext::seeded(FuzzConfig::default(), 3);
        let document = DocumentMutator::new().generate_random(&mut ctx).unwrap();

        let kinds: Vec<ElementKind> = document.entries.iter().map(|entry| entry.element.kind()).collect();
        assert_eq!(kinds, ElementKind::LEAVES.to_vec());
        assert!(document.structural_issues().is_empty());
    }

    #[test]
    fn test_unreadable_seed_falls_back_to_composition() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"entry\": 42").unwrap();

        for path in [broken, dir.path().join("missing.json")] {
            let mutator = DocumentMutator::from_seed_file(&path);
            assert!(!mutator.has_generator());

            let mut ctx = FuzzerContext::seeded(FuzzConfig::default(), 3);
            let document = mutator.generate_random(&mut ctx).unwrap();
            assert_eq!(document.entry_count(), ElementKind::LEAVES.len());
        }
    }

    #[test]
    fn test_seed_file_is_used_as_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        let seed = Document {
            id: Some("seed".to_string()),
            ..Default::default()
        };
        let encoded = RecordParser::new().encode(&seed, EncodingFormat::Json).unwrap();
        std::fs::write(&path, encoded).unwrap();

        let mutator = DocumentMutator::from_seed_file(&path);
        assert!(mutator.has_generator());
        let mut ctx = FuzzerContext::seeded(FuzzConfig::default(), 3);
        assert_eq!(mutator.generate_random(&mut ctx).unwrap(), seed);
    }

    #[test]
    fn test_generate_random_prefers_generator() {
        let mut ctx = FuzzerContext::seeded(FuzzConfig::default(), 3);
        let seed = Document {
            id: Some("seed".to_string()),
            ..Default::default()
        };
        let mutator = DocumentMutator::with_generator(Arc::new(SeedGenerator::new(seed.clone())));
        assert_eq!(mutator.generate_random(&mut ctx).unwrap(), seed);
    }
}
