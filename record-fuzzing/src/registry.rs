// record-fuzzing/src/registry.rs
//! Kind-keyed tables of mutators.
//!
//! Every table stores a closed enum of entries. An entry's variant is its
//! kind tag and carries a mutator for exactly that type, so lookups never
//! need a runtime cast.

use crate::error::FuzzError;
use crate::mutators::datatypes::{
    AddressMutator, CodingMutator, DosageMutator, HumanNameMutator, IdentifierMutator,
    MetaMutator, PeriodMutator, ReferenceMutator, SignatureMutator,
};
use crate::mutators::resources::{
    CompositionMutator, CoverageMutator, MedicationMutator, MedicationRequestMutator,
    OrganizationMutator, PatientMutator, PractitionerMutator,
};
use crate::mutators::structural::TimingRepeatMutator;
use crate::mutators::Mutator;
use crate::random::RandomDecisionSource;
use log::info;
use record_types::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Embedded datatypes with a field-level mutator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Coding,
    Identifier,
    Meta,
    Signature,
    Reference,
    HumanName,
    Address,
    Period,
    Dosage,
}

/// Sub-elements nested inside datatypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    TimingRepeat,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A tagged table entry
pub trait TableEntry: Clone + fmt::Debug {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    fn mutator_name(&self) -> &str;
}

/// A type that has a mutator table in the registry
pub trait Registered: Sized + 'static {
    type Entry: TableEntry;

    fn kind() -> <Self::Entry as TableEntry>::Kind;

    fn wrap(mutator: Arc<dyn Mutator<Self>>) -> Self::Entry;

    /// The mutator carried by `entry`, if the entry is tagged with this type
    fn unwrap(entry: &Self::Entry) -> Option<Arc<dyn Mutator<Self>>>;

    fn table(registry: &MutatorRegistry) -> &MutatorTable<Self::Entry>;

    fn table_mut(registry: &mut MutatorRegistry) -> &mut MutatorTable<Self::Entry>;
}

macro_rules! mutator_table {
    ($(#[$meta:meta])* $entry:ident : $kind:ident in $table:ident { $($variant:ident => $ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub enum $entry {
            $($variant(Arc<dyn Mutator<$ty>>),)+
        }

        impl TableEntry for $entry {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant(_) => $kind::$variant,)+
                }
            }

            fn mutator_name(&self) -> &str {
                match self {
                    $(Self::$variant(mutator) => mutator.name(),)+
                }
            }
        }

        impl fmt::Debug for $entry {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($entry), self.mutator_name())
            }
        }

        $(
            impl Registered for $ty {
                type Entry = $entry;

                fn kind() -> $kind {
                    $kind::$variant
                }

                fn wrap(mutator: Arc<dyn Mutator<Self>>) -> $entry {
                    $entry::$variant(mutator)
                }

                #[allow(unreachable_patterns)]
                fn unwrap(entry: &$entry) -> Option<Arc<dyn Mutator<Self>>> {
                    match entry {
                        $entry::$variant(mutator) => Some(Arc::clone(mutator)),
                        _ => None,
                    }
                }

                fn table(registry: &MutatorRegistry) -> &MutatorTable<$entry> {
                    &registry.$table
                }

                fn table_mut(registry: &mut MutatorRegistry) -> &mut MutatorTable<$entry> {
                    &mut registry.$table
                }
            }
        )+
    };
}

mutator_table! {
    /// Resource-level mutators, keyed by element kind
    ResourceEntry: ElementKind in resources {
        Composition => Composition,
        Patient => Patient,
        Practitioner => Practitioner,
        Organization => Organization,
        Coverage => Coverage,
        Medication => Medication,
        MedicationRequest => MedicationRequest,
    }
}

mutator_table! {
    /// Mutators for datatypes embedded in elements
    FieldEntry: FieldKind in fields {
        Coding => Coding,
        Identifier => Identifier,
        Meta => Meta,
        Signature => Signature,
        Reference => Reference,
        HumanName => HumanName,
        Address => Address,
        Period => Period,
        Dosage => Dosage,
    }
}

mutator_table! {
    /// Mutators for sub-elements of datatypes
    StructuralEntry: StructuralKind in structural {
        TimingRepeat => TimingRepeat,
    }
}

/// One kind → mutator-list map
#[derive(Debug)]
pub struct MutatorTable<E: TableEntry> {
    entries: HashMap<E::Kind, Vec<E>>,
}

impl<E: TableEntry> Default for MutatorTable<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E: TableEntry> MutatorTable<E> {
    pub fn add<T: Registered<Entry = E>>(&mut self, mutator: Arc<dyn Mutator<T>>) {
        self.add_entry(T::wrap(mutator));
    }

    /// Append an already tagged entry under its own kind
    pub fn add_entry(&mut self, entry: E) {
        self.entries.entry(entry.kind()).or_default().push(entry);
    }

    /// One uniformly chosen mutator for `T`, or `None` if none is registered
    pub fn get<T: Registered<Entry = E>>(
        &self,
        random: &mut RandomDecisionSource,
    ) -> Result<Option<Arc<dyn Mutator<T>>>, FuzzError> {
        let kind = T::kind();
        let Some(entry) = self.entries.get(&kind).and_then(|list| random.pick(list)) else {
            info!("No mutator registered for {:?}", kind);
            return Ok(None);
        };

        T::unwrap(entry).map(Some).ok_or_else(|| {
            FuzzError::IllegalState(format!(
                "entry {:?} stored under {:?} is tagged {:?}",
                entry,
                kind,
                entry.kind()
            ))
        })
    }

    pub fn get_all<T: Registered<Entry = E>>(&self) -> Result<Vec<Arc<dyn Mutator<T>>>, FuzzError> {
        let kind = T::kind();
        self.entries
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|entry| {
                T::unwrap(entry).ok_or_else(|| {
                    FuzzError::IllegalState(format!("entry {:?} stored under {:?}", entry, kind))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The three mutator tables of a fuzzing context
#[derive(Debug, Default)]
pub struct MutatorRegistry {
    resources: MutatorTable<ResourceEntry>,
    fields: MutatorTable<FieldEntry>,
    structural: MutatorTable<StructuralEntry>,
}

impl MutatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in mutator set
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.add::<Composition>(Arc::new(CompositionMutator));
        registry.add::<Patient>(Arc::new(PatientMutator));
        registry.add::<Practitioner>(Arc::new(PractitionerMutator));
        registry.add::<Organization>(Arc::new(OrganizationMutator));
        registry.add::<Coverage>(Arc::new(CoverageMutator));
        registry.add::<Medication>(Arc::new(MedicationMutator));
        registry.add::<MedicationRequest>(Arc::new(MedicationRequestMutator));

        registry.add::<Coding>(Arc::new(CodingMutator));
        registry.add::<Identifier>(Arc::new(IdentifierMutator));
        registry.add::<Meta>(Arc::new(MetaMutator));
        registry.add::<Signature>(Arc::new(SignatureMutator));
        registry.add::<Reference>(Arc::new(ReferenceMutator));
        registry.add::<HumanName>(Arc::new(HumanNameMutator));
        registry.add::<Address>(Arc::new(AddressMutator));
        registry.add::<Period>(Arc::new(PeriodMutator));
        registry.add::<Dosage>(Arc::new(DosageMutator));

        registry.add::<TimingRepeat>(Arc::new(TimingRepeatMutator));

        registry
    }

    pub fn add<T: Registered>(&mut self, mutator: Arc<dyn Mutator<T>>) {
        T::table_mut(self).add::<T>(mutator);
    }

    pub fn get<T: Registered>(
        &self,
        random: &mut RandomDecisionSource,
    ) -> Result<Option<Arc<dyn Mutator<T>>>, FuzzError> {
        T::table(self).get::<T>(random)
    }

    pub fn get_all<T: Registered>(&self) -> Result<Vec<Arc<dyn Mutator<T>>>, FuzzError> {
        T::table(self).get_all::<T>()
    }

    pub fn resources(&self) -> &MutatorTable<ResourceEntry> {
        &self.resources
    }

    pub fn fields(&self) -> &MutatorTable<FieldEntry> {
        &self.fields
    }

    pub fn structural(&self) -> &MutatorTable<StructuralEntry> {
        &self.structural
    }

    pub fn clear(&mut self) {
        self.resources.clear();
        self.fields.clear();
        self.structural.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FuzzerContext;

    struct NamedPatientMutator(&'static str);

    impl Mutator<Patient> for NamedPatientMutator {
        fn name(&self) -> &str {
            self.0
        }

        fn mutate(&self, _ctx: &mut FuzzerContext, value: Patient) -> Result<Patient, FuzzError> {
            Ok(value)
        }

        fn generate_random(&self, _ctx: &mut FuzzerContext) -> Result<Patient, FuzzError> {
            Ok(Patient::default())
        }
    }

    #[test]
    fn test_default_registry_counts() {
        let registry = MutatorRegistry::with_defaults();
        assert_eq!(registry.resources().len(), 7);
        assert_eq!(registry.fields().len(), 9);
        assert_eq!(registry.structural().len(), 1);
    }

    #[test]
    fn test_get_on_empty_kind_is_none() {
        let registry = MutatorRegistry::new();
        let mut random = RandomDecisionSource::seeded(1);
        assert!(registry.get::<Patient>(&mut random).unwrap().is_none());
        assert!(registry.get::<TimingRepeat>(&mut random).unwrap().is_none());
        assert!(registry.get_all::<Coding>().unwrap().is_empty());
    }

    #[test]
    fn test_registration_is_additive_and_lookup_uniform() {
        let mut registry = MutatorRegistry::new();
        registry.add::<Patient>(Arc::new(NamedPatientMutator("first")));
        registry.add::<Patient>(Arc::new(NamedPatientMutator("second")));
        assert_eq!(registry.get_all::<Patient>().unwrap().len(), 2);

        let mut random = RandomDecisionSource::seeded(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let mutator = registry.get::<Patient>(&mut random).unwrap().unwrap();
            seen.insert(mutator.name().to_string());
        }
        assert_eq!(seen.len(), 2);
        assert!(registry.get::<Practitioner>(&mut random).unwrap().is_none());
    }

    #[test]
    fn test_add_entry_uses_entry_tag() {
        let mut registry = MutatorRegistry::new();
        registry
            .resources
            .add_entry(ResourceEntry::Patient(Arc::new(NamedPatientMutator("tagged"))));
        let mut random = RandomDecisionSource::seeded(1);
        let mutator = registry.get::<Patient>(&mut random).unwrap().unwrap();
        assert_eq!(mutator.name(), "tagged");
    }

    #[test]
    fn test_mistagged_entry_is_illegal_state() {
        let mut registry = MutatorRegistry::new();
        registry.resources.entries.insert(
            ElementKind::Practitioner,
            vec![ResourceEntry::Patient(Arc::new(NamedPatientMutator("misplaced")))],
        );
        let mut random = RandomDecisionSource::seeded(1);
        let result = registry.get::<Practitioner>(&mut random);
        match result {
            Err(FuzzError::IllegalState(message)) => {
                assert!(message.contains("ResourceEntry(misplaced)"));
                assert!(message.contains("Practitioner"));
            }
            _ => panic!("expected an illegal state error"),
        }
        assert!(matches!(
            registry.get_all::<Practitioner>(),
            Err(FuzzError::IllegalState(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut registry = MutatorRegistry::with_defaults();
        registry.clear();
        assert!(registry.resources().is_empty());
        assert!(registry.fields().is_empty());
        assert!(registry.structural().is_empty());
    }
}
