// record-fuzzing/src/context.rs
//! Per-run state shared by every mutator

use crate::config::{FuzzConfig, Intensity};
use crate::constants::DEFAULT_DATE_SKEW;
use crate::error::FuzzError;
use crate::mutators::scalar::{
    IdMutator, IntMutator, LanguageCodeMutator, StringMutator, UrlMutator,
};
use crate::mutators::Mutator;
use crate::operation_log::{describe, OperationEntry, OperationLog};
use crate::random::RandomDecisionSource;
use crate::registry::{MutatorRegistry, Registered};
use crate::slot::FieldSlot;
use chrono::{DateTime, Utc};
use log::{debug, info};
use record_types::Enumerated;
use std::fmt;
use std::sync::Arc;

/// Which built-in string mutator to use for a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Plain,
    Url,
    Id,
    Language,
}

/// Everything a mutator needs during a run: configuration, randomness,
/// the operation log and the registry.
///
/// The base configuration is never modified; escalation raises the active
/// copy and puts back the values it started from.
pub struct FuzzerContext {
    base_config: FuzzConfig,
    config: FuzzConfig,
    random: RandomDecisionSource,
    log: OperationLog,
    registry: MutatorRegistry,
    string_mutator: Arc<dyn Mutator<String>>,
    url_mutator: Arc<dyn Mutator<String>>,
    id_mutator: Arc<dyn Mutator<String>>,
    language_mutator: Arc<dyn Mutator<String>>,
    int_mutator: Arc<dyn Mutator<i32>>,
}

impl fmt::Debug for FuzzerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzerContext")
            .field("config", &self.config)
            .field("log_entries", &self.log.len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl FuzzerContext {
    pub fn new(config: FuzzConfig) -> Self {
        Self::with_random(config, RandomDecisionSource::new())
    }

    pub fn seeded(config: FuzzConfig, seed: u64) -> Self {
        Self::with_random(config, RandomDecisionSource::seeded(seed))
    }

    pub fn with_random(config: FuzzConfig, random: RandomDecisionSource) -> Self {
        let config = config.normalized();
        info!("Fuzzer context created with {}", config);
        Self {
            base_config: config.clone(),
            config,
            random,
            log: OperationLog::new(),
            registry: MutatorRegistry::with_defaults(),
            string_mutator: Arc::new(StringMutator),
            url_mutator: Arc::new(UrlMutator),
            id_mutator: Arc::new(IdMutator),
            language_mutator: Arc::new(LanguageCodeMutator),
            int_mutator: Arc::new(IntMutator),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    pub fn base_config(&self) -> &FuzzConfig {
        &self.base_config
    }

    /// Bernoulli trial with an explicit percentage
    pub fn conditional_chance(&mut self, percent: f64) -> bool {
        self.random.bernoulli(percent)
    }

    /// Trial deciding whether an entry or field is touched at all
    pub fn should_fuzz(&mut self) -> bool {
        self.random.bernoulli(self.config.percent_of_all)
    }

    /// Trial deciding whether a sub-part inside a mutator is touched
    pub fn should_fuzz_part(&mut self) -> bool {
        self.random.bernoulli(self.config.percent_of_each)
    }

    pub fn sample<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        self.random.sample(items, &self.config)
    }

    pub fn random(&mut self) -> &mut RandomDecisionSource {
        &mut self.random
    }

    pub fn add_log(&mut self, entry: OperationEntry) {
        debug!("{}", entry);
        self.log.push(entry);
    }

    pub fn operation_log(&self) -> &OperationLog {
        &self.log
    }

    pub fn clear_operation_logs(&mut self) {
        self.log.clear();
    }

    pub fn registry(&self) -> &MutatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MutatorRegistry {
        &mut self.registry
    }

    /// One registered mutator for `T`, chosen uniformly
    pub fn mutator<T: Registered>(&mut self) -> Result<Option<Arc<dyn Mutator<T>>>, FuzzError> {
        self.registry.get::<T>(&mut self.random)
    }

    pub fn apply_intensity(&mut self, intensity: Intensity) {
        self.config.set_intensity(intensity);
    }

    /// Copy the intensity knobs back from the base configuration
    pub fn reset_intensity(&mut self) {
        let base = self.base_config.intensity();
        self.config.set_intensity(base);
    }

    /// Run a registered mutator over an optional field.
    ///
    /// Returns whether a mutator was found.
    pub fn fuzz_field<T: Registered>(&mut self, field: &mut Option<T>) -> Result<bool, FuzzError> {
        let Some(mutator) = self.mutator::<T>()? else {
            return Ok(false);
        };
        mutator.mutate_field(self, &mut FieldSlot::new(field))?;
        Ok(true)
    }

    /// Like [`FuzzerContext::fuzz_field`], but an absent field is always
    /// fabricated
    pub fn fuzz_optional_field<T: Registered>(&mut self, field: &mut Option<T>) -> Result<bool, FuzzError> {
        let Some(mutator) = self.mutator::<T>()? else {
            return Ok(false);
        };
        mutator.mutate_optional(self, &mut FieldSlot::new(field))?;
        Ok(true)
    }

    /// Fresh value from a registered mutator, if there is one
    pub fn fabricate<T: Registered>(&mut self) -> Result<Option<T>, FuzzError> {
        match self.mutator::<T>()? {
            Some(mutator) => mutator.generate_random(self).map(Some),
            None => Ok(None),
        }
    }

    /// Mutate a repeated field: each element may be dropped, duplicated or
    /// mutated; an empty list may gain a fabricated element.
    pub fn fuzz_list<T: Registered + Clone>(&mut self, label: &str, items: &mut Vec<T>) -> Result<(), FuzzError> {
        let Some(mutator) = self.mutator::<T>()? else {
            return Ok(());
        };

        if items.is_empty() {
            if self.should_fuzz() {
                items.push(mutator.generate_random(self)?);
                self.add_log(OperationEntry::event(format!("Add element to empty {}", label)));
            }
            return Ok(());
        }

        let mut result = Vec::with_capacity(items.len());
        for (index, item) in std::mem::take(items).into_iter().enumerate() {
            if !self.should_fuzz_part() {
                result.push(item);
                continue;
            }
            match self.random.bounded_index(3) {
                0 => {
                    self.add_log(OperationEntry::event(format!("Remove {}[{}]", label, index)));
                }
                1 => {
                    result.push(item.clone());
                    result.push(item);
                    self.add_log(OperationEntry::event(format!("Duplicate {}[{}]", label, index)));
                }
                _ => {
                    let mut holder = Some(item);
                    mutator.mutate_field(self, &mut FieldSlot::new(&mut holder))?;
                    result.extend(holder);
                }
            }
        }
        *items = result;
        Ok(())
    }

    fn text_mutator(&self, kind: TextKind) -> Arc<dyn Mutator<String>> {
        match kind {
            TextKind::Plain => Arc::clone(&self.string_mutator),
            TextKind::Url => Arc::clone(&self.url_mutator),
            TextKind::Id => Arc::clone(&self.id_mutator),
            TextKind::Language => Arc::clone(&self.language_mutator),
        }
    }

    /// Mutate an optional text field with the built-in mutator for `kind`
    pub fn fuzz_text(&mut self, kind: TextKind, label: &str, field: &mut Option<String>) -> Result<(), FuzzError> {
        let before = field.clone();
        self.text_mutator(kind)
            .mutate_optional(self, &mut FieldSlot::new(field))?;
        self.add_log(OperationEntry::new(format!("Mutate {}", label), before, field.clone()));
        Ok(())
    }

    /// Mutate some elements of a repeated text field
    pub fn fuzz_texts(&mut self, kind: TextKind, label: &str, items: &mut Vec<String>) -> Result<(), FuzzError> {
        let mutator = self.text_mutator(kind);
        if items.is_empty() {
            if self.should_fuzz() {
                let fresh = mutator.generate_random(self)?;
                self.add_log(OperationEntry::new(format!("Add to {}", label), None, Some(fresh.clone())));
                items.push(fresh);
            }
            return Ok(());
        }
        for (index, item) in items.iter_mut().enumerate() {
            if !self.should_fuzz_part() {
                continue;
            }
            let before = item.clone();
            *item = mutator.mutate(self, std::mem::take(item))?;
            self.add_log(OperationEntry::new(
                format!("Mutate {}[{}]", label, index),
                Some(before),
                Some(item.clone()),
            ));
        }
        Ok(())
    }

    pub fn generate_text(&mut self, kind: TextKind) -> Result<String, FuzzError> {
        self.text_mutator(kind).generate_random(self)
    }

    pub fn fuzz_int(&mut self, label: &str, field: &mut Option<i32>) -> Result<(), FuzzError> {
        let before = *field;
        let mutator = Arc::clone(&self.int_mutator);
        mutator.mutate_optional(self, &mut FieldSlot::new(field))?;
        self.add_log(OperationEntry::new(format!("Mutate {}", label), describe(&before), describe(field)));
        Ok(())
    }

    pub fn generate_int(&mut self) -> Result<i32, FuzzError> {
        let mutator = Arc::clone(&self.int_mutator);
        mutator.generate_random(self)
    }

    /// Replace a date with a random one, sometimes from before 2000
    pub fn fuzz_date(&mut self, label: &str, field: &mut Option<DateTime<Utc>>) -> Result<(), FuzzError> {
        let skew = if self.should_fuzz_part() { 1 } else { DEFAULT_DATE_SKEW };
        let before = describe(field);
        *field = Some(self.random.bounded_date(skew));
        self.add_log(OperationEntry::new(format!("Mutate {}", label), before, describe(field)));
        Ok(())
    }

    /// Switch a coded field to another variant
    pub fn fuzz_enum<E: Enumerated>(&mut self, label: &str, field: &mut Option<E>) -> Result<(), FuzzError> {
        let before = *field;
        let excluding: Vec<E> = before.into_iter().collect();
        *field = Some(self.random.uniform_enum(&excluding)?);
        self.add_log(OperationEntry::new(format!("Mutate {}", label), describe(&before), describe(field)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_types::{Coding, Gender, Identifier};

    fn context(config: FuzzConfig) -> FuzzerContext {
        FuzzerContext::seeded(config, 23)
    }

    #[test]
    fn test_nan_config_is_normalized() {
        let ctx = context(FuzzConfig {
            percent_of_each: f64::NAN,
            ..Default::default()
        });
        assert_eq!(ctx.config().percent_of_each, crate::constants::DEFAULT_PERCENT);
    }

    #[test]
    fn test_intensity_reset_copies_from_base() {
        let mut ctx = context(FuzzConfig::default());
        let raised = ctx.config().intensity().escalated(3.0);
        ctx.apply_intensity(raised);
        assert_eq!(ctx.config().percent_of_all, 8.0);
        assert_eq!(ctx.base_config().percent_of_all, 5.0);
        ctx.reset_intensity();
        assert_eq!(ctx.config(), ctx.base_config());
    }

    #[test]
    fn test_fuzz_field_miss_leaves_field_untouched() {
        let mut ctx = context(FuzzConfig::default());
        ctx.registry_mut().clear();
        let mut identifier = Some(Identifier::default());
        assert!(!ctx.fuzz_field(&mut identifier).unwrap());
        assert_eq!(identifier, Some(Identifier::default()));
    }

    #[test]
    fn test_fuzz_field_fabricates_at_full_intensity() {
        let mut ctx = context(FuzzConfig {
            percent_of_all: 100.0,
            ..Default::default()
        });
        let mut coding: Option<Coding> = None;
        assert!(ctx.fuzz_field(&mut coding).unwrap());
        assert!(coding.is_some());
    }

    #[test]
    fn test_fuzz_optional_field_fabricates_absent_value() {
        let mut ctx = context(FuzzConfig {
            percent_of_all: 0.0,
            ..Default::default()
        });
        let mut identifier: Option<Identifier> = None;
        assert!(ctx.fuzz_optional_field(&mut identifier).unwrap());
        assert!(identifier.is_some());

        let mut absent: Option<Identifier> = None;
        assert!(!ctx.fuzz_field(&mut absent).unwrap());
        assert!(absent.is_none());

        ctx.registry_mut().clear();
        let mut missing: Option<Identifier> = None;
        assert!(!ctx.fuzz_optional_field(&mut missing).unwrap());
        assert!(missing.is_none());
    }

    #[test]
    fn test_fuzz_texts_fills_empty_list_only_when_trial_passes() {
        let mut ctx = context(FuzzConfig {
            percent_of_all: 0.0,
            ..Default::default()
        });
        let mut lines: Vec<String> = Vec::new();
        ctx.fuzz_texts(TextKind::Plain, "lines", &mut lines).unwrap();
        assert!(lines.is_empty());
        assert!(ctx.operation_log().is_empty());

        let mut ctx = context(FuzzConfig {
            percent_of_all: 100.0,
            ..Default::default()
        });
        ctx.fuzz_texts(TextKind::Plain, "lines", &mut lines).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(ctx
            .operation_log()
            .iter()
            .any(|entry| entry.description == "Add to lines"));
    }

    #[test]
    fn test_fuzz_list_keeps_list_when_parts_are_never_chosen() {
        let mut ctx = context(FuzzConfig {
            percent_of_each: 0.0,
            ..Default::default()
        });
        let mut codings = vec![Coding::default(), Coding::default()];
        ctx.fuzz_list("codings", &mut codings).unwrap();
        assert_eq!(codings.len(), 2);
    }

    #[test]
    fn test_fuzz_list_fills_empty_list() {
        let mut ctx = context(FuzzConfig {
            percent_of_all: 100.0,
            ..Default::default()
        });
        let mut codings: Vec<Coding> = Vec::new();
        ctx.fuzz_list("codings", &mut codings).unwrap();
        assert_eq!(codings.len(), 1);
        assert!(ctx
            .operation_log()
            .iter()
            .any(|entry| entry.description == "Add element to empty codings"));
    }

    #[test]
    fn test_fuzz_enum_changes_variant() {
        let mut ctx = context(FuzzConfig::default());
        let mut gender = Some(Gender::Male);
        for _ in 0..20 {
            let before = gender;
            ctx.fuzz_enum("gender", &mut gender).unwrap();
            assert_ne!(gender, before);
        }
    }

    #[test]
    fn test_fuzz_text_logs_before_and_after() {
        let mut ctx = context(FuzzConfig::default());
        let mut id = Some("abc".to_string());
        ctx.fuzz_text(TextKind::Id, "id", &mut id).unwrap();
        let entry = ctx.operation_log().iter().last().unwrap().clone();
        assert_eq!(entry.description, "Mutate id");
        assert_eq!(entry.before.as_deref(), Some("abc"));
        assert_eq!(entry.after, id);
    }

    #[test]
    fn test_fuzz_date_sets_value() {
        let mut ctx = context(FuzzConfig::default());
        let mut date = None;
        ctx.fuzz_date("date", &mut date).unwrap();
        assert!(date.is_some());
    }
}
