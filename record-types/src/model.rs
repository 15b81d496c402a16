//! Document tree of a medical record.
//!
//! A [`Document`] is a rooted container holding an ordered list of
//! [`Entry`] values. Every entry wraps exactly one [`Element`]; one of the
//! element kinds is itself a nested [`Document`].

use crate::enumerated::*;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<IdentifierUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanName {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<NameUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<AddressUse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Repeat rule of a dosage timing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRepeat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_unit: Option<UnitOfTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_repeat: Option<TimingRepeat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CompositionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualification: Vec<Coding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CoverageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payor: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_lot: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,
}

/// The element wrapped by a document entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Element {
    Composition(Composition),
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Coverage(Coverage),
    Medication(Medication),
    MedicationRequest(MedicationRequest),
    Document(Box<Document>),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Composition(_) => ElementKind::Composition,
            Element::Patient(_) => ElementKind::Patient,
            Element::Practitioner(_) => ElementKind::Practitioner,
            Element::Organization(_) => ElementKind::Organization,
            Element::Coverage(_) => ElementKind::Coverage,
            Element::Medication(_) => ElementKind::Medication,
            Element::MedicationRequest(_) => ElementKind::MedicationRequest,
            Element::Document(_) => ElementKind::Document,
        }
    }

    /// Id of the wrapped element, if it carries one
    pub fn id(&self) -> Option<&str> {
        match self {
            Element::Composition(r) => r.id.as_deref(),
            Element::Patient(r) => r.id.as_deref(),
            Element::Practitioner(r) => r.id.as_deref(),
            Element::Organization(r) => r.id.as_deref(),
            Element::Coverage(r) => r.id.as_deref(),
            Element::Medication(r) => r.id.as_deref(),
            Element::MedicationRequest(r) => r.id.as_deref(),
            Element::Document(d) => d.id.as_deref(),
        }
    }
}

/// Supported element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Composition,
    Patient,
    Practitioner,
    Organization,
    Coverage,
    Medication,
    MedicationRequest,
    Document,
}

impl ElementKind {
    /// Kinds that do not contain further entries
    pub const LEAVES: [ElementKind; 7] = [
        ElementKind::Composition,
        ElementKind::Patient,
        ElementKind::Practitioner,
        ElementKind::Organization,
        ElementKind::Coverage,
        ElementKind::Medication,
        ElementKind::MedicationRequest,
    ];

    pub fn is_container(&self) -> bool {
        matches!(self, ElementKind::Document)
    }
}

impl Enumerated for ElementKind {
    fn variants() -> &'static [Self] {
        &[
            ElementKind::Composition,
            ElementKind::Patient,
            ElementKind::Practitioner,
            ElementKind::Organization,
            ElementKind::Coverage,
            ElementKind::Medication,
            ElementKind::MedicationRequest,
            ElementKind::Document,
        ]
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(rename = "resource")]
    pub element: Element,
}

impl Entry {
    pub fn new(element: Element) -> Self {
        Self { full_url: None, element }
    }
}

/// Root container of a medical record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(rename = "entry", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, element: Element) -> Self {
        self.entries.push(Entry::new(element));
        self
    }

    /// Number of entries in this document and all nested documents
    pub fn entry_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match &entry.element {
                Element::Document(nested) => 1 + nested.entry_count(),
                _ => 1,
            })
            .sum()
    }

    /// Structural problems that make the document unusable downstream.
    ///
    /// This covers the shape of the model only (identifier syntax, language
    /// tags, reference targets); profile rules belong to the real validator.
    pub fn structural_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        self.collect_issues("Document", &mut issues);
        issues
    }

    fn collect_issues(&self, path: &str, issues: &mut Vec<String>) {
        check_id(path, self.id.as_deref(), issues);
        if let Some(identifier) = &self.identifier {
            check_identifier(&format!("{}.identifier", path), identifier, issues);
        }
        if let Some(language) = &self.language {
            if !is_language_tag(language) {
                issues.push(format!("{}.language '{}' is not a language tag", path, language));
            }
        }
        if let Some(meta) = &self.meta {
            for profile in &meta.profile {
                if !is_uri(profile) {
                    issues.push(format!("{}.meta.profile '{}' is not a URI", path, profile));
                }
            }
        }
        if let Some(signature) = &self.signature {
            if let Some(who) = &signature.who {
                check_reference(&format!("{}.signature.who", path), who, issues);
            }
        }

        for (index, entry) in self.entries.iter().enumerate() {
            let entry_path = format!("{}.entry[{}]", path, index);
            if let Some(url) = &entry.full_url {
                if !is_uri(url) {
                    issues.push(format!("{}.fullUrl '{}' is not a URI", entry_path, url));
                }
            }
            check_id(&entry_path, entry.element.id(), issues);
            match &entry.element {
                Element::Document(nested) => nested.collect_issues(&entry_path, issues),
                Element::Patient(patient) => {
                    for identifier in &patient.identifier {
                        check_identifier(&entry_path, identifier, issues);
                    }
                }
                Element::Practitioner(practitioner) => {
                    for identifier in &practitioner.identifier {
                        check_identifier(&entry_path, identifier, issues);
                    }
                }
                Element::Organization(organization) => {
                    for identifier in &organization.identifier {
                        check_identifier(&entry_path, identifier, issues);
                    }
                }
                Element::Composition(composition) => {
                    if let Some(subject) = &composition.subject {
                        check_reference(&entry_path, subject, issues);
                    }
                }
                Element::Coverage(coverage) => {
                    if let Some(beneficiary) = &coverage.beneficiary {
                        check_reference(&entry_path, beneficiary, issues);
                    }
                }
                Element::MedicationRequest(request) => {
                    if let Some(subject) = &request.subject {
                        check_reference(&entry_path, subject, issues);
                    }
                }
                Element::Medication(_) => {}
            }
        }
    }
}

/// Ids are 1-64 characters of `[A-Za-z0-9\-\.]`
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Accepts `xx`, `xxx` and `xx-YY` style tags
pub fn is_language_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or_default();
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    match (parts.next(), parts.next()) {
        (None, _) => true,
        (Some(region), None) => {
            region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase())
        }
        _ => false,
    }
}

pub fn is_uri(value: &str) -> bool {
    (value.starts_with("https://") || value.starts_with("http://") || value.starts_with("urn:"))
        && !value.chars().any(char::is_whitespace)
}

fn check_id(path: &str, id: Option<&str>, issues: &mut Vec<String>) {
    if let Some(id) = id {
        if !is_valid_id(id) {
            issues.push(format!("{}.id '{}' is not a valid id", path, id));
        }
    }
}

fn check_identifier(path: &str, identifier: &Identifier, issues: &mut Vec<String>) {
    if let Some(system) = &identifier.system {
        if !is_uri(system) {
            issues.push(format!("{} identifier system '{}' is not a URI", path, system));
        }
    }
    if let Some(value) = &identifier.value {
        if value.trim().is_empty() {
            issues.push(format!("{} identifier value is blank", path));
        }
    }
}

fn check_reference(path: &str, reference: &Reference, issues: &mut Vec<String>) {
    if let Some(target) = &reference.reference {
        let well_formed = is_uri(target)
            || target
                .split_once('/')
                .map(|(kind, id)| !kind.is_empty() && is_valid_id(id))
                .unwrap_or(false);
        if !well_formed {
            issues.push(format!("{} reference '{}' is malformed", path, target));
        }
    }
}
