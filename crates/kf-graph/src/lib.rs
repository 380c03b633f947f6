#![forbid(unsafe_code)]

//! Relationship derivation, id remapping and the end-to-end conversion.

mod relationships;
mod remap;

use kf_core::{
    ConfigError, ConversionStats, ConversionWarning, ConvertConfig, Gender, IdMapping, Person,
    Relationship, RelationshipKind,
};
use kf_parser::{extract, parse};
use serde::Serialize;
use tracing::debug;

pub use relationships::build_relationships;
pub use remap::{Remapped, build_id_mapping, remap};

/// Everything one GEDCOM document converts into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub people: Vec<Person>,
    pub relationships: Vec<Relationship>,
    /// Placeholder list; source citations are not carried over.
    pub sources: Vec<serde_json::Value>,
    pub id_mapping: IdMapping,
    pub warnings: Vec<ConversionWarning>,
    pub stats: ConversionStats,
}

impl Conversion {
    /// People whose name parts equal every part given in `query`.
    pub fn find<'a>(&'a self, query: &'a NameQuery) -> impl Iterator<Item = &'a Person> + 'a {
        self.people.iter().filter(move |person| query.matches(person))
    }
}

/// Exact-match filter over first, middle and last names. Unset parts match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameQuery {
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

impl NameQuery {
    #[must_use]
    pub fn matches(&self, person: &Person) -> bool {
        self.first
            .as_deref()
            .is_none_or(|first| person.first_name == first)
            && self
                .middle
                .as_deref()
                .is_none_or(|middle| person.middle_name.as_deref() == Some(middle))
            && self
                .last
                .as_deref()
                .is_none_or(|last| person.last_name == last)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first.is_none() && self.middle.is_none() && self.last.is_none()
    }
}

/// Convert with the default settings.
#[must_use]
pub fn convert(input: &str) -> Conversion {
    run(input, &ConvertConfig::default())
}

/// Convert with custom settings.
///
/// # Errors
/// Returns the [`ConfigError`] from [`ConvertConfig::validate`]; the
/// conversion itself cannot fail.
pub fn convert_with_config(input: &str, config: &ConvertConfig) -> Result<Conversion, ConfigError> {
    config.validate()?;
    Ok(run(input, config))
}

fn run(input: &str, config: &ConvertConfig) -> Conversion {
    let parsed = parse(input);
    let extraction = extract(&parsed.records, config);
    let relationships = build_relationships(&extraction.families, config);
    debug!(
        people = extraction.people.len(),
        families = extraction.families.len(),
        relationships = relationships.len(),
        "derived relationships"
    );

    let remapped = remap(extraction.people, relationships, config);
    let mut warnings = parsed.warnings;
    warnings.extend(remapped.warnings);

    let mut stats = relationship_stats(&remapped.people, &remapped.relationships);
    stats.individual_records = parsed.records.individuals.len();
    stats.family_records = parsed.records.families.len();
    stats.source_records = parsed.records.sources.len();
    stats.warnings = warnings.len();

    Conversion {
        people: remapped.people,
        relationships: remapped.relationships,
        sources: Vec::new(),
        id_mapping: remapped.id_mapping,
        warnings,
        stats,
    }
}

/// Output-side counts; the record counts are left at zero.
#[must_use]
pub fn relationship_stats(people: &[Person], relationships: &[Relationship]) -> ConversionStats {
    let mut stats = ConversionStats {
        people: people.len(),
        relationships: relationships.len(),
        ..ConversionStats::default()
    };
    for person in people {
        match person.gender {
            Some(Gender::Male) => stats.males += 1,
            Some(Gender::Female) => stats.females += 1,
            None => stats.unknown_gender += 1,
        }
    }
    for relationship in relationships {
        match relationship.kind {
            RelationshipKind::Spouse { .. } => stats.spouse_relationships += 1,
            RelationshipKind::ParentChild { .. } => stats.parent_child_relationships += 1,
        }
    }
    stats
}
