//! Replacement of source-system ids with sequential ones.

use kf_core::{
    ConversionWarning, ConvertConfig, IdMapping, Person, Relationship, WarningCode,
};
use kf_parser::PersonRecord;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Remapped {
    pub people: Vec<Person>,
    pub relationships: Vec<Relationship>,
    pub id_mapping: IdMapping,
    pub warnings: Vec<ConversionWarning>,
}

/// Number people in discovery order: the first gets ordinal 1.
///
/// A source id seen twice keeps its first assignment and produces a
/// `duplicate-person-id` warning.
#[must_use]
pub fn build_id_mapping(
    people: &[PersonRecord],
    config: &ConvertConfig,
) -> (IdMapping, Vec<ConversionWarning>) {
    let mut mapping = IdMapping::new();
    let mut warnings = Vec::new();
    let mut next_ordinal = 1;

    for record in people {
        let source = record.person.id.as_str();
        if let Some(existing) = mapping.new_id(source) {
            warnings.push(ConversionWarning::new(
                WarningCode::DuplicatePersonId,
                format!("person {source} appears more than once; keeping {existing}"),
            ));
            continue;
        }
        mapping.insert(source, config.person_id(next_ordinal));
        next_ordinal += 1;
    }

    (mapping, warnings)
}

/// Rewrite every person id and relationship endpoint through the mapping.
///
/// Endpoints without a mapped person are left as they are. When
/// `report_dangling_references` is set, each one is also reported.
#[must_use]
pub fn remap(
    people: Vec<PersonRecord>,
    mut relationships: Vec<Relationship>,
    config: &ConvertConfig,
) -> Remapped {
    let (id_mapping, mut warnings) = build_id_mapping(&people, config);

    let people = people
        .into_iter()
        .map(|record| {
            let mut person = record.person;
            if let Some(new_id) = id_mapping.new_id(&person.id) {
                person.id = new_id.to_string();
            }
            person
        })
        .collect();

    for relationship in &mut relationships {
        for endpoint in relationship.kind.endpoints_mut() {
            match id_mapping.new_id(endpoint) {
                Some(new_id) => *endpoint = new_id.to_string(),
                None if config.report_dangling_references => {
                    warn!(
                        relationship = %relationship.id,
                        reference = %endpoint,
                        "relationship points at an unknown person"
                    );
                    warnings.push(ConversionWarning::new(
                        WarningCode::DanglingReference,
                        format!(
                            "relationship {} references unknown person {endpoint}",
                            relationship.id
                        ),
                    ));
                }
                None => {}
            }
        }
    }

    Remapped {
        people,
        relationships,
        id_mapping,
        warnings,
    }
}
