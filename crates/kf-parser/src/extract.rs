//! Typed people and families from raw record trees.

use kf_core::{EventFact, Family, Gender, Person, Residence, strip_xref};
use serde::Serialize;

use crate::date::DateNormalizer;
use crate::records::{RawEntry, RawRecord};

/// A person plus the family pointers needed to derive relationships.
///
/// `person.id` is the stripped source id until the identifier remap runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub person: Person,
    /// Raw `FAMC` values, `@` markers retained.
    pub family_as_child_ids: Vec<String>,
    /// Raw `FAMS` values, `@` markers retained.
    pub family_as_spouse_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedName {
    pub first: String,
    pub middle: Option<String>,
    pub last: String,
}

/// Split a `NAME` value. The first `/.../` segment is the surname; the given
/// names come from `given` when a `GIVN` sub-tag supplied one, otherwise from
/// the full value with every slash segment removed.
#[must_use]
pub fn parse_name(full: &str, given: Option<&str>) -> ParsedName {
    let last = surname(full).unwrap_or_default().to_string();
    let given = match given {
        Some(given) => given.to_string(),
        None => remove_surname_segments(full),
    };

    let mut parts = given.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = parts.collect();
    let middle = (!rest.is_empty()).then(|| rest.join(" "));

    ParsedName { first, middle, last }
}

fn surname(full: &str) -> Option<&str> {
    let open = full.find('/')?;
    let tail = &full[open + 1..];
    let close = tail.find('/')?;
    Some(&tail[..close])
}

fn remove_surname_segments(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut rest = full;
    while let Some(open) = rest.find('/') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('/') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &after_open[close + 1..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn event_fact(entry: Option<&RawEntry>, dates: &DateNormalizer) -> EventFact {
    let Some(entry) = entry else {
        return EventFact::default();
    };
    EventFact {
        date: entry.first_sub("DATE").and_then(|raw| dates.normalize(raw)),
        place: entry.first_sub("PLAC").map(str::to_string),
    }
}

/// Surname of the first `NAME` after the primary one whose `TYPE` is
/// `maiden`, compared case-insensitively.
#[must_use]
pub fn maiden_name(record: &RawRecord) -> Option<String> {
    record
        .entries("NAME")
        .iter()
        .skip(1)
        .find(|entry| {
            entry
                .first_sub("TYPE")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("maiden"))
        })
        .and_then(|entry| surname(&entry.value))
        .map(str::to_string)
}

/// Build a person from an `INDI` record. Missing data leaves fields at
/// their defaults; extraction never fails. `maidenName` is left unset, see
/// [`maiden_name`].
#[must_use]
pub fn extract_person(record: &RawRecord, dates: &DateNormalizer) -> PersonRecord {
    let mut person = Person::new(strip_xref(&record.source_id));

    if let Some(name) = record.first("NAME") {
        let parsed = parse_name(&name.value, name.first_sub("GIVN"));
        person.first_name = parsed.first;
        person.middle_name = parsed.middle;
        person.last_name = parsed.last;
    }

    person.gender = record
        .first("SEX")
        .and_then(|entry| Gender::from_sex_code(&entry.value));

    person.birth = event_fact(record.first("BIRT"), dates);
    person.death = event_fact(record.first("DEAT"), dates);

    let notes: Vec<&str> = record
        .entries("NOTE")
        .iter()
        .map(|entry| entry.value.as_str())
        .filter(|value| !value.is_empty())
        .collect();
    person.notes = (!notes.is_empty()).then(|| notes.join(" "));

    person.residences = record
        .entries("RESI")
        .iter()
        .map(|entry| Residence {
            date: entry.first_sub("DATE").map(|raw| dates.normalize(raw)),
            place: entry.first_sub("PLAC").map(str::to_string),
        })
        .filter(|residence| !residence.is_empty())
        .collect();

    let pointers = |tag: &str| -> Vec<String> {
        record
            .entries(tag)
            .iter()
            .map(|entry| entry.value.clone())
            .collect()
    };

    PersonRecord {
        family_as_child_ids: pointers("FAMC"),
        family_as_spouse_ids: pointers("FAMS"),
        person,
    }
}

fn pointer(value: &str) -> Option<String> {
    let id = strip_xref(value.trim());
    (!id.is_empty()).then_some(id)
}

/// Build a family from a `FAM` record, stripping `@` from every pointer.
///
/// Empty `HUSB` and `WIFE` values count as absent. Empty `CHIL` values are
/// dropped rather than kept as `""` children, so they produce no edges.
#[must_use]
pub fn extract_family(record: &RawRecord, dates: &DateNormalizer) -> Family {
    let marriage = record.first("MARR");
    let divorce = record.first("DIV");

    Family {
        id: strip_xref(&record.source_id),
        husband_id: record.first("HUSB").and_then(|entry| pointer(&entry.value)),
        wife_id: record.first("WIFE").and_then(|entry| pointer(&entry.value)),
        children_ids: record
            .entries("CHIL")
            .iter()
            .filter_map(|entry| pointer(&entry.value))
            .collect(),
        marriage_date: marriage
            .and_then(|entry| entry.first_sub("DATE"))
            .and_then(|raw| dates.normalize(raw)),
        marriage_place: marriage
            .and_then(|entry| entry.first_sub("PLAC"))
            .map(str::to_string),
        divorce_date: divorce
            .and_then(|entry| entry.first_sub("DATE"))
            .and_then(|raw| dates.normalize(raw)),
    }
}

#[cfg(test)]
mod tests {
    use kf_core::Gender;

    use super::{ParsedName, extract_family, extract_person, maiden_name, parse_name};
    use crate::date::DateNormalizer;
    use crate::lexer::tokenize;
    use crate::records::{RecordTree, build_records};

    fn tree(input: &str) -> RecordTree {
        build_records(&tokenize(input)).0
    }

    #[test]
    fn name_without_givn_splits_first_and_middle() {
        assert_eq!(
            parse_name("John Robert /Smith/", None),
            ParsedName {
                first: "John".to_string(),
                middle: Some("Robert".to_string()),
                last: "Smith".to_string(),
            }
        );
    }

    #[test]
    fn givn_overrides_the_name_value() {
        let parsed = parse_name("Jack /Smith/", Some("John  Robert Lee"));
        assert_eq!(parsed.first, "John");
        assert_eq!(parsed.middle.as_deref(), Some("Robert Lee"));
        assert_eq!(parsed.last, "Smith");
    }

    #[test]
    fn odd_names_degrade_to_empty_strings() {
        assert_eq!(parse_name("", None), ParsedName::default());
        assert_eq!(
            parse_name("/Smith/", None),
            ParsedName {
                last: "Smith".to_string(),
                ..ParsedName::default()
            }
        );
        let no_surname = parse_name("Mary Ann", None);
        assert_eq!(no_surname.first, "Mary");
        assert_eq!(no_surname.middle.as_deref(), Some("Ann"));
        assert_eq!(no_surname.last, "");

        let unclosed = parse_name("Ann /Smi", None);
        assert_eq!(unclosed.first, "Ann");
        assert_eq!(unclosed.middle.as_deref(), Some("/Smi"));
        assert_eq!(unclosed.last, "");
    }

    #[test]
    fn name_with_trailing_given_text_and_two_slash_groups() {
        let parsed = parse_name("John /Smith/ Jr /Second/", None);
        assert_eq!(parsed.last, "Smith");
        assert_eq!(parsed.first, "John");
        assert_eq!(parsed.middle.as_deref(), Some("Jr"));
    }

    #[test]
    fn extracts_a_full_person() {
        let records = tree(
            "\
0 @I1@ INDI
1 NAME Mary Ellen /Jones/
1 SEX F
1 BIRT
2 DATE ABT 1850
2 DATE 1851
2 PLAC Boston
1 DEAT
2 DATE 3 Apr 1920
1 NOTE first
1 NOTE
1 NOTE second
1 RESI
2 DATE 1900
1 RESI
2 NOTE nothing useful
1 RESI
2 PLAC Ohio
1 FAMC @F1@
1 FAMS @F2@
1 FAMS @F3@
",
        );
        let record = extract_person(
            records.individuals.get("@I1@").expect("record"),
            &DateNormalizer::default(),
        );
        let person = &record.person;

        assert_eq!(person.id, "I1");
        assert_eq!(person.first_name, "Mary");
        assert_eq!(person.middle_name.as_deref(), Some("Ellen"));
        assert_eq!(person.last_name, "Jones");
        assert_eq!(person.gender, Some(Gender::Female));
        assert_eq!(person.birth.date.as_deref(), Some("circa 1850"));
        assert_eq!(person.birth.place.as_deref(), Some("Boston"));
        assert_eq!(person.death.date.as_deref(), Some("April 3, 1920"));
        assert_eq!(person.death.place, None);
        assert_eq!(person.notes.as_deref(), Some("first second nothing useful"));
        assert_eq!(person.residences.len(), 2);
        assert_eq!(person.residences[0].date_text(), Some("1900"));
        assert_eq!(person.residences[1].place.as_deref(), Some("Ohio"));
        assert_eq!(person.profile_photo, None);
        assert_eq!(record.family_as_child_ids, vec!["@F1@"]);
        assert_eq!(record.family_as_spouse_ids, vec!["@F2@", "@F3@"]);
    }

    #[test]
    fn residence_is_kept_when_a_date_or_place_tag_exists() {
        let records = tree("0 @I1@ INDI\n1 RESI\n2 DATE\n1 RESI\n2 PLAC\n1 RESI\n2 NOTE moved\n");
        let record = extract_person(
            records.individuals.get("@I1@").expect("record"),
            &DateNormalizer::default(),
        );
        let residences = &record.person.residences;

        assert_eq!(residences.len(), 2);
        assert_eq!(residences[0].date, Some(None));
        assert_eq!(residences[0].place, None);
        assert_eq!(residences[1].date, None);
        assert_eq!(residences[1].place.as_deref(), Some(""));
        assert_eq!(
            serde_json::to_value(residences).expect("json"),
            serde_json::json!([{"date": null}, {"place": ""}])
        );
    }

    #[test]
    fn bare_record_gets_defaults() {
        let records = tree("0 @I7@ INDI\n1 SEX U\n");
        let record = extract_person(
            records.individuals.get("@I7@").expect("record"),
            &DateNormalizer::default(),
        );
        assert_eq!(record.person.first_name, "");
        assert_eq!(record.person.last_name, "");
        assert_eq!(record.person.middle_name, None);
        assert_eq!(record.person.gender, None);
        assert!(record.person.birth.is_empty());
        assert!(record.person.residences.is_empty());
        assert_eq!(record.person.notes, None);
        assert!(record.family_as_child_ids.is_empty());
    }

    #[test]
    fn maiden_name_comes_from_a_typed_alternate_name() {
        let records = tree(
            "\
0 @I1@ INDI
1 NAME Jane /Doe/
1 NAME Jane /Smith/
2 TYPE Maiden
0 @I2@ INDI
1 NAME Ann /Lee/
2 TYPE maiden
1 NAME Ann /Other/
2 TYPE aka
",
        );
        let jane = records.individuals.get("@I1@").expect("I1");
        assert_eq!(maiden_name(jane).as_deref(), Some("Smith"));
        let extracted = extract_person(jane, &DateNormalizer::default());
        assert_eq!(extracted.person.last_name, "Doe");
        assert_eq!(extracted.person.maiden_name, None);

        let ann = records.individuals.get("@I2@").expect("I2");
        assert_eq!(maiden_name(ann), None);
    }

    #[test]
    fn extracts_a_family_with_stripped_pointers() {
        let records = tree(
            "\
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
1 CHIL
1 CHIL @I4@
1 MARR
2 DATE 1 Jun 1910
2 PLAC Chicago
1 DIV
2 DATE 1920
",
        );
        let family = extract_family(
            records.families.get("@F1@").expect("family"),
            &DateNormalizer::default(),
        );
        assert_eq!(family.id, "F1");
        assert_eq!(family.husband_id.as_deref(), Some("I1"));
        assert_eq!(family.wife_id.as_deref(), Some("I2"));
        assert_eq!(family.children_ids, vec!["I3", "I4"]);
        assert_eq!(family.marriage_date.as_deref(), Some("June 1, 1910"));
        assert_eq!(family.marriage_place.as_deref(), Some("Chicago"));
        assert_eq!(family.divorce_date.as_deref(), Some("1920"));
    }

    #[test]
    fn empty_spouse_pointer_counts_as_absent() {
        let records = tree("0 @F2@ FAM\n1 HUSB\n1 WIFE @I9@\n");
        let family = extract_family(
            records.families.get("@F2@").expect("family"),
            &DateNormalizer::default(),
        );
        assert_eq!(family.husband_id, None);
        assert_eq!(family.wife_id.as_deref(), Some("I9"));
        assert!(family.children_ids.is_empty());
        assert_eq!(family.marriage_date, None);
    }
}
