#![forbid(unsafe_code)]

//! Shared data model for the kinfold genealogy converter.
//!
//! Every stage of the pipeline hands one of these structures to the next:
//! the parser produces [`Person`] and [`Family`] entities keyed by their
//! source ids, the graph stage derives [`Relationship`] edges and an
//! [`IdMapping`], and the CLI serializes the result.

mod config;

pub use config::{ConfigError, ConvertConfig, MAX_ID_WIDTH};

use rustc_hash::FxHashMap;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Strip the `@` markers that wrap cross-reference ids (`@I12@` -> `I12`).
#[must_use]
pub fn strip_xref(raw: &str) -> String {
    raw.replace('@', "")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Map a `SEX` value. Only the exact codes `M` and `F` are recognized.
    #[must_use]
    pub fn from_sex_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Date and place of a single life event (birth, death).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EventFact {
    pub date: Option<String>,
    pub place: Option<String>,
}

impl EventFact {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none() && self.place.is_none()
    }
}

/// One `RESI` entry. A key is written only when its sub-tag was present;
/// a present date that normalizes to nothing is written as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Residence {
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl Residence {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none() && self.place.is_none()
    }

    /// The normalized date, whether the key is missing or null.
    #[must_use]
    pub fn date_text(&self) -> Option<&str> {
        self.date.as_ref().and_then(Option::as_deref)
    }
}

/// Keeps an explicit `null` apart from a missing key.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Public person shape. Name fields are never null so consumers can
/// concatenate them without checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub maiden_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth: EventFact,
    pub death: EventFact,
    pub notes: Option<String>,
    pub profile_photo: Option<String>,
    pub residences: Vec<Residence>,
}

impl Person {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Given, middle and last names joined by single spaces, skipping blanks.
    #[must_use]
    pub fn display_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// A family record with its pointers already stripped of `@` markers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub husband_id: Option<String>,
    pub wife_id: Option<String>,
    pub children_ids: Vec<String>,
    pub marriage_date: Option<String>,
    pub marriage_place: Option<String>,
    pub divorce_date: Option<String>,
}

impl Family {
    /// Present parents, husband before wife.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.husband_id
            .as_deref()
            .into_iter()
            .chain(self.wife_id.as_deref())
    }

    /// Both spouse slots, when both are filled.
    #[must_use]
    pub fn couple(&self) -> Option<(&str, &str)> {
        match (self.husband_id.as_deref(), self.wife_id.as_deref()) {
            (Some(husband), Some(wife)) => Some((husband, wife)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    #[serde(flatten)]
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RelationshipKind {
    Spouse {
        person1: String,
        person2: String,
        marriage_date: Option<String>,
        marriage_place: Option<String>,
        divorce_date: Option<String>,
    },
    ParentChild {
        parent: String,
        child: String,
    },
}

impl RelationshipKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spouse { .. } => "spouse",
            Self::ParentChild { .. } => "parent-child",
        }
    }

    /// The two person references carried by the edge.
    #[must_use]
    pub fn endpoints(&self) -> [&str; 2] {
        match self {
            Self::Spouse {
                person1, person2, ..
            } => [person1.as_str(), person2.as_str()],
            Self::ParentChild { parent, child } => [parent.as_str(), child.as_str()],
        }
    }

    pub fn endpoints_mut(&mut self) -> [&mut String; 2] {
        match self {
            Self::Spouse {
                person1, person2, ..
            } => [person1, person2],
            Self::ParentChild { parent, child } => [parent, child],
        }
    }
}

/// Bidirectional table between source ids and generated ids.
///
/// Entries keep insertion order, which is the order people were discovered
/// in the source file; both serialized maps follow that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMapping {
    entries: Vec<(String, String)>,
    by_source: FxHashMap<String, usize>,
    by_new: FxHashMap<String, usize>,
}

impl IdMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `source -> new`. Returns `false` and leaves the table untouched
    /// when either side is already mapped.
    pub fn insert(&mut self, source: impl Into<String>, new: impl Into<String>) -> bool {
        let source = source.into();
        let new = new.into();
        if self.by_source.contains_key(&source) || self.by_new.contains_key(&new) {
            return false;
        }
        let index = self.entries.len();
        self.by_source.insert(source.clone(), index);
        self.by_new.insert(new.clone(), index);
        self.entries.push((source, new));
        true
    }

    #[must_use]
    pub fn new_id(&self, source: &str) -> Option<&str> {
        self.by_source
            .get(source)
            .map(|&index| self.entries[index].1.as_str())
    }

    #[must_use]
    pub fn source_id(&self, new: &str) -> Option<&str> {
        self.by_new
            .get(new)
            .map(|&index| self.entries[index].0.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(source, new)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(source, new)| (source.as_str(), new.as_str()))
    }
}

impl Serialize for IdMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IdMapping", 2)?;
        state.serialize_field(
            "ancestryToNew",
            &OrderedPairs {
                entries: &self.entries,
                inverted: false,
            },
        )?;
        state.serialize_field(
            "newToAncestry",
            &OrderedPairs {
                entries: &self.entries,
                inverted: true,
            },
        )?;
        state.end()
    }
}

struct OrderedPairs<'a> {
    entries: &'a [(String, String)],
    inverted: bool,
}

impl Serialize for OrderedPairs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, new) in self.entries {
            if self.inverted {
                map.serialize_entry(new, source)?;
            } else {
                map.serialize_entry(source, new)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WarningCode {
    DuplicateRecord,
    DanglingReference,
    DuplicatePersonId,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateRecord => "kinfold/warn/duplicate-record",
            Self::DanglingReference => "kinfold/warn/dangling-reference",
            Self::DuplicatePersonId => "kinfold/warn/duplicate-person-id",
        }
    }
}

/// A non-fatal finding. The pipeline never aborts; it reports these instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionWarning {
    pub code: WarningCode,
    pub message: String,
    /// 1-based source line, when the finding is tied to one.
    pub line: Option<usize>,
}

impl ConversionWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Record and output counts for one conversion run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConversionStats {
    pub individual_records: usize,
    pub family_records: usize,
    pub source_records: usize,
    pub people: usize,
    pub relationships: usize,
    pub spouse_relationships: usize,
    pub parent_child_relationships: usize,
    pub males: usize,
    pub females: usize,
    pub unknown_gender: usize,
    pub warnings: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ConversionWarning, EventFact, Family, Gender, IdMapping, Person, Relationship,
        RelationshipKind, Residence, WarningCode, strip_xref,
    };

    #[test]
    fn person_serializes_with_camel_case_keys_and_nulls() {
        let mut person = Person::new("p001");
        person.first_name = "John".to_string();
        person.last_name = "Smith".to_string();
        person.gender = Some(Gender::Male);
        person.residences.push(Residence {
            date: None,
            place: Some("Ohio".to_string()),
        });

        let value = serde_json::to_value(&person).expect("serialize person");
        assert_eq!(
            value,
            json!({
                "id": "p001",
                "firstName": "John",
                "middleName": null,
                "lastName": "Smith",
                "maidenName": null,
                "gender": "male",
                "birth": {"date": null, "place": null},
                "death": {"date": null, "place": null},
                "notes": null,
                "profilePhoto": null,
                "residences": [{"place": "Ohio"}],
            })
        );
    }

    #[test]
    fn person_keys_keep_declaration_order() {
        let encoded = serde_json::to_string(&Person::new("p001")).expect("serialize person");
        let first = encoded.find("\"firstName\"").expect("firstName");
        let middle = encoded.find("\"middleName\"").expect("middleName");
        let last = encoded.find("\"lastName\"").expect("lastName");
        let residences = encoded.find("\"residences\"").expect("residences");
        assert!(first < middle && middle < last && last < residences);
    }

    #[test]
    fn display_name_skips_missing_parts() {
        let mut person = Person::new("p001");
        person.first_name = "Lois".to_string();
        person.last_name = "Stokes".to_string();
        assert_eq!(person.display_name(), "Lois Stokes");

        person.middle_name = Some("Jane".to_string());
        assert_eq!(person.display_name(), "Lois Jane Stokes");

        assert_eq!(Person::new("p002").display_name(), "");
    }

    #[test]
    fn spouse_relationship_is_tagged_and_flattened() {
        let relationship = Relationship {
            id: "r001".to_string(),
            kind: RelationshipKind::Spouse {
                person1: "p001".to_string(),
                person2: "p002".to_string(),
                marriage_date: Some("June 1, 1910".to_string()),
                marriage_place: None,
                divorce_date: None,
            },
        };
        let value = serde_json::to_value(&relationship).expect("serialize spouse");
        assert_eq!(
            value,
            json!({
                "id": "r001",
                "type": "spouse",
                "person1": "p001",
                "person2": "p002",
                "marriageDate": "June 1, 1910",
                "marriagePlace": null,
                "divorceDate": null,
            })
        );
    }

    #[test]
    fn parent_child_relationship_roundtrips() {
        let relationship = Relationship {
            id: "r002".to_string(),
            kind: RelationshipKind::ParentChild {
                parent: "p001".to_string(),
                child: "p003".to_string(),
            },
        };
        let value = serde_json::to_value(&relationship).expect("serialize parent-child");
        assert_eq!(
            value,
            json!({"id": "r002", "type": "parent-child", "parent": "p001", "child": "p003"})
        );
        let decoded: Relationship = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, relationship);
        assert_eq!(decoded.kind.as_str(), "parent-child");
    }

    #[test]
    fn endpoints_mut_rewrites_both_sides() {
        let mut kind = RelationshipKind::ParentChild {
            parent: "I1".to_string(),
            child: "I2".to_string(),
        };
        for endpoint in kind.endpoints_mut() {
            endpoint.insert(0, 'x');
        }
        assert_eq!(kind.endpoints(), ["xI1", "xI2"]);
    }

    #[test]
    fn family_parents_list_husband_first() {
        let family = Family {
            id: "F1".to_string(),
            husband_id: Some("I1".to_string()),
            wife_id: Some("I2".to_string()),
            ..Family::default()
        };
        assert_eq!(family.parents().collect::<Vec<_>>(), vec!["I1", "I2"]);
        assert_eq!(family.couple(), Some(("I1", "I2")));

        let single = Family {
            wife_id: Some("I2".to_string()),
            ..Family::default()
        };
        assert_eq!(single.parents().collect::<Vec<_>>(), vec!["I2"]);
        assert_eq!(single.couple(), None);
    }

    #[test]
    fn id_mapping_lookups_work_both_ways() {
        let mut mapping = IdMapping::new();
        assert!(mapping.insert("I9", "p001"));
        assert!(mapping.insert("I2", "p002"));
        assert!(!mapping.insert("I9", "p003"));
        assert!(!mapping.insert("I7", "p002"));

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.new_id("I2"), Some("p002"));
        assert_eq!(mapping.source_id("p001"), Some("I9"));
        assert_eq!(mapping.new_id("I7"), None);
    }

    #[test]
    fn id_mapping_serializes_in_discovery_order() {
        let mut mapping = IdMapping::new();
        mapping.insert("I9", "p001");
        mapping.insert("I2", "p002");

        let encoded = serde_json::to_string(&mapping).expect("serialize mapping");
        assert_eq!(
            encoded,
            r#"{"ancestryToNew":{"I9":"p001","I2":"p002"},"newToAncestry":{"p001":"I9","p002":"I2"}}"#
        );
    }

    #[test]
    fn empty_id_mapping_serializes_two_empty_tables() {
        let encoded = serde_json::to_string(&IdMapping::new()).expect("serialize mapping");
        assert_eq!(encoded, r#"{"ancestryToNew":{},"newToAncestry":{}}"#);
    }

    #[test]
    fn strip_xref_removes_every_marker() {
        assert_eq!(strip_xref("@I12@"), "I12");
        assert_eq!(strip_xref("I12"), "I12");
        assert_eq!(strip_xref(""), "");
    }

    #[test]
    fn gender_codes_are_exact() {
        assert_eq!(Gender::from_sex_code("M"), Some(Gender::Male));
        assert_eq!(Gender::from_sex_code("F"), Some(Gender::Female));
        assert_eq!(Gender::from_sex_code("m"), None);
        assert_eq!(Gender::from_sex_code("U"), None);
        assert_eq!(Gender::Female.as_str(), "female");
    }

    #[test]
    fn warning_code_strings_are_stable() {
        assert_eq!(
            WarningCode::DuplicateRecord.as_str(),
            "kinfold/warn/duplicate-record"
        );
        assert_eq!(
            WarningCode::DanglingReference.as_str(),
            "kinfold/warn/dangling-reference"
        );
        assert_eq!(
            WarningCode::DuplicatePersonId.as_str(),
            "kinfold/warn/duplicate-person-id"
        );
        let warning = ConversionWarning::new(WarningCode::DuplicateRecord, "dup").at_line(4);
        assert_eq!(warning.line, Some(4));
    }

    #[test]
    fn empty_facts_and_residences_report_empty() {
        assert!(EventFact::default().is_empty());
        assert!(Residence::default().is_empty());
        assert!(
            !Residence {
                date: Some(None),
                place: None
            }
            .is_empty()
        );
    }

    #[test]
    fn residence_keeps_a_present_but_empty_date_as_null() {
        let residences = vec![
            Residence {
                date: Some(None),
                place: None,
            },
            Residence {
                date: None,
                place: Some(String::new()),
            },
            Residence {
                date: Some(Some("1900".to_string())),
                place: None,
            },
        ];

        let value = serde_json::to_value(&residences).expect("serialize residences");
        assert_eq!(
            value,
            json!([{"date": null}, {"place": ""}, {"date": "1900"}])
        );

        let decoded: Vec<Residence> = serde_json::from_value(value).expect("decode residences");
        assert_eq!(decoded, residences);
        assert_eq!(decoded[0].date_text(), None);
        assert_eq!(decoded[2].date_text(), Some("1900"));
    }
}
