#![forbid(unsafe_code)]

//! GEDCOM text to typed genealogy entities.
//!
//! Parsing runs in three steps: [`tokenize`] recognizes one line at a time,
//! [`build_records`] folds the tokens into per-record tag trees, and
//! [`extract`] turns those trees into [`PersonRecord`]s and
//! [`Family`](kf_core::Family) values with normalized dates.

mod date;
mod extract;
mod lexer;
mod records;

use kf_core::{ConversionWarning, ConvertConfig, Family};
use serde::Serialize;
use tracing::debug;

pub use date::{DateNormalizer, normalize_date};
pub use extract::{
    ParsedName, PersonRecord, extract_family, extract_person, maiden_name, parse_name,
};
pub use lexer::{Token, tokenize, tokenize_line};
pub use records::{
    RawEntry, RawRecord, RecordBuilder, RecordKind, RecordSet, RecordTree, build_records,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub records: RecordTree,
    pub warnings: Vec<ConversionWarning>,
    /// Lines that matched the line grammar.
    pub token_count: usize,
}

/// Tokenize and assemble records. Never fails; bad lines are skipped.
#[must_use]
pub fn parse(input: &str) -> ParseResult {
    let tokens = tokenize(input);
    let (records, warnings) = build_records(&tokens);

    debug!(
        tokens = tokens.len(),
        individuals = records.individuals.len(),
        families = records.families.len(),
        sources = records.sources.len(),
        "parsed GEDCOM records"
    );

    ParseResult {
        records,
        warnings,
        token_count: tokens.len(),
    }
}

/// People and families in record order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub people: Vec<PersonRecord>,
    pub families: Vec<Family>,
}

/// Extract every person and family, dating events with the configured
/// two-digit-year pivot. Maiden names are looked up only when
/// `config.maiden_names` is set.
#[must_use]
pub fn extract(records: &RecordTree, config: &ConvertConfig) -> Extraction {
    let dates = DateNormalizer::from_config(config);
    let people = records
        .individuals
        .iter()
        .map(|record| {
            let mut extracted = extract_person(record, &dates);
            if config.maiden_names {
                extracted.person.maiden_name = maiden_name(record);
            }
            extracted
        })
        .collect();
    let families = records
        .families
        .iter()
        .map(|record| extract_family(record, &dates))
        .collect();
    Extraction { people, families }
}

#[cfg(test)]
mod tests {
    use kf_core::ConvertConfig;
    use proptest::prelude::*;

    use super::{extract, parse};

    const FAMILY: &str = "\
0 HEAD
1 CHAR UTF-8
0 @I1@ INDI
1 NAME John /Smith/
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 NAME Jane /Doe/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Billy /Smith/
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 @S1@ SOUR
1 TITL 1900 Census
0 TRLR
";

    #[test]
    fn parse_counts_tokens_and_records() {
        let result = parse(FAMILY);
        assert_eq!(result.token_count, 20);
        assert_eq!(result.records.individuals.len(), 3);
        assert_eq!(result.records.families.len(), 1);
        assert_eq!(result.records.sources.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn extraction_keeps_file_order() {
        let result = parse(FAMILY);
        let extraction = extract(&result.records, &ConvertConfig::default());
        let ids: Vec<_> = extraction
            .people
            .iter()
            .map(|record| record.person.id.as_str())
            .collect();
        assert_eq!(ids, vec!["I1", "I2", "I3"]);
        assert_eq!(extraction.families.len(), 1);
        assert_eq!(extraction.families[0].children_ids, vec!["I3"]);
    }

    #[test]
    fn maiden_names_are_opt_in() {
        let input = "0 @I1@ INDI\n1 NAME Jane /Doe/\n1 NAME Jane /Smith/\n2 TYPE maiden\n";
        let result = parse(input);

        let plain = extract(&result.records, &ConvertConfig::default());
        assert_eq!(plain.people[0].person.maiden_name, None);

        let config = ConvertConfig {
            maiden_names: true,
            ..ConvertConfig::default()
        };
        let with_maiden = extract(&result.records, &config);
        assert_eq!(with_maiden.people[0].person.maiden_name.as_deref(), Some("Smith"));
        assert_eq!(with_maiden.people[0].person.last_name, "Doe");
    }

    #[test]
    fn two_digit_years_use_the_configured_pivot() {
        let input = "0 @I1@ INDI\n1 BIRT\n2 DATE 4 Jul 50\n";
        let result = parse(input);

        let default = extract(&result.records, &ConvertConfig::default());
        assert_eq!(default.people[0].person.birth.date.as_deref(), Some("July 4, 2050"));

        let config = ConvertConfig {
            two_digit_year_pivot: 30,
            ..ConvertConfig::default()
        };
        let shifted = extract(&result.records, &config);
        assert_eq!(shifted.people[0].person.birth.date.as_deref(), Some("July 4, 1950"));
    }

    #[test]
    fn parse_result_serializes_for_debug_output() {
        let value = serde_json::to_value(parse("0 @I1@ INDI\n1 NAME A /B/\n")).expect("json");
        assert_eq!(value["token_count"], 2);
        assert_eq!(
            value["records"]["individuals"]["records"][0]["source_id"],
            "@I1@"
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(96))]

        #[test]
        fn prop_parse_and_extract_are_total(input in "([0-3] (@[A-Z][0-9]@ )?[A-Z]{3,4}( [ -~]{0,12})?\n){0,30}") {
            let result = parse(&input);
            let extraction = extract(&result.records, &ConvertConfig::default());
            prop_assert_eq!(extraction.people.len(), result.records.individuals.len());
            prop_assert_eq!(extraction.families.len(), result.records.families.len());
        }

        #[test]
        fn prop_parse_is_deterministic(input in "([0-2] (@I[0-9]@ )?(INDI|FAM|NAME|DATE|CHIL) ?[a-z0-9@ ]{0,8}\n){0,20}") {
            prop_assert_eq!(parse(&input), parse(&input));
        }
    }
}
