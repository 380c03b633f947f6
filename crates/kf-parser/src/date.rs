//! Normalization of free-form genealogy dates into readable English.
//!
//! `"BEF 12 Jan 1920"` becomes `"before January 12, 1920"`. Strings that fit
//! none of the known layouts come back verbatim behind their qualifier.

use kf_core::ConvertConfig;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::parsing::Parsed;
use time::Date;
use tracing::trace;

/// Approximation prefixes and the word each one renders as.
const QUALIFIERS: &[(&str, &str)] = &[
    ("ABT ", "circa "),
    ("ABOUT ", "circa "),
    ("CIRCA ", "circa "),
    ("BEF ", "before "),
    ("AFT ", "after "),
    ("EST ", "circa "),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    Year,
    Month,
    Day,
}

struct DatePattern {
    items: &'static [BorrowedFormatItem<'static>],
    precision: Precision,
    /// Starts with the day, which may then carry one pad space.
    day_first: bool,
}

/// Tried in order; the first full match wins.
const PATTERNS: &[DatePattern] = &[
    DatePattern {
        items: format_description!(
            "[day padding:none] [month repr:short case_sensitive:false] [year]"
        ),
        precision: Precision::Day,
        day_first: true,
    },
    DatePattern {
        items: format_description!(
            "[day padding:none] [month repr:long case_sensitive:false] [year]"
        ),
        precision: Precision::Day,
        day_first: true,
    },
    DatePattern {
        items: format_description!(
            "[month repr:short case_sensitive:false] [day padding:none], [year]"
        ),
        precision: Precision::Day,
        day_first: false,
    },
    DatePattern {
        items: format_description!(
            "[month repr:long case_sensitive:false] [day padding:none], [year]"
        ),
        precision: Precision::Day,
        day_first: false,
    },
    DatePattern {
        items: format_description!(
            "[day padding:none] [month repr:short case_sensitive:false] [year repr:last_two]"
        ),
        precision: Precision::Day,
        day_first: true,
    },
    DatePattern {
        items: format_description!("[year]"),
        precision: Precision::Year,
        day_first: false,
    },
    DatePattern {
        items: format_description!("[month repr:short case_sensitive:false] [year]"),
        precision: Precision::Month,
        day_first: false,
    },
    DatePattern {
        items: format_description!("[month repr:long case_sensitive:false] [year]"),
        precision: Precision::Month,
        day_first: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    two_digit_year_pivot: u8,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(69)
    }
}

impl DateNormalizer {
    /// Two-digit years at or above `two_digit_year_pivot` map to the 1900s,
    /// the rest to the 2000s.
    #[must_use]
    pub const fn new(two_digit_year_pivot: u8) -> Self {
        Self {
            two_digit_year_pivot,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ConvertConfig) -> Self {
        Self::new(config.two_digit_year_pivot)
    }

    #[must_use]
    pub const fn two_digit_year_pivot(&self) -> u8 {
        self.two_digit_year_pivot
    }

    /// Normalize a raw date value. Blank input yields `None`; anything else
    /// yields a string, falling back to the qualifier plus the original text.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (qualifier, rest) = split_qualifier(trimmed);
        let candidate = collapse_whitespace(rest);
        let unpadded_day = space_padded_day(rest).map(collapse_whitespace);

        let rendered = PATTERNS.iter().find_map(|pattern| {
            let input = match &unpadded_day {
                Some(unpadded) if pattern.day_first => unpadded,
                _ => &candidate,
            };
            self.render(pattern, input, qualifier)
        });
        if let Some(rendered) = rendered {
            return Some(rendered);
        }

        trace!(date = rest, "date matched no known layout; keeping it verbatim");
        Some(format!("{qualifier}{rest}"))
    }

    fn render(&self, pattern: &DatePattern, input: &str, qualifier: &str) -> Option<String> {
        // `[year]` takes an optional sign; years here are bare digits.
        if input.contains(['+', '-']) {
            return None;
        }
        let mut parsed = Parsed::new();
        let remaining = parsed.parse_items(input.as_bytes(), pattern.items).ok()?;
        if !remaining.is_empty() {
            return None;
        }

        let year = parsed.year().or_else(|| {
            parsed
                .year_last_two()
                .map(|two_digits| self.expand_two_digit_year(two_digits))
        })?;
        if year < 1 {
            return None;
        }

        match pattern.precision {
            Precision::Year => Some(format!("{qualifier}{year}")),
            Precision::Month => {
                let month = parsed.month()?;
                Some(format!("{qualifier}{month} {year}"))
            }
            Precision::Day => {
                let month = parsed.month()?;
                let day = parsed.day()?.get();
                Date::from_calendar_date(year, month, day).ok()?;
                Some(format!("{qualifier}{month} {day}, {year}"))
            }
        }
    }

    fn expand_two_digit_year(&self, two_digits: u8) -> i32 {
        let century = if two_digits >= self.two_digit_year_pivot {
            1900
        } else {
            2000
        };
        century + i32::from(two_digits)
    }
}

/// Normalize with the default two-digit-year window.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    DateNormalizer::default().normalize(raw)
}

fn split_qualifier(input: &str) -> (&'static str, &str) {
    for &(prefix, rendered) in QUALIFIERS {
        let matches = input
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return (rendered, &input[prefix.len()..]);
        }
    }
    ("", input)
}

/// `" 5 Mar 1892"` minus its pad space: exactly one space, then a
/// single-digit day.
fn space_padded_day(input: &str) -> Option<&str> {
    let unpadded = input.strip_prefix(' ')?;
    let mut chars = unpadded.chars();
    let day = chars.next()?;
    let next_is_digit = chars.next().is_some_and(|ch| ch.is_ascii_digit());
    (matches!(day, '1'..='9') && !next_is_digit).then_some(unpadded)
}

/// Replace every whitespace run with one space, keeping a leading or
/// trailing run (as a single space) so it still blocks a match.
fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
