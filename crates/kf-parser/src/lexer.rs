use chumsky::prelude::*;

/// One recognized line: `LEVEL [@XREF@] TAG [VALUE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// 1-based physical line number.
    pub line: usize,
    pub level: usize,
    /// Cross-reference id with its `@` markers, e.g. `@I1@`.
    pub xref_id: Option<&'a str>,
    pub tag: &'a str,
    /// Remainder of the line after the tag and its separating whitespace.
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct LineParts<'a> {
    level: &'a str,
    xref_id: Option<&'a str>,
    tag: &'a str,
    value: &'a str,
}

/// Build a chumsky parser for one trimmed line.
fn line_parser<'a>() -> impl Parser<'a, &'a str, LineParts<'a>, extra::Err<Rich<'a, char>>> {
    let ws_char = any().filter(|c: &char| c.is_whitespace());
    let word_char = any().filter(|c: &char| c.is_alphanumeric() || *c == '_');

    let level = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .to_slice();

    let xref = just('@')
        .then(word_char.repeated().at_least(1))
        .then(just('@'))
        .to_slice();

    let tag = word_char.repeated().at_least(1).to_slice();

    level
        .then_ignore(ws_char.repeated().at_least(1))
        .then(xref.or_not())
        .then_ignore(ws_char.repeated())
        .then(tag)
        .then_ignore(ws_char.repeated())
        .then(any().repeated().to_slice())
        .then_ignore(end())
        .map(|(((level, xref_id), tag), value)| LineParts {
            level,
            xref_id,
            tag,
            value,
        })
}

/// Recognize a single line. Blank and non-conforming lines yield `None`.
#[must_use]
pub fn tokenize_line(line: &str, line_number: usize) -> Option<Token<'_>> {
    recognize(&line_parser(), line, line_number)
}

/// Tokenize a whole document, silently dropping lines that do not match.
///
/// Lines are split on `\n`, `\r\n`, and bare `\r`; a leading byte-order mark
/// is ignored.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let parser = line_parser();

    input
        .lines()
        .enumerate()
        .flat_map(|(index, line)| line.split('\r').map(move |segment| (index + 1, segment)))
        .filter_map(|(line_number, line)| recognize(&parser, line, line_number))
        .collect()
}

fn recognize<'a, P>(parser: &P, line: &'a str, line_number: usize) -> Option<Token<'a>>
where
    P: Parser<'a, &'a str, LineParts<'a>, extra::Err<Rich<'a, char>>>,
{
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts = parser.parse(trimmed).into_result().ok()?;
    // Digit runs too long for usize are treated like any other malformed line.
    let level = parts.level.parse::<usize>().ok()?;
    Some(Token {
        line: line_number,
        level,
        xref_id: parts.xref_id,
        tag: parts.tag,
        value: parts.value,
    })
}
