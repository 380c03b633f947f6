//! Per-record tag trees assembled from the token stream.
//!
//! The builder is a two-state machine (idle / inside a record) plus a stack
//! of open entries. Every line at level > 0 inside a record becomes an entry
//! under its own tag, and each entry's sub map collects the lines exactly one
//! level deeper that follow it before the next line at its level or above.

use std::collections::BTreeMap;

use kf_core::{ConversionWarning, WarningCode};
use serde::Serialize;

use crate::lexer::Token;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Person,
    Family,
    Source,
    Unknown,
}

impl RecordKind {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "INDI" => Self::Person,
            "FAM" => Self::Family,
            "SOUR" => Self::Source,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "INDI",
            Self::Family => "FAM",
            Self::Source => "SOUR",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub value: String,
    /// Values of the lines one level below this entry, grouped by tag in order.
    pub sub: BTreeMap<String, Vec<String>>,
}

impl RawEntry {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            sub: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn first_sub(&self, tag: &str) -> Option<&str> {
        self.sub
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn sub_values(&self, tag: &str) -> &[String] {
        self.sub.get(tag).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RawRecord {
    pub kind: RecordKind,
    /// Cross-reference id exactly as written at level 0, `@` markers included.
    pub source_id: String,
    pub line: usize,
    pub entries: BTreeMap<String, Vec<RawEntry>>,
}

impl RawRecord {
    #[must_use]
    pub fn new(kind: RecordKind, source_id: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            line,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn entries(&self, tag: &str) -> &[RawEntry] {
        self.entries.get(tag).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn first(&self, tag: &str) -> Option<&RawEntry> {
        self.entries(tag).first()
    }

    fn push_entry(&mut self, tag: &str, value: &str) -> usize {
        let list = self.entries.entry(tag.to_string()).or_default();
        list.push(RawEntry::new(value));
        list.len() - 1
    }

    fn push_sub(&mut self, parent_tag: &str, parent_index: usize, tag: &str, value: &str) {
        if let Some(parent) = self
            .entries
            .get_mut(parent_tag)
            .and_then(|list| list.get_mut(parent_index))
        {
            parent
                .sub
                .entry(tag.to_string())
                .or_default()
                .push(value.to_string());
        }
    }
}

/// Records of one kind in file order, addressable by source id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct RecordSet {
    records: Vec<RawRecord>,
    #[serde(skip)]
    index_by_id: BTreeMap<String, usize>,
}

impl RecordSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn get(&self, source_id: &str) -> Option<&RawRecord> {
        self.index_by_id
            .get(source_id)
            .and_then(|&index| self.records.get(index))
    }

    /// Insert a record. A record with an id already present replaces the
    /// earlier one in its original position; the replaced record is returned.
    fn insert(&mut self, record: RawRecord) -> (usize, Option<RawRecord>) {
        if let Some(&index) = self.index_by_id.get(&record.source_id) {
            let replaced = std::mem::replace(&mut self.records[index], record);
            return (index, Some(replaced));
        }
        let index = self.records.len();
        self.index_by_id.insert(record.source_id.clone(), index);
        self.records.push(record);
        (index, None)
    }

    fn get_mut_at(&mut self, index: usize) -> Option<&mut RawRecord> {
        self.records.get_mut(index)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct RecordTree {
    pub individuals: RecordSet,
    pub families: RecordSet,
    pub sources: RecordSet,
}

impl RecordTree {
    #[must_use]
    pub fn set(&self, kind: RecordKind) -> Option<&RecordSet> {
        match kind {
            RecordKind::Person => Some(&self.individuals),
            RecordKind::Family => Some(&self.families),
            RecordKind::Source => Some(&self.sources),
            RecordKind::Unknown => None,
        }
    }

    fn set_mut(&mut self, kind: RecordKind) -> Option<&mut RecordSet> {
        match kind {
            RecordKind::Person => Some(&mut self.individuals),
            RecordKind::Family => Some(&mut self.families),
            RecordKind::Source => Some(&mut self.sources),
            RecordKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Idle,
    Active { kind: RecordKind, index: usize },
}

#[derive(Debug, Clone)]
struct OpenEntry {
    level: usize,
    tag: String,
    index: usize,
}

/// Incremental record builder; feed tokens in file order, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct RecordBuilder {
    tree: RecordTree,
    state: BuilderState,
    open: Vec<OpenEntry>,
    warnings: Vec<ConversionWarning>,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: RecordTree::default(),
            state: BuilderState::Idle,
            open: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, token: &Token<'_>) {
        if token.level == 0 {
            self.open_record(token);
            return;
        }

        let BuilderState::Active { kind, index } = self.state else {
            return;
        };
        let Some(record) = self
            .tree
            .set_mut(kind)
            .and_then(|set| set.get_mut_at(index))
        else {
            return;
        };

        while self
            .open
            .last()
            .is_some_and(|entry| entry.level >= token.level)
        {
            self.open.pop();
        }
        if let Some(parent) = self
            .open
            .last()
            .filter(|entry| entry.level + 1 == token.level)
        {
            record.push_sub(&parent.tag, parent.index, token.tag, token.value);
        }

        let entry_index = record.push_entry(token.tag, token.value);
        self.open.push(OpenEntry {
            level: token.level,
            tag: token.tag.to_string(),
            index: entry_index,
        });
    }

    fn open_record(&mut self, token: &Token<'_>) {
        self.open.clear();
        self.state = BuilderState::Idle;

        let kind = RecordKind::from_tag(token.tag);
        let Some(xref) = token.xref_id else {
            return;
        };
        let Some(set) = self.tree.set_mut(kind) else {
            return;
        };

        let (index, replaced) = set.insert(RawRecord::new(kind, xref, token.line));
        if let Some(previous) = replaced {
            self.warnings.push(
                ConversionWarning::new(
                    WarningCode::DuplicateRecord,
                    format!(
                        "{} record {xref} redefined; replacing the definition from line {}",
                        kind.as_str(),
                        previous.line
                    ),
                )
                .at_line(token.line),
            );
        }
        self.state = BuilderState::Active { kind, index };
    }

    #[must_use]
    pub fn finish(self) -> (RecordTree, Vec<ConversionWarning>) {
        (self.tree, self.warnings)
    }
}

/// Assemble person, family and source records from a token stream.
#[must_use]
pub fn build_records(tokens: &[Token<'_>]) -> (RecordTree, Vec<ConversionWarning>) {
    let mut builder = RecordBuilder::new();
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}
