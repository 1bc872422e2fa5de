//! Delimiter kinds and the forward scanner that locates opening and closing markers.
//!
//! Offsets are UTF-8 byte offsets. Every marker starts with an ASCII byte, so any
//! match offset (and offset + 1) is a char boundary.

use serde::Serialize;

use super::code_spans::CodeSpanIndex;

/// The two supported marker-pair styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterKind {
    /// Symmetric `$$...$$`.
    Dollars,
    /// Asymmetric `\[...\]`.
    Brackets,
}

impl DelimiterKind {
    /// Every kind, in canonical order.
    pub const ALL: [DelimiterKind; 2] = [DelimiterKind::Dollars, DelimiterKind::Brackets];

    /// Configuration name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dollars => "dollars",
            Self::Brackets => "brackets",
        }
    }

    /// Parse a configuration name (case-insensitive, surrounding whitespace ignored).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn spec(self) -> DelimiterSpec {
        match self {
            Self::Dollars => DOLLARS,
            Self::Brackets => BRACKETS,
        }
    }
}

impl std::fmt::Display for DelimiterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An immutable open/close marker pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterSpec {
    pub kind: DelimiterKind,
    pub open: &'static str,
    pub close: &'static str,
}

pub const DOLLARS: DelimiterSpec = DelimiterSpec {
    kind: DelimiterKind::Dollars,
    open: "$$",
    close: "$$",
};

pub const BRACKETS: DelimiterSpec = DelimiterSpec {
    kind: DelimiterKind::Brackets,
    open: "\\[",
    close: "\\]",
};

/// Marker specs for the given kinds, in the same order.
pub fn active_delimiters(kinds: &[DelimiterKind]) -> Vec<DelimiterSpec> {
    kinds.iter().map(|kind| kind.spec()).collect()
}

/// An opening marker found by [`find_next_opening`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening {
    pub index: usize,
    pub delimiter: DelimiterSpec,
}

impl Opening {
    /// Offset of the first byte after the opening marker.
    pub fn expression_start(&self) -> usize {
        self.index + self.delimiter.open.len()
    }
}

/// Leftmost opening marker at or after `from` among `delimiters`, skipping
/// occurrences inside code spans. Equal offsets keep the earlier delimiter in
/// `delimiters`.
pub fn find_next_opening(
    text: &str,
    from: usize,
    delimiters: &[DelimiterSpec],
    code: Option<&CodeSpanIndex>,
) -> Option<Opening> {
    delimiters
        .iter()
        .filter_map(|delimiter| {
            find_marker(text, from, delimiter.open, code).map(|index| Opening {
                index,
                delimiter: *delimiter,
            })
        })
        .min_by_key(|opening| opening.index)
}

/// First closing marker of `delimiter` at or after `from`, skipping occurrences
/// inside code spans.
pub fn find_closing_index(
    text: &str,
    from: usize,
    delimiter: &DelimiterSpec,
    code: Option<&CodeSpanIndex>,
) -> Option<usize> {
    find_marker(text, from, delimiter.close, code)
}

fn find_marker(
    text: &str,
    from: usize,
    marker: &str,
    code: Option<&CodeSpanIndex>,
) -> Option<usize> {
    let mut pos = from;
    while let Some(rest) = text.get(pos..) {
        let index = pos + rest.find(marker)?;
        match code.and_then(|c| c.containing(index)) {
            // Resume after the span; markers inside it are never revisited.
            Some(span) => pos = span.end.max(index + 1),
            None => return Some(index),
        }
    }
    None
}
