//! Code-span locator: byte ranges covered by fenced code blocks and inline code spans.
//!
//! Fences open on a line starting (after up to three spaces) with three or more
//! backticks or tildes, and close on a line holding a run of the same character
//! at least as long. An unclosed fence runs to the end of the text. Outside
//! fences, a backtick run closes at the next run of exactly the same length;
//! runs with no partner are literal.

use std::ops::Range;

/// Sorted, non-overlapping code ranges with binary-search lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSpanIndex {
    spans: Vec<Range<usize>>,
}

struct Fence {
    ch: u8,
    len: usize,
    start: usize,
}

impl CodeSpanIndex {
    /// Scan `text` once and record every code range.
    pub fn build(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut fence: Option<Fence> = None;
        let mut prose_start = 0;
        let mut line_start = 0;

        for line in text.split_inclusive('\n') {
            let line_end = line_start + line.len();
            match &fence {
                None => {
                    if let Some((ch, len)) = fence_marker(line) {
                        push_inline_spans(bytes, prose_start..line_start, &mut spans);
                        fence = Some(Fence {
                            ch,
                            len,
                            start: line_start,
                        });
                    }
                }
                Some(open) => {
                    if closes_fence(line, open) {
                        spans.push(open.start..line_end);
                        fence = None;
                        prose_start = line_end;
                    }
                }
            }
            line_start = line_end;
        }

        match fence {
            Some(open) => spans.push(open.start..text.len()),
            None => push_inline_spans(bytes, prose_start..text.len(), &mut spans),
        }
        Self { spans }
    }

    /// Whether `offset` lies inside any code range.
    pub fn is_inside(&self, offset: usize) -> bool {
        self.containing(offset).is_some()
    }

    /// The code range containing `offset`, if any.
    pub fn containing(&self, offset: usize) -> Option<&Range<usize>> {
        let i = self.spans.partition_point(|span| span.end <= offset);
        self.spans.get(i).filter(|span| span.start <= offset)
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Up to three spaces of indentation, then a run of at least three backticks or tildes.
fn fence_marker(line: &str) -> Option<(u8, usize)> {
    let rest = strip_indent(line)?;
    let ch = *rest.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = run_length(rest.as_bytes(), 0, ch);
    if len < 3 {
        return None;
    }
    // Backtick fences cannot carry backticks in the info string.
    if ch == b'`' && rest[len..].contains('`') {
        return None;
    }
    Some((ch, len))
}

fn closes_fence(line: &str, fence: &Fence) -> bool {
    let Some(rest) = strip_indent(line) else {
        return false;
    };
    let len = run_length(rest.as_bytes(), 0, fence.ch);
    len >= fence.len && rest[len..].trim().is_empty()
}

fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.bytes().take_while(|b| *b == b' ').count();
    (indent <= 3).then(|| &line[indent..])
}

fn run_length(bytes: &[u8], start: usize, ch: u8) -> usize {
    bytes[start..].iter().take_while(|b| **b == ch).count()
}

/// Pair backtick runs of equal length within `region`.
fn push_inline_spans(bytes: &[u8], region: Range<usize>, spans: &mut Vec<Range<usize>>) {
    let mut runs: Vec<Range<usize>> = Vec::new();
    let mut pos = region.start;
    while pos < region.end {
        if bytes[pos] == b'`' {
            let len = run_length(&bytes[..region.end], pos, b'`');
            runs.push(pos..pos + len);
            pos += len;
        } else {
            pos += 1;
        }
    }

    let mut i = 0;
    while i < runs.len() {
        let opener = &runs[i];
        let closer = runs[i + 1..]
            .iter()
            .position(|run| run.len() == opener.len())
            .map(|offset| i + 1 + offset);
        match closer {
            Some(j) => {
                spans.push(opener.start..runs[j].end);
                i = j + 1;
            }
            None => i += 1,
        }
    }
}
