//! Splits markdown into code and non-code spans.
//!
//! Wikilink extraction and conversion only ever touch [`Span::Text`]; fenced
//! blocks and inline code spans are carried through byte-for-byte.

/// A contiguous slice of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    /// Backtick-delimited inline code, delimiters included
    InlineCode(&'a str),
    /// Fenced block, opening and closing lines included
    Fence(&'a str),
    /// Indented code block, trailing blank lines included
    Indented(&'a str),
}

impl<'a> Span<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Span::Text(s) | Span::InlineCode(s) | Span::Fence(s) | Span::Indented(s) => s,
        }
    }
}

/// How a line relates to fenced code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Text,
    FenceOpen,
    FenceBody,
    FenceClose,
}

/// Line-by-line fence state machine
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    /// Fence character and run length of the open fence
    open: Option<(u8, usize)>,
}

impl FenceTracker {
    pub(crate) fn observe(&mut self, line: &str) -> LineKind {
        match self.open {
            None => match fence_marker(line) {
                Some((ch, len, info)) if ch == b'~' || !info.contains('`') => {
                    self.open = Some((ch, len));
                    LineKind::FenceOpen
                }
                _ => LineKind::Text,
            },
            Some((ch, len)) => match fence_marker(line) {
                Some((c, l, rest)) if c == ch && l >= len && rest.trim().is_empty() => {
                    self.open = None;
                    LineKind::FenceClose
                }
                _ => LineKind::FenceBody,
            },
        }
    }
}

/// Recognize a fence delimiter: up to three spaces, then three or more
/// backticks or tildes. Returns the character, run length, and the rest.
fn fence_marker(line: &str) -> Option<(u8, usize, &str)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let indent = line.bytes().take_while(|b| *b == b' ').count();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = *rest.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = rest.bytes().take_while(|b| *b == ch).count();
    if len < 3 {
        return None;
    }
    Some((ch, len, &rest[len..]))
}

/// Info string of a fenced block (text after the opening run, trimmed)
pub fn fence_info(fence: &str) -> &str {
    let first = fence.lines().next().unwrap_or("");
    fence_marker(first)
        .map(|(_, _, info)| info.trim())
        .unwrap_or("")
}

/// Four or more columns of leading whitespace, a tab counting to the next
/// multiple of four
fn is_indented(line: &str) -> bool {
    let mut columns = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - columns % 4,
            _ => break,
        }
        if columns >= 4 {
            return true;
        }
    }
    false
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// `-`, `*`, `+`, `1.` or `1)` list item marker after at most three spaces
fn is_list_item(line: &str) -> bool {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return false;
    }
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let marker = match digits {
        0 => rest.get(..1).filter(|m| matches!(*m, "-" | "*" | "+")),
        1..=9 => rest.get(digits..digits + 1).filter(|m| matches!(*m, "." | ")")),
        _ => None,
    };
    marker.is_some_and(|m| {
        let after = &rest[digits + m.len()..];
        after.is_empty() || after.starts_with([' ', '\t', '\n', '\r'])
    })
}

/// Segment a document into text, inline code, fenced, and indented code
/// spans.
///
/// An unclosed fence runs to the end of the document. An indented line only
/// opens a code block when it cannot continue a paragraph or a list item.
pub fn segment(input: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut tracker = FenceTracker::default();
    let mut text_start = 0;
    let mut fence_start = 0;
    let mut indented_start: Option<usize> = None;
    let mut in_paragraph = false;
    let mut in_list = false;
    let mut after_blank = true;
    let mut pos = 0;

    for line in input.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        match tracker.observe(line) {
            LineKind::FenceOpen => {
                match indented_start.take() {
                    Some(start) => spans.push(Span::Indented(&input[start..line_start])),
                    None => push_text(&mut spans, &input[text_start..line_start]),
                }
                fence_start = line_start;
                in_paragraph = false;
            }
            LineKind::FenceClose => {
                spans.push(Span::Fence(&input[fence_start..pos]));
                text_start = pos;
                after_blank = false;
            }
            LineKind::FenceBody => {}
            LineKind::Text => {
                let blank = is_blank(line);
                if let Some(start) = indented_start {
                    if blank || is_indented(line) {
                        continue;
                    }
                    spans.push(Span::Indented(&input[start..line_start]));
                    indented_start = None;
                    text_start = line_start;
                } else if !blank && is_indented(line) && !in_paragraph && !in_list {
                    push_text(&mut spans, &input[text_start..line_start]);
                    indented_start = Some(line_start);
                    continue;
                }

                if blank {
                    in_paragraph = false;
                } else if is_list_item(line) {
                    in_list = true;
                    in_paragraph = true;
                } else {
                    if after_blank && !is_indented(line) && !line.starts_with(' ') {
                        in_list = false;
                    }
                    in_paragraph = !line.trim_start().starts_with('#');
                }
                after_blank = blank;
            }
        }
    }

    if tracker.open.is_some() {
        spans.push(Span::Fence(&input[fence_start..]));
    } else if let Some(start) = indented_start {
        spans.push(Span::Indented(&input[start..]));
    } else {
        push_text(&mut spans, &input[text_start..]);
    }

    spans
}

/// Rebuild the document, rewriting only text spans
pub fn map_text<F>(input: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(input.len());
    for span in segment(input) {
        match span {
            Span::Text(text) => out.push_str(&f(text)),
            other => out.push_str(other.as_str()),
        }
    }
    out
}

fn push_text<'a>(spans: &mut Vec<Span<'a>>, text: &'a str) {
    let bytes = text.as_bytes();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = run_len(bytes, i);
        if i > 0 && bytes[i - 1] == b'\\' {
            i += run;
            continue;
        }
        match closing_run(bytes, i + run, run) {
            Some(end) => {
                if plain_start < i {
                    spans.push(Span::Text(&text[plain_start..i]));
                }
                spans.push(Span::InlineCode(&text[i..end]));
                i = end;
                plain_start = end;
            }
            None => i += run,
        }
    }

    if plain_start < text.len() {
        spans.push(Span::Text(&text[plain_start..]));
    }
}

fn run_len(bytes: &[u8], at: usize) -> usize {
    bytes[at..].iter().take_while(|b| **b == b'`').count()
}

/// End offset of the next backtick run of exactly `len`, stopping at a blank line
fn closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'`' => {
                let run = run_len(bytes, j);
                if run == len {
                    return Some(j + run);
                }
                j += run;
            }
            b'\n' if next_line_blank(bytes, j + 1) => return None,
            _ => j += 1,
        }
    }
    None
}

fn next_line_blank(bytes: &[u8], start: usize) -> bool {
    bytes[start..]
        .iter()
        .take_while(|b| **b != b'\n')
        .all(|b| matches!(b, b' ' | b'\t' | b'\r'))
}
