//! Multi-document YAML splitting
//!
//! Splits a byte stream into the documents separated by `---` (and
//! terminated by `...`) markers, without parsing the YAML itself. The
//! splitter works line by line in a single pass and hands out borrowed
//! slices of the input, so arbitrarily large documents cost nothing beyond
//! the scan.
//!
//! Rules:
//! - a marker is `---` or `...` at column 0, followed by end of line or
//!   whitespace; text after `--- ` on the same line belongs to the new
//!   document (`--- |`, `--- !tag`)
//! - documents made only of blank lines, comments and directives are not
//!   emitted, which covers comment headers, trailing separators and empty
//!   streams
//! - block scalars (`|`, `>`) are tracked so their content lines are never
//!   mistaken for comments, directives or structure

use std::iter::FusedIterator;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One document of a multi-document stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    /// Position among the emitted documents, starting at 0
    pub index: usize,
    /// 1-based line of the stream on which the document starts
    pub line: usize,
    /// Byte offset of the document within the stream
    pub offset: usize,
    /// The document text, excluding its markers
    pub bytes: &'a [u8],
}

/// Split a stream into its documents
pub fn split_documents(input: &[u8]) -> Documents<'_> {
    let pos = if input.starts_with(BOM) { BOM.len() } else { 0 };
    Documents {
        input,
        pos,
        line: 1,
        marker_tail: false,
        emitted: 0,
    }
}

/// Lazy iterator over the documents of a stream
#[derive(Debug, Clone)]
pub struct Documents<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    /// `pos` sits after a `---` marker on the same line
    marker_tail: bool,
    emitted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    DocumentStart,
    DocumentEnd,
}

/// An open block scalar
#[derive(Debug, Clone, Copy)]
struct BlockScalar {
    /// Indentation of the line holding the `|`/`>` indicator
    parent: isize,
    /// Content indentation, explicit or detected from the first content line
    indent: Option<usize>,
}

impl BlockScalar {
    /// Whether `line` is part of the scalar
    fn continues(&mut self, line: &[u8]) -> bool {
        if is_blank(line) {
            return true;
        }
        let indent = indentation(line);
        match self.indent {
            Some(required) => indent >= required,
            None if indent as isize > self.parent => {
                self.indent = Some(indent);
                true
            }
            None => false,
        }
    }
}

impl<'a> Iterator for Documents<'a> {
    type Item = Document<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.input.len() {
            if let Some(doc) = self.scan_document() {
                return Some(doc);
            }
        }
        None
    }
}

impl FusedIterator for Documents<'_> {}

impl<'a> Documents<'a> {
    /// Scan one document starting at `pos`, leaving `pos` at the start of the next
    ///
    /// Returns `None` when the scanned document has no content.
    fn scan_document(&mut self) -> Option<Document<'a>> {
        let start = self.pos;
        let start_line = self.line;
        let mut end = self.input.len();
        let mut has_content = false;
        let mut block: Option<BlockScalar> = None;

        while self.pos < self.input.len() {
            let line_start = self.pos;
            let (line, next) = line_at(self.input, line_start);
            let tail = std::mem::take(&mut self.marker_tail);

            if !tail {
                if let Some(marker) = marker_of(line) {
                    end = line_start;
                    self.skip_marker(marker, line, line_start, next);
                    break;
                }
            }

            self.pos = next;
            self.line += 1;

            if let Some(scalar) = block.as_mut() {
                if scalar.continues(line) {
                    continue;
                }
                block = None;
            }

            let trimmed = trim_start(line);
            if trimmed.is_empty() || trimmed[0] == b'#' {
                continue;
            }
            if !has_content && !tail && line[0] == b'%' {
                continue;
            }
            has_content = true;

            let parent = if tail { -1 } else { indentation(line) as isize };
            if let Some(explicit) = block_scalar_indicator(trimmed) {
                block = Some(BlockScalar {
                    parent,
                    indent: explicit.map(|n| parent.max(0) as usize + n),
                });
            }
        }

        if !has_content {
            return None;
        }

        let index = self.emitted;
        self.emitted += 1;
        Some(Document {
            index,
            line: start_line,
            offset: start,
            bytes: &self.input[start..end],
        })
    }

    /// Move past a marker line; text after `--- ` starts the next document
    fn skip_marker(&mut self, marker: Marker, line: &[u8], line_start: usize, next: usize) {
        if marker == Marker::DocumentStart {
            let rest = trim_start(&line[3..]);
            if !rest.is_empty() && rest[0] != b'#' {
                self.pos = line_start + (line.len() - rest.len());
                self.marker_tail = true;
                return;
            }
        }
        self.pos = next;
        self.line += 1;
    }
}

/// The line starting at `pos` without its terminator, and the start of the next line
fn line_at(input: &[u8], pos: usize) -> (&[u8], usize) {
    let rest = &input[pos..];
    let (len, next) = match rest.iter().position(|&b| b == b'\n') {
        Some(i) => (i, pos + i + 1),
        None => (rest.len(), input.len()),
    };
    let line = &rest[..len];
    (line.strip_suffix(b"\r").unwrap_or(line), next)
}

fn marker_of(line: &[u8]) -> Option<Marker> {
    let marker = match line.get(..3)? {
        b"---" => Marker::DocumentStart,
        b"..." => Marker::DocumentEnd,
        _ => return None,
    };
    match line.get(3) {
        None | Some(b' ') | Some(b'\t') => Some(marker),
        _ => None,
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|&b| b == b' ' || b == b'\t')
}

fn indentation(line: &[u8]) -> usize {
    line.iter().take_while(|&&b| b == b' ').count()
}

fn trim_start(line: &[u8]) -> &[u8] {
    let skip = line
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    &line[skip..]
}

/// Detect a block scalar header (`key: |`, `- >-`, `|2+ # note`)
///
/// Returns the explicit indentation indicator, if any.
fn block_scalar_indicator(line: &[u8]) -> Option<Option<usize>> {
    let code = strip_comment(line);
    let code = match code.iter().rposition(|&b| b != b' ' && b != b'\t') {
        Some(last) => &code[..=last],
        None => return None,
    };

    let token_start = code
        .iter()
        .rposition(|&b| b == b' ' || b == b'\t')
        .map_or(0, |i| i + 1);
    let token = &code[token_start..];

    let (&style, modifiers) = token.split_first()?;
    if style != b'|' && style != b'>' {
        return None;
    }
    if modifiers.len() > 2 {
        return None;
    }

    let mut explicit = None;
    for &m in modifiers {
        match m {
            b'+' | b'-' => {}
            b'1'..=b'9' if explicit.is_none() => explicit = Some(usize::from(m - b'0')),
            _ => return None,
        }
    }
    Some(explicit)
}

/// Cut a trailing ` # comment`, ignoring `#` inside quotes
fn strip_comment(line: &[u8]) -> &[u8] {
    let mut quote: Option<u8> = None;
    let mut prev = b' ';
    for (i, &b) in line.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'#' && (prev == b' ' || prev == b'\t') => return &line[..i],
            None => {}
        }
        prev = b;
    }
    line
}
