//! Byte-level scanner for BibTeX source text.
//!
//! The scanner splits a bibliography into entries and directives while
//! remembering the exact source span of each, so that entries can later be
//! written back out untouched. Errors are local to one block: the scanner
//! resumes at the next `@` that starts a line. An `@` that is not followed by
//! `type{` or `type(` is free text (an email address in a comment, say) and
//! is skipped like any other text outside entries.

use indexmap::IndexMap;

use crate::error::ScreenError;

/// One `@type{key, ...}` block as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry type, lower-cased (`article`, `inproceedings`, ...).
    pub entry_type: String,
    /// Citation key.
    pub citekey: String,
    /// Fields in source order. Names are lower-cased, values verbatim
    /// without their outer delimiters.
    pub fields: IndexMap<String, String>,
    /// Verbatim source text from `@` to the closing delimiter.
    pub source: String,
    /// 1-based line where the entry starts.
    pub line: usize,
}

/// A scanned block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Entry(RawEntry),
    /// `@string` or `@preamble`, kept verbatim.
    Directive(String),
}

/// Everything the scanner found, in source order.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub blocks: Vec<Block>,
    pub issues: Vec<ScreenError>,
}

/// Scan BibTeX text into blocks.
pub fn scan(text: &str) -> ScanOutput {
    let mut scanner = Scanner::new(text);
    let mut output = ScanOutput::default();

    while let Some(start) = scanner.next_at(scanner.pos) {
        scanner.pos = start;
        match scanner.block() {
            Ok(Some(block)) => output.blocks.push(block),
            Ok(None) => {}
            Err(message) => {
                let line = scanner.line_of(start);
                output.issues.push(ScreenError::Parse { line, message });
                scanner.pos = scanner.recovery_point(start + 1);
            }
        }
    }

    output
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line_starts,
        }
    }

    fn line_of(&self, pos: usize) -> usize {
        match self.line_starts.binary_search(&pos) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    fn next_at(&self, from: usize) -> Option<usize> {
        self.text.get(from..)?.find('@').map(|i| from + i)
    }

    /// Next `@` preceded only by whitespace on its line.
    fn recovery_point(&self, from: usize) -> usize {
        let mut cursor = from;
        while let Some(at) = self.next_at(cursor) {
            let line_start = self.text[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
            if self.text[line_start..at].trim().is_empty() {
                return at;
            }
            cursor = at + 1;
        }
        self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if pred(b)) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    /// Parse the block starting at `self.pos` (which points at `@`).
    fn block(&mut self) -> Result<Option<Block>, String> {
        let start = self.pos;
        self.pos += 1;

        let entry_type = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        if entry_type.is_empty() {
            return Ok(None);
        }
        let entry_type = entry_type.to_ascii_lowercase();
        self.skip_ws();

        let close = match self.peek() {
            Some(b'{') => b'}',
            Some(b'(') => b')',
            _ if entry_type == "comment" => {
                // Line comment form: `@comment anything`
                self.pos = self.text[self.pos..]
                    .find('\n')
                    .map(|i| self.pos + i)
                    .unwrap_or(self.bytes.len());
                return Ok(None);
            }
            _ => return Ok(None),
        };

        match entry_type.as_str() {
            "comment" => {
                self.skip_group(close)?;
                Ok(None)
            }
            "string" | "preamble" => {
                self.skip_group(close)?;
                Ok(Some(Block::Directive(self.text[start..self.pos].to_string())))
            }
            _ => {
                self.pos += 1;
                let (citekey, fields) = self.entry_body(close)?;
                Ok(Some(Block::Entry(RawEntry {
                    entry_type,
                    citekey,
                    fields,
                    source: self.text[start..self.pos].to_string(),
                    line: self.line_of(start),
                })))
            }
        }
    }

    /// Skip from the opening delimiter to the matching `close`.
    fn skip_group(&mut self, close: u8) -> Result<(), String> {
        let mut depth = 0usize;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                _ if b == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err("unterminated block".to_string())
    }

    fn entry_body(&mut self, close: u8) -> Result<(String, IndexMap<String, String>), String> {
        self.skip_ws();
        let citekey = self
            .take_while(|b| b != b',' && b != close && !b.is_ascii_whitespace())
            .to_string();
        if citekey.is_empty() {
            return Err("entry has no citekey".to_string());
        }
        let in_entry = |msg: &str| format!("entry '{}': {}", citekey, msg);

        let mut fields = IndexMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(in_entry("unterminated entry")),
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok((citekey, fields));
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name = self.take_while(|b| {
                !b.is_ascii_whitespace() && !matches!(b, b'=' | b',' | b'{' | b'}' | b'(' | b')' | b'"' | b'#')
            });
            if name.is_empty() {
                return Err(in_entry("expected field name"));
            }
            let name = name.to_ascii_lowercase();

            self.skip_ws();
            if self.peek() != Some(b'=') {
                return Err(in_entry(&format!("expected '=' after field '{}'", name)));
            }
            self.pos += 1;

            let value = self.value().map_err(|e| in_entry(&format!("field '{}': {}", name, e)))?;
            if fields.contains_key(&name) {
                tracing::warn!(citekey = %citekey, field = %name, "Duplicate field, keeping first value");
            } else {
                fields.insert(name.clone(), value);
            }

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                None => return Err(in_entry("unterminated entry")),
                Some(_) => {
                    return Err(in_entry(&format!(
                        "expected ',' or closing delimiter after field '{}'",
                        name
                    )));
                }
            }
        }
    }

    /// Field value: one or more parts joined with `#`.
    fn value(&mut self) -> Result<String, String> {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'{') => value.push_str(self.braced()?),
                Some(b'"') => value.push_str(self.quoted()?),
                Some(_) => {
                    let token = self.take_while(|b| {
                        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':' | b'+' | b'/')
                    });
                    if token.is_empty() {
                        return Err("expected value".to_string());
                    }
                    value.push_str(token);
                }
                None => return Err("unexpected end of input".to_string()),
            }
            self.skip_ws();
            if self.peek() == Some(b'#') {
                self.pos += 1;
            } else {
                return Ok(value);
            }
        }
    }

    /// `{...}` with nesting; returns the inner text.
    fn braced(&mut self) -> Result<&'a str, String> {
        let start = self.pos + 1;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.text[start..self.pos - 1]);
                    }
                }
                _ => {}
            }
        }
        Err("unbalanced braces".to_string())
    }

    /// `"..."`; quotes inside braces do not terminate the value.
    fn quoted(&mut self) -> Result<&'a str, String> {
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' if depth == 0 => return Ok(&self.text[start..self.pos - 1]),
                _ => {}
            }
        }
        Err("unterminated quoted value".to_string())
    }
}
