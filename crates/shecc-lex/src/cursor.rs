//! A byte-indexed cursor over the source buffer, tracking line/column
//! for `SourceLoc`. Operates on `char`s decoded from UTF-8-compatible
//! ASCII source; bytes ≥ 0x80 are only expected inside string/char
//! literals and comments, where they pass through opaquely.

use shecc_ir::{SourceLoc, Symbol};

pub struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
    file: Symbol,
    line: u32,
    column: u32,
    byte_offset: u32,
    lookahead: Vec<(usize, char)>,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, file: Symbol) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            source,
            file,
            line: 1,
            column: 1,
            byte_offset: 0,
            lookahead: Vec::new(),
        }
    }

    pub fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.file, self.line, self.column, self.byte_offset, 0)
    }

    pub fn peek(&mut self) -> Option<char> {
        self.peek_at(0)
    }

    pub fn peek_at(&mut self, n: usize) -> Option<char> {
        while self.lookahead.len() <= n {
            match self.chars.next() {
                Some(item) => self.lookahead.push(item),
                None => return None,
            }
        }
        self.lookahead.get(n).map(|(_, c)| *c)
    }

    pub fn bump(&mut self) -> Option<char> {
        if self.lookahead.is_empty() {
            self.peek();
        }
        if self.lookahead.is_empty() {
            return None;
        }
        let (_, c) = self.lookahead.remove(0);
        self.byte_offset += c.len_utf8() as u32;
        self.column += 1;
        Some(c)
    }

    pub fn bump_newline(&mut self) {
        self.bump();
        self.line += 1;
        self.column = 1;
    }

    pub fn at_column_one(&self) -> bool {
        self.column == 1
    }

    pub fn source(&self) -> &'a str {
        self.source
    }
}
