//! Tokenizer for JSON with comments.
//!
//! The scanner never fails: malformed input produces `Unknown` tokens or
//! tokens carrying an error code, and scanning always makes progress.

use crate::error::ParseErrorCode;

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    Null,
    True,
    False,
    String,
    Number,
    LineComment,
    BlockComment,
    LineBreak,
    Trivia,
    Unknown,
    Eof,
}

impl SyntaxKind {
    /// Whitespace, line breaks and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Trivia
                | SyntaxKind::LineBreak
                | SyntaxKind::LineComment
                | SyntaxKind::BlockComment
        )
    }
}

/// One scanned token; `offset` and `length` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub offset: usize,
    pub length: usize,
    pub error: Option<ParseErrorCode>,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Scanner over a text.
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    value: String,
    error: Option<ParseErrorCode>,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            text,
            pos: 0,
            value: String::new(),
            error: None,
        }
    }

    /// Start scanning at `offset` (must be a character boundary).
    pub fn starting_at(text: &'a str, offset: usize) -> Self {
        let mut scanner = Scanner::new(text);
        scanner.pos = offset.min(text.len());
        scanner
    }

    /// The decoded value of the last string token.
    pub fn string_value(&self) -> &str {
        &self.value
    }

    /// The raw text of a token.
    pub fn token_text(&self, token: &Token) -> &'a str {
        &self.text[token.offset..token.end()]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        self.value.clear();
        self.error = None;

        let offset = self.pos;
        let kind = self.scan_kind();
        Token {
            kind,
            offset,
            length: self.pos - offset,
            error: self.error,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes().get(self.pos + ahead).copied()
    }

    fn set_error(&mut self, code: ParseErrorCode) {
        if self.error.is_none() {
            self.error = Some(code);
        }
    }

    fn scan_kind(&mut self) -> SyntaxKind {
        let Some(b) = self.peek(0) else {
            return SyntaxKind::Eof;
        };

        match b {
            b' ' | b'\t' | 0x0B | 0x0C => {
                while matches!(self.peek(0), Some(b' ' | b'\t' | 0x0B | 0x0C)) {
                    self.pos += 1;
                }
                SyntaxKind::Trivia
            }
            b'\n' => {
                self.pos += 1;
                SyntaxKind::LineBreak
            }
            b'\r' => {
                self.pos += 1;
                if self.peek(0) == Some(b'\n') {
                    self.pos += 1;
                }
                SyntaxKind::LineBreak
            }
            b'{' => self.single(SyntaxKind::OpenBrace),
            b'}' => self.single(SyntaxKind::CloseBrace),
            b'[' => self.single(SyntaxKind::OpenBracket),
            b']' => self.single(SyntaxKind::CloseBracket),
            b',' => self.single(SyntaxKind::Comma),
            b':' => self.single(SyntaxKind::Colon),
            b'"' => {
                self.pos += 1;
                self.scan_string();
                SyntaxKind::String
            }
            b'/' => self.scan_slash(),
            b'-' => {
                self.pos += 1;
                if matches!(self.peek(0), Some(b'0'..=b'9')) {
                    self.scan_number();
                    SyntaxKind::Number
                } else {
                    SyntaxKind::Unknown
                }
            }
            b'0'..=b'9' => {
                self.scan_number();
                SyntaxKind::Number
            }
            _ => self.scan_word(),
        }
    }

    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn scan_slash(&mut self) -> SyntaxKind {
        match self.peek(1) {
            Some(b'/') => {
                self.pos += 2;
                while !matches!(self.peek(0), None | Some(b'\n' | b'\r')) {
                    self.pos += 1;
                }
                SyntaxKind::LineComment
            }
            Some(b'*') => {
                self.pos += 2;
                match self.text[self.pos..].find("*/") {
                    Some(idx) => self.pos += idx + 2,
                    None => {
                        self.pos = self.text.len();
                        self.set_error(ParseErrorCode::UnexpectedEndOfComment);
                    }
                }
                SyntaxKind::BlockComment
            }
            _ => {
                self.pos += 1;
                SyntaxKind::Unknown
            }
        }
    }

    fn skip_digits(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(0), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn scan_number(&mut self) {
        if self.peek(0) == Some(b'0') {
            self.pos += 1;
        } else {
            self.skip_digits();
        }

        if self.peek(0) == Some(b'.') {
            self.pos += 1;
            if !self.skip_digits() {
                self.set_error(ParseErrorCode::UnexpectedEndOfNumber);
                return;
            }
        }

        if matches!(self.peek(0), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(0), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.skip_digits() {
                self.set_error(ParseErrorCode::UnexpectedEndOfNumber);
            }
        }
    }

    /// Scan after the opening quote, decoding into `self.value`.
    fn scan_string(&mut self) {
        let mut run_start = self.pos;

        loop {
            let Some(b) = self.peek(0) else {
                self.value.push_str(&self.text[run_start..self.pos]);
                self.set_error(ParseErrorCode::UnexpectedEndOfString);
                return;
            };

            match b {
                b'"' => {
                    self.value.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    return;
                }
                b'\\' => {
                    self.value.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    self.scan_escape();
                    run_start = self.pos;
                }
                b'\n' | b'\r' => {
                    self.value.push_str(&self.text[run_start..self.pos]);
                    self.set_error(ParseErrorCode::UnexpectedEndOfString);
                    return;
                }
                0x00..=0x1F => {
                    // Kept in the value; the string continues
                    self.set_error(ParseErrorCode::InvalidCharacter);
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_escape(&mut self) {
        let Some(escaped) = self.text[self.pos..].chars().next() else {
            self.set_error(ParseErrorCode::UnexpectedEndOfString);
            return;
        };
        self.pos += escaped.len_utf8();

        let decoded = match escaped {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.scan_unicode_escape();
                return;
            }
            _ => {
                self.set_error(ParseErrorCode::InvalidEscapeCharacter);
                return;
            }
        };
        self.value.push(decoded);
    }

    fn scan_hex4(&mut self) -> Option<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = (self.peek(0)? as char).to_digit(16)?;
            value = value * 16 + digit;
            self.pos += 1;
        }
        Some(value)
    }

    fn scan_unicode_escape(&mut self) {
        let Some(unit) = self.scan_hex4() else {
            self.set_error(ParseErrorCode::InvalidUnicode);
            return;
        };

        if (0xD800..0xDC00).contains(&unit)
            && self.peek(0) == Some(b'\\')
            && self.peek(1) == Some(b'u')
        {
            let save = self.pos;
            self.pos += 2;
            match self.scan_hex4() {
                Some(low) if (0xDC00..0xE000).contains(&low) => {
                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    self.value
                        .push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                    return;
                }
                // Not a low surrogate; decode it on its own later
                _ => self.pos = save,
            }
        }

        self.value
            .push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    /// Keywords, non-ASCII whitespace and unknown content.
    fn scan_word(&mut self) -> SyntaxKind {
        let rest = &self.text[self.pos..];
        let Some(first) = rest.chars().next() else {
            return SyntaxKind::Eof;
        };

        if first.is_whitespace() || first == '\u{FEFF}' {
            for ch in rest.chars() {
                if ch.is_whitespace() && !matches!(ch, '\n' | '\r') || ch == '\u{FEFF}' {
                    self.pos += ch.len_utf8();
                } else {
                    break;
                }
            }
            return SyntaxKind::Trivia;
        }

        let length = rest
            .char_indices()
            .find(|(_, ch)| !is_unknown_content(*ch))
            .map_or(rest.len(), |(idx, _)| idx);
        // Always make progress, even on a lone separator we don't handle above
        let length = if length == 0 { first.len_utf8() } else { length };
        self.pos += length;

        match &rest[..length] {
            "true" => SyntaxKind::True,
            "false" => SyntaxKind::False,
            "null" => SyntaxKind::Null,
            _ => SyntaxKind::Unknown,
        }
    }
}

fn is_unknown_content(ch: char) -> bool {
    !(ch.is_whitespace()
        || ch == '\u{FEFF}'
        || matches!(ch, '{' | '}' | '[' | ']' | ',' | ':' | '"' | '/'))
}
