//! Parse error codes for JSON-with-comments documents.

use thiserror::Error;

/// Why a document failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseErrorCode {
    #[error("Invalid symbol")]
    InvalidSymbol,
    #[error("Invalid number format")]
    InvalidNumberFormat,
    #[error("Property name expected")]
    PropertyNameExpected,
    #[error("Value expected")]
    ValueExpected,
    #[error("Colon expected")]
    ColonExpected,
    #[error("Comma expected")]
    CommaExpected,
    #[error("Closing brace expected")]
    CloseBraceExpected,
    #[error("Closing bracket expected")]
    CloseBracketExpected,
    #[error("End of file expected")]
    EndOfFileExpected,
    #[error("Comments are not permitted")]
    InvalidCommentToken,
    #[error("Unexpected end of comment")]
    UnexpectedEndOfComment,
    #[error("Unexpected end of string")]
    UnexpectedEndOfString,
    #[error("Unexpected end of number")]
    UnexpectedEndOfNumber,
    #[error("Invalid unicode sequence in string")]
    InvalidUnicode,
    #[error("Invalid escape character in string")]
    InvalidEscapeCharacter,
    #[error("Invalid characters in string. Control characters must be escaped")]
    InvalidCharacter,
}

/// A parse error at `offset..offset + length` (bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub offset: usize,
    pub length: usize,
}

impl ParseError {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.code, self.offset)
    }
}

impl std::error::Error for ParseError {}
