//! Recovering parser.
//!
//! Errors never stop the parse. Each one is recorded with the span of the
//! offending token, then the parser skips ahead to a synchronisation token
//! (a comma or the closing delimiter of the enclosing container) and
//! carries on, so one document can report several independent problems.

use crate::ast::{Node, NodeKind, Property, Span};
use crate::error::{ParseError, ParseErrorCode};
use crate::scanner::{Scanner, SyntaxKind, Token};

/// Dialect switches. The default accepts comments and trailing commas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub allow_comments: bool,
    pub allow_trailing_comma: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            allow_comments: true,
            allow_trailing_comma: true,
        }
    }
}

impl ParseOptions {
    /// Plain JSON.
    pub fn strict() -> Self {
        ParseOptions {
            allow_comments: false,
            allow_trailing_comma: false,
        }
    }
}

/// Parse tree plus every error found. `root` may be present even when
/// there are errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub root: Option<Node>,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse with the default dialect.
pub fn parse(text: &str) -> ParseOutput {
    parse_with_options(text, ParseOptions::default())
}

pub fn parse_with_options(text: &str, options: ParseOptions) -> ParseOutput {
    let mut parser = Parser {
        scanner: Scanner::new(text),
        options,
        token: Token {
            kind: SyntaxKind::Eof,
            offset: 0,
            length: 0,
            error: None,
        },
        last_end: 0,
        errors: Vec::new(),
    };

    parser.scan_next();
    let root = if parser.token.kind == SyntaxKind::Eof {
        parser.error(ParseErrorCode::ValueExpected, &[], &[]);
        None
    } else {
        let root = parser.parse_value();
        match root {
            None => parser.error(ParseErrorCode::ValueExpected, &[], &[]),
            Some(_) if parser.token.kind != SyntaxKind::Eof => {
                parser.error(ParseErrorCode::EndOfFileExpected, &[], &[])
            }
            Some(_) => {}
        }
        root
    };

    ParseOutput {
        root,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    options: ParseOptions,
    token: Token,
    /// End of the last significant token consumed
    last_end: usize,
    errors: Vec<ParseError>,
}

impl Parser<'_> {
    fn push_error(&mut self, code: ParseErrorCode, token: Token) {
        self.errors.push(ParseError {
            code,
            offset: token.offset,
            length: token.length,
        });
    }

    /// Advance to the next significant token, reporting trivia problems.
    fn scan_next(&mut self) -> SyntaxKind {
        self.last_end = self.token.end();
        loop {
            let token = self.scanner.scan();
            if let Some(code) = token.error {
                self.push_error(code, token);
            }
            match token.kind {
                SyntaxKind::LineComment | SyntaxKind::BlockComment => {
                    if !self.options.allow_comments {
                        self.push_error(ParseErrorCode::InvalidCommentToken, token);
                    }
                }
                SyntaxKind::Unknown => self.push_error(ParseErrorCode::InvalidSymbol, token),
                SyntaxKind::Trivia | SyntaxKind::LineBreak => {}
                _ => {
                    self.token = token;
                    return token.kind;
                }
            }
        }
    }

    /// Record an error at the current token, then skip until a token in
    /// `skip_until_after` (consumed) or `skip_until` (not consumed).
    fn error(
        &mut self,
        code: ParseErrorCode,
        skip_until_after: &[SyntaxKind],
        skip_until: &[SyntaxKind],
    ) {
        self.push_error(code, self.token);
        if skip_until_after.is_empty() && skip_until.is_empty() {
            return;
        }
        let mut kind = self.token.kind;
        while kind != SyntaxKind::Eof {
            if skip_until_after.contains(&kind) {
                self.scan_next();
                break;
            }
            if skip_until.contains(&kind) {
                break;
            }
            kind = self.scan_next();
        }
    }

    fn parse_value(&mut self) -> Option<Node> {
        match self.token.kind {
            SyntaxKind::OpenBrace => Some(self.parse_object()),
            SyntaxKind::OpenBracket => Some(self.parse_array()),
            SyntaxKind::String => {
                let node = Node {
                    kind: NodeKind::String(self.scanner.string_value().to_string()),
                    span: self.token_span(),
                };
                self.scan_next();
                Some(node)
            }
            SyntaxKind::Number => {
                let text = self.scanner.token_text(&self.token);
                let number = match text.parse::<serde_json::Number>() {
                    Ok(number) => number,
                    Err(_) => {
                        self.push_error(ParseErrorCode::InvalidNumberFormat, self.token);
                        serde_json::Number::from(0)
                    }
                };
                Some(self.literal(NodeKind::Number(number)))
            }
            SyntaxKind::True => Some(self.literal(NodeKind::Bool(true))),
            SyntaxKind::False => Some(self.literal(NodeKind::Bool(false))),
            SyntaxKind::Null => Some(self.literal(NodeKind::Null)),
            _ => None,
        }
    }

    fn token_span(&self) -> Span {
        Span::new(self.token.offset, self.token.end())
    }

    fn literal(&mut self, kind: NodeKind) -> Node {
        let node = Node {
            kind,
            span: self.token_span(),
        };
        self.scan_next();
        node
    }

    fn parse_object(&mut self) -> Node {
        let start = self.token.offset;
        let mut properties = Vec::new();
        self.scan_next();

        let mut needs_comma = false;
        while !matches!(self.token.kind, SyntaxKind::CloseBrace | SyntaxKind::Eof) {
            if self.token.kind == SyntaxKind::Comma {
                if !needs_comma {
                    self.error(ParseErrorCode::ValueExpected, &[], &[]);
                }
                self.scan_next();
                if self.token.kind == SyntaxKind::CloseBrace && self.options.allow_trailing_comma {
                    break;
                }
            } else if needs_comma {
                self.error(ParseErrorCode::CommaExpected, &[], &[]);
            }

            match self.parse_property() {
                Some(property) => properties.push(property),
                None => self.error(
                    ParseErrorCode::ValueExpected,
                    &[],
                    &[SyntaxKind::CloseBrace, SyntaxKind::Comma],
                ),
            }
            needs_comma = true;
        }

        if self.token.kind == SyntaxKind::CloseBrace {
            let end = self.token.end();
            self.scan_next();
            Node {
                kind: NodeKind::Object(properties),
                span: Span::new(start, end),
            }
        } else {
            let end = self.last_end.max(start + 1);
            self.error(ParseErrorCode::CloseBraceExpected, &[SyntaxKind::CloseBrace], &[]);
            Node {
                kind: NodeKind::Object(properties),
                span: Span::new(start, end),
            }
        }
    }

    fn parse_property(&mut self) -> Option<Property> {
        if self.token.kind != SyntaxKind::String {
            self.error(
                ParseErrorCode::PropertyNameExpected,
                &[],
                &[SyntaxKind::CloseBrace, SyntaxKind::Comma],
            );
            return None;
        }

        let key = self.scanner.string_value().to_string();
        let key_span = self.token_span();
        self.scan_next();

        let value = if self.token.kind == SyntaxKind::Colon {
            self.scan_next();
            let value = self.parse_value();
            if value.is_none() {
                self.error(
                    ParseErrorCode::ValueExpected,
                    &[],
                    &[SyntaxKind::CloseBrace, SyntaxKind::Comma],
                );
            }
            value
        } else {
            self.error(
                ParseErrorCode::ColonExpected,
                &[],
                &[SyntaxKind::CloseBrace, SyntaxKind::Comma],
            );
            None
        };

        let end = value.as_ref().map_or(key_span.end, |v| v.span.end);
        Some(Property {
            key,
            key_span,
            value,
            span: Span::new(key_span.start, end),
        })
    }

    fn parse_array(&mut self) -> Node {
        let start = self.token.offset;
        let mut items = Vec::new();
        self.scan_next();

        let mut needs_comma = false;
        while !matches!(self.token.kind, SyntaxKind::CloseBracket | SyntaxKind::Eof) {
            if self.token.kind == SyntaxKind::Comma {
                if !needs_comma {
                    self.error(ParseErrorCode::ValueExpected, &[], &[]);
                }
                self.scan_next();
                if self.token.kind == SyntaxKind::CloseBracket && self.options.allow_trailing_comma
                {
                    break;
                }
            } else if needs_comma {
                self.error(ParseErrorCode::CommaExpected, &[], &[]);
            }

            match self.parse_value() {
                Some(item) => items.push(item),
                None => self.error(
                    ParseErrorCode::ValueExpected,
                    &[],
                    &[SyntaxKind::CloseBracket, SyntaxKind::Comma],
                ),
            }
            needs_comma = true;
        }

        if self.token.kind == SyntaxKind::CloseBracket {
            let end = self.token.end();
            self.scan_next();
            Node {
                kind: NodeKind::Array(items),
                span: Span::new(start, end),
            }
        } else {
            let end = self.last_end.max(start + 1);
            self.error(ParseErrorCode::CloseBracketExpected, &[SyntaxKind::CloseBracket], &[]);
            Node {
                kind: NodeKind::Array(items),
                span: Span::new(start, end),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(text: &str) -> Vec<ParseErrorCode> {
        parse(text).errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_parses_object_with_spans() {
        let text = r#"{"a": 1, "b": [true, null], "c": {"d": "x"}}"#;
        let out = parse(text);
        assert!(out.is_ok());
        let root = out.root.unwrap();
        assert_eq!(root.span, Span::new(0, text.len()));

        let a = root.property("a").unwrap();
        assert_eq!(&text[a.key_span.start..a.key_span.end], "\"a\"");
        assert_eq!(a.value.as_ref().unwrap().span, Span::new(6, 7));
        assert_eq!(root.find_path(&["c", "d"]).unwrap().as_str(), Some("x"));
        assert_eq!(root.get("b").unwrap().items().unwrap().len(), 2);
    }

    #[test]
    fn test_comments_and_trailing_commas() {
        let text = "// head\n{\n  \"a\": 1, /* mid */\n  \"b\": [1, 2,],\n}\n";
        assert!(parse(text).is_ok());

        let strict = parse_with_options(text, ParseOptions::strict());
        let strict_codes: Vec<_> = strict.errors.iter().map(|e| e.code).collect();
        assert!(strict_codes.contains(&ParseErrorCode::InvalidCommentToken));
        assert!(strict_codes.contains(&ParseErrorCode::ValueExpected));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let root = parse(r#"{"a": 1, "a": 2}"#).root.unwrap();
        assert_eq!(root.properties().unwrap().len(), 2);
        assert_eq!(
            root.get("a").unwrap().kind,
            NodeKind::Number(serde_json::Number::from(2))
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(codes(""), vec![ParseErrorCode::ValueExpected]);
        assert_eq!(codes("  // only a comment\n"), vec![ParseErrorCode::ValueExpected]);
    }

    #[test]
    fn test_missing_comma_recovers() {
        let out = parse("{\"a\": 1 \"b\": 2}");
        assert_eq!(
            out.errors.iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![ParseErrorCode::CommaExpected]
        );
        let root = out.root.unwrap();
        assert!(root.get("a").is_some());
        assert!(root.get("b").is_some());
    }

    #[test]
    fn test_missing_colon_and_value() {
        assert_eq!(
            codes("{\"a\" 1, \"b\": 2}"),
            vec![ParseErrorCode::ColonExpected]
        );
        assert_eq!(codes("{\"a\": }"), vec![ParseErrorCode::ValueExpected]);
    }

    #[test]
    fn test_unclosed_containers() {
        assert_eq!(codes("{\"a\": 1"), vec![ParseErrorCode::CloseBraceExpected]);
        assert_eq!(codes("[1, 2"), vec![ParseErrorCode::CloseBracketExpected]);

        let out = parse("{\"a\": 1");
        assert_eq!(out.root.unwrap().span, Span::new(0, 7));
    }

    #[test]
    fn test_trailing_content() {
        assert_eq!(codes("{} {}"), vec![ParseErrorCode::EndOfFileExpected]);
    }

    #[test]
    fn test_invalid_symbol_is_skipped() {
        let out = parse("{\"a\": 1, 'b': 2}");
        let codes: Vec<_> = out.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes[0], ParseErrorCode::InvalidSymbol);
        let first = out.errors[0];
        assert_eq!(first.offset, 9);
        assert_eq!(first.length, 3);
    }

    #[test]
    fn test_number_out_of_range() {
        assert_eq!(codes("[1e999]"), vec![ParseErrorCode::InvalidNumberFormat]);
    }

    #[test]
    fn test_error_offsets_point_at_token() {
        let text = "{\n  \"a\": tru\n}";
        let out = parse(text);
        assert_eq!(out.errors[0].code, ParseErrorCode::InvalidSymbol);
        assert_eq!(&text[out.errors[0].offset..out.errors[0].end()], "tru");
    }
}
