/*
 * patch.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Generated region location and rewriting.
 */

//! Rewriting the generated region of a settings file.
//!
//! A destination object owns at most one region, delimited by two line
//! comments:
//!
//! ```jsonc
//! {
//!   "editor.tabSize": 2,
//!   // #region computed-settings
//!   "editor.fontSize": 14,
//!   // #endregion computed-settings
//! }
//! ```
//!
//! Only the text between the markers is ever replaced. Generated members are
//! written one per line, each followed by a comma, so hand-written members
//! after the region stay valid. The output depends only on the value and
//! the indentation, so patching twice with the same value is a no-op.

use computed_settings_config::{ConfigValue, PropertyPath, member_text, quote_key};
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_jsonc::{Node, ParseError, Scanner, Span, SyntaxKind, parse, to_config_value};
use computed_settings_source_map::{FileInformation, SourceInfo, Uri};
use indexmap::IndexMap;
use thiserror::Error;

/// Opening marker comment.
pub const REGION_START: &str = "// #region computed-settings";
/// Closing marker comment.
pub const REGION_END: &str = "// #endregion computed-settings";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("the destination file has {} syntax error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error("`// #region computed-settings` has no matching `// #endregion computed-settings`")]
    NoClosingComment { open: Span },

    #[error("`{path}` is a {found}, not an object")]
    InvalidDestination {
        path: PropertyPath,
        found: &'static str,
        span: Span,
    },
}

impl PatchError {
    /// Diagnostics for this error, located in the destination file.
    pub fn to_diagnostics(&self, uri: &Uri, text: &str) -> Vec<DiagnosticMessage> {
        let index = FileInformation::new(text);
        let at = |span: Span| SourceInfo::from_index(uri.clone(), &index, text, span.start, span.end);
        match self {
            PatchError::Parse(errors) => errors
                .iter()
                .map(|error| {
                    ErrorKind::CannotParseFile
                        .diagnostic()
                        .problem(error.code.to_string())
                        .add_hint("Fix the syntax error; the file is left untouched until then")
                        .with_location(at(Span::new(error.offset, error.end())))
                        .build()
                })
                .collect(),
            PatchError::NoClosingComment { open } => vec![
                ErrorKind::NoClosingComment
                    .diagnostic()
                    .problem(self.to_string())
                    .add_hint(format!("Add `{REGION_END}` after the generated members"))
                    .with_location(at(*open))
                    .build(),
            ],
            PatchError::InvalidDestination { span, .. } => vec![
                ErrorKind::InvalidDestination
                    .diagnostic()
                    .problem(self.to_string())
                    .with_location(at(*span))
                    .build(),
            ],
        }
    }
}

/// The location of a region's two marker comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedRegion {
    pub open: Span,
    pub close: Span,
}

impl GeneratedRegion {
    /// The text between the markers.
    pub fn inner(&self) -> Span {
        Span::new(self.open.end, self.close.start)
    }

    pub fn inner_text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.open.end..self.close.start]
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Marker {
    Open,
    Close,
}

fn marker(comment: &str) -> Option<Marker> {
    let body = comment.strip_prefix("//")?.trim();
    if Some(body) == REGION_START.strip_prefix("// ") {
        Some(Marker::Open)
    } else if Some(body) == REGION_END.strip_prefix("// ") {
        Some(Marker::Close)
    } else {
        None
    }
}

/// Find the region directly inside the object spanning `object`.
///
/// Markers inside member values (nested objects and arrays) and inside
/// strings are not considered. A close marker before any open marker is
/// ignored; an open marker without a close marker is an error.
pub fn locate_in(text: &str, object: Span) -> Result<Option<GeneratedRegion>, PatchError> {
    let mut scanner = Scanner::starting_at(text, object.start);
    let mut depth = 0usize;
    let mut open: Option<Span> = None;

    loop {
        let token = scanner.scan();
        if token.kind == SyntaxKind::Eof || token.offset >= object.end {
            break;
        }
        match token.kind {
            SyntaxKind::OpenBrace | SyntaxKind::OpenBracket => depth += 1,
            SyntaxKind::CloseBrace | SyntaxKind::CloseBracket => depth = depth.saturating_sub(1),
            SyntaxKind::LineComment if depth == 1 => {
                let span = Span::new(token.offset, token.end());
                match (marker(scanner.token_text(&token)), open) {
                    (Some(Marker::Open), None) => open = Some(span),
                    (Some(Marker::Close), Some(open)) => {
                        return Ok(Some(GeneratedRegion { open, close: span }));
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    match open {
        Some(open) => Err(PatchError::NoClosingComment { open }),
        None => Ok(None),
    }
}

/// Find the region of the document's root object.
pub fn locate(text: &str) -> Result<Option<GeneratedRegion>, PatchError> {
    locate_in(text, Span::new(0, text.len()))
}

/// Where a separator is needed before text appended to `text`.
///
/// Trailing whitespace and comments are skipped. If what remains ends a
/// value (a quote, `}`, `]`, the last letter of `true`, `false` or `null`,
/// or a digit) the separator goes right after it; otherwise none is needed.
///
/// ```
/// use computed_settings_core::comma_insertion_offset;
///
/// assert_eq!(comma_insertion_offset("{\"a\":1 /* trailing */"), Some(6));
/// assert_eq!(comma_insertion_offset("{"), None);
/// ```
pub fn comma_insertion_offset(text: &str) -> Option<usize> {
    let mut text = text;
    loop {
        text = text.trim_end();
        if let Some(body) = text.strip_suffix("*/") {
            text = &text[..body.rfind("/*").unwrap_or(0)];
            continue;
        }
        let line_start = text.rfind(['\n', '\r']).map_or(0, |i| i + 1);
        if let Some(comment) = line_comment_start(&text[line_start..]) {
            text = &text[..line_start + comment];
            continue;
        }
        break;
    }

    let last = text.chars().next_back()?;
    let ends_value = matches!(last, '"' | '}' | ']' | 'e' | 'l') || last.is_ascii_digit();
    ends_value.then_some(text.len())
}

/// Offset of a `//` comment in `line`, outside string literals and
/// block comments.
fn line_comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return Some(i),
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                // An unclosed block runs past the end of the line
                i = line[i + 2..].find("*/").map(|end| i + 2 + end + 1)?;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// The indentation unit used in `text`: the leading whitespace of the
/// first indented line.
pub fn detect_indent(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let content = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - content.len()];
        if indent.is_empty() || content.trim().is_empty() {
            return None;
        }
        if indent.starts_with('\t') {
            Some("\t".to_string())
        } else {
            Some(" ".repeat(indent.len() - indent.trim_start_matches(' ').len()))
        }
    })
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind(['\n', '\r']).map_or(0, |i| i + 1)
}

fn leading_whitespace(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// The text between the start of `offset`'s line and `offset`, if it is
/// only whitespace.
fn indentation_before(text: &str, offset: usize) -> Option<&str> {
    let prefix = &text[line_start(text, offset)..offset];
    prefix
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(prefix)
}

/// Writes generated regions with a fixed indentation unit and line ending.
struct Writer<'a> {
    unit: &'a str,
    eol: &'a str,
}

impl Writer<'_> {
    fn members(&self, value: &ConfigValue, indent: &str) -> String {
        let mut out = String::new();
        if let Some(entries) = value.as_object() {
            for (key, member) in entries {
                out.push_str(indent);
                out.push_str(&member_text(key, member, self.unit, indent).replace('\n', self.eol));
                out.push(',');
                out.push_str(self.eol);
            }
        }
        out
    }

    fn region(&self, value: &ConfigValue, indent: &str) -> String {
        format!(
            "{indent}{REGION_START}{eol}{members}{indent}{REGION_END}{eol}",
            eol = self.eol,
            members = self.members(value, indent),
        )
    }

    /// Members `path[0]: { path[1]: { ... region ... } }`, outermost at `indent`.
    fn chain(&self, path: &[String], value: &ConfigValue, indent: &str) -> String {
        let Some((first, rest)) = path.split_first() else {
            return self.region(value, indent);
        };
        let inner = format!("{indent}{}", self.unit);
        format!(
            "{indent}{}: {{{eol}{}{indent}}}{eol}",
            quote_key(first),
            self.chain(rest, value, &inner),
            eol = self.eol,
        )
    }
}

/// Replace the inside of `region` with `value`'s members.
///
/// Members are indented like the opening marker. When the region gets
/// members, a separator is inserted after a preceding sibling that lacks
/// one.
pub fn replace_region(
    text: &str,
    region: &GeneratedRegion,
    value: &ConfigValue,
    indent_unit: &str,
) -> String {
    let eol = line_ending(text);
    let writer = Writer {
        unit: indent_unit,
        eol,
    };
    let indent = leading_whitespace(text, region.open.start);
    let inner = format!("{eol}{}{indent}", writer.members(value, indent));

    let comma = if has_members(value) {
        comma_insertion_offset(&text[..region.open.start])
    } else {
        None
    };
    splice(text, comma, region.inner(), &inner)
}

fn has_members(value: &ConfigValue) -> bool {
    value.as_object().is_some_and(|entries| !entries.is_empty())
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// `text` with `replacement` in place of `span` and, optionally, a comma
/// inserted at an earlier offset.
fn splice(text: &str, comma: Option<usize>, span: Span, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len() + 1);
    let mut from = 0;
    if let Some(at) = comma.filter(|at| *at <= span.start) {
        out.push_str(&text[..at]);
        out.push(',');
        from = at;
    }
    out.push_str(&text[from..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

/// Text appended at the end of `object`, given its member indentation.
fn insert_at_end(
    text: &str,
    object: &Node,
    separator: bool,
    content: impl FnOnce(&str) -> String,
    unit: &str,
) -> String {
    let close = object.span.end.saturating_sub(1);
    let close_indent = leading_whitespace(text, object.span.start);
    let indent = object
        .properties()
        .and_then(|properties| properties.first())
        .and_then(|first| indentation_before(text, first.key_span.start))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{close_indent}{unit}"));

    let own_line = indentation_before(text, close).is_some();
    let (at, insertion) = if own_line {
        (line_start(text, close), content(&indent))
    } else {
        let eol = line_ending(text);
        (close, format!("{eol}{}{close_indent}", content(&indent)))
    };

    let comma = if separator {
        comma_insertion_offset(&text[..at])
    } else {
        None
    };
    splice(text, comma, Span::new(at, at), &insertion)
}

/// Write `value` into the region of the object at `property` in `text`.
///
/// Empty text gets a fresh root object; missing objects along `property`
/// are created at the end of the deepest existing one; a missing region is
/// created at the end of the destination object. `indent_unit` is used
/// unless the file already shows its own indentation.
pub fn patch_destination(
    text: &str,
    property: &PropertyPath,
    value: &ConfigValue,
    indent_unit: &str,
) -> Result<String, PatchError> {
    let source = if text.trim().is_empty() { "{\n}\n" } else { text };
    let output = parse(source);
    if !output.errors.is_empty() {
        return Err(PatchError::Parse(output.errors));
    }
    let Some(root) = output.root else {
        return Err(PatchError::Parse(Vec::new()));
    };
    let unit = detect_indent(source).unwrap_or_else(|| indent_unit.to_string());
    let writer = Writer {
        unit: &unit,
        eol: line_ending(source),
    };

    let segments = property.segments();
    let mut object = &root;
    for (depth, segment) in segments.iter().enumerate() {
        check_object(object, &segments[..depth])?;
        match object.get(segment) {
            Some(child) => object = child,
            None => {
                let rest = &segments[depth..];
                return Ok(insert_at_end(
                    source,
                    object,
                    true,
                    |indent| writer.chain(rest, value, indent),
                    &unit,
                ));
            }
        }
    }
    check_object(object, segments)?;

    match locate_in(source, object.span)? {
        Some(region) => Ok(replace_region(source, &region, value, &unit)),
        None => Ok(insert_at_end(
            source,
            object,
            has_members(value),
            |indent| writer.region(value, indent),
            &unit,
        )),
    }
}

fn check_object(node: &Node, path: &[String]) -> Result<(), PatchError> {
    if node.is_object() {
        return Ok(());
    }
    Err(PatchError::InvalidDestination {
        path: PropertyPath::new(path.iter().cloned()),
        found: node.type_name(),
        span: node.span,
    })
}

/// Read back the members inside the region of the object at `property`.
///
/// Returns `None` when there is no such object or it has no region.
pub fn region_value(
    uri: &Uri,
    text: &str,
    property: &PropertyPath,
) -> Result<Option<ConfigValue>, PatchError> {
    let output = parse(text);
    if !output.errors.is_empty() {
        return Err(PatchError::Parse(output.errors));
    }
    let Some(object) = output
        .root
        .as_ref()
        .and_then(|root| root.find_path(property.segments()))
        .filter(|node| node.is_object())
    else {
        return Ok(None);
    };
    let Some(region) = locate_in(text, object.span)? else {
        return Ok(None);
    };

    let inner = region.inner();
    let mut entries = IndexMap::new();
    for member in object.properties().unwrap_or_default() {
        if inner.contains(member.span.start)
            && let Some(value) = &member.value
        {
            entries.insert(member.key.clone(), to_config_value(value, uri, text));
        }
    }
    Ok(Some(ConfigValue::new_object(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use computed_settings_config::{from_json, to_json};
    use computed_settings_source_map::PathConvention;
    use serde_json::json;

    fn value(json: serde_json::Value) -> ConfigValue {
        from_json(&json)
    }

    fn patch_root(text: &str, json: serde_json::Value) -> String {
        patch_destination(text, &PropertyPath::root(), &value(json), "  ").unwrap()
    }

    #[test]
    fn test_comma_insertion_table() {
        assert_eq!(comma_insertion_offset(r#"{"a":1"#), Some(6));
        assert_eq!(comma_insertion_offset(r#"{"a":"x""#), Some(8));
        assert_eq!(comma_insertion_offset(r#"{"a":[1,2]"#), Some(10));
        assert_eq!(comma_insertion_offset(r#"{"a":true"#), Some(9));
        assert_eq!(comma_insertion_offset(r#"{"a":null"#), Some(9));
        assert_eq!(comma_insertion_offset(r#"{"a":{}"#), Some(7));
        assert_eq!(comma_insertion_offset("{"), None);
        assert_eq!(comma_insertion_offset(r#"{"a":1 /* trailing */"#), Some(6));
        assert_eq!(comma_insertion_offset(""), None);
    }

    #[test]
    fn test_comma_insertion_skips_comments() {
        assert_eq!(comma_insertion_offset("{\"a\":1,\n  // full line\n"), None);
        assert_eq!(comma_insertion_offset("{\"a\":1\n  // one\n  /* two */\n  "), Some(6));
        assert_eq!(comma_insertion_offset("{\"a\":1 /* x */ /* y */"), Some(6));
        // A comment after a value on the same line
        assert_eq!(comma_insertion_offset("{\"a\":null // note"), Some(9));
        // `//` inside a string is not a comment
        assert_eq!(comma_insertion_offset(r#"{"a": "x // y""#), Some(14));
        assert_eq!(comma_insertion_offset("{\"a\":false\r\n  // x\r\n"), Some(10));
        // `//` inside a block comment is not a comment either
        let text = "{\n  /* see http://x */ \"a\": 1";
        assert_eq!(comma_insertion_offset(text), Some(text.len()));
        assert_eq!(comma_insertion_offset("{\"a\":1 /* http://x */"), Some(6));

        let patched = patch_root("{\n  /* see http://x */ \"a\": 1\n}", json!({"b": 2}));
        let output = parse(&patched);
        assert!(output.errors.is_empty(), "{patched}");
        assert_eq!(
            to_json(&to_config_value(
                output.root.as_ref().unwrap(),
                &Uri::file("/s.json", PathConvention::Posix),
                &patched,
            )),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn test_markers() {
        assert!(marker("// #region computed-settings") == Some(Marker::Open));
        assert!(marker("//#region computed-settings  ") == Some(Marker::Open));
        assert!(marker("// #endregion computed-settings") == Some(Marker::Close));
        assert!(marker("// #region other").is_none());
        assert!(marker("/* #region computed-settings */").is_none());
    }

    #[test]
    fn test_locate() {
        let text = "{\n  // #region computed-settings\n  \"a\": 1,\n  // #endregion computed-settings\n}";
        let region = locate(text).unwrap().unwrap();
        assert_eq!(region.open.start, 4);
        assert_eq!(region.inner_text(text), "\n  \"a\": 1,\n  ");
    }

    #[test]
    fn test_locate_ignores_nested_and_string_markers() {
        let text = r#"{
  "a": {
    // #region computed-settings
  },
  "b": "// #region computed-settings"
}"#;
        assert_eq!(locate(text).unwrap(), None);
    }

    #[test]
    fn test_open_marker_without_close() {
        let text = "{\n  // #region computed-settings\n  \"a\": 1\n}";
        let err = locate(text).unwrap_err();
        assert_eq!(
            err,
            PatchError::NoClosingComment {
                open: Span::new(4, 32)
            }
        );
        let err = patch_destination(text, &PropertyPath::root(), &value(json!({})), "  ")
            .unwrap_err();
        let uri = Uri::file("/s.json", PathConvention::Posix);
        let diagnostics = err.to_diagnostics(&uri, text);
        assert_eq!(diagnostics[0].error_kind(), Some(ErrorKind::NoClosingComment));
        assert_eq!(diagnostics[0].location.as_ref().unwrap().range.start.row, 1);
    }

    #[test]
    fn test_rewrites_only_the_region() {
        let text = r#"{
  "editor.fontSize": 10,
  // #region computed-settings
  "x": 1,
  // #endregion computed-settings
  "after": true
}
"#;
        let patched = patch_root(text, json!({"x": 2, "w": 3}));
        assert_eq!(
            patched,
            r#"{
  "editor.fontSize": 10,
  // #region computed-settings
  "x": 2,
  "w": 3,
  // #endregion computed-settings
  "after": true
}
"#
        );
    }

    #[test]
    fn test_creates_region_in_empty_file() {
        let expected = "{\n  // #region computed-settings\n  \"a\": 1,\n  // #endregion computed-settings\n}\n";
        assert_eq!(patch_root("", json!({"a": 1})), expected);
        assert_eq!(patch_root("  \n", json!({"a": 1})), expected);
    }

    #[test]
    fn test_appends_region_after_last_member() {
        let text = "{\n    \"a\": [1, 2]\n}";
        let patched = patch_root(text, json!({"b": {"c": true}}));
        assert_eq!(
            patched,
            "{\n    \"a\": [1, 2],\n    // #region computed-settings\n    \"b\": {\n        \"c\": true\n    },\n    // #endregion computed-settings\n}"
        );
        assert_eq!(patch_root(&patched, json!({"b": {"c": true}})), patched);
    }

    #[test]
    fn test_single_line_object() {
        let patched = patch_root(r#"{"a": 1}"#, json!({"x": 2}));
        assert_eq!(
            patched,
            "{\"a\": 1,\n  // #region computed-settings\n  \"x\": 2,\n  // #endregion computed-settings\n}"
        );
        assert_eq!(patch_root(&patched, json!({"x": 2})), patched);
    }

    #[test]
    fn test_empty_region_adds_no_separator() {
        let text = "{\n  \"a\": 1\n}";
        let patched = patch_root(text, json!({}));
        assert_eq!(
            patched,
            "{\n  \"a\": 1\n  // #region computed-settings\n  // #endregion computed-settings\n}"
        );
        // Filling the region later repairs the separator
        let filled = patch_root(&patched, json!({"b": 2}));
        assert_eq!(
            filled,
            "{\n  \"a\": 1,\n  // #region computed-settings\n  \"b\": 2,\n  // #endregion computed-settings\n}"
        );
        assert!(parse(&filled).is_ok());
    }

    #[test]
    fn test_creates_property_chain() {
        let text = "{\n  \"folders\": []\n}";
        let property = PropertyPath::new(["settings"]);
        let patched = patch_destination(text, &property, &value(json!({"x": 1})), "  ").unwrap();
        assert_eq!(
            patched,
            r#"{
  "folders": [],
  "settings": {
    // #region computed-settings
    "x": 1,
    // #endregion computed-settings
  }
}"#
        );
        let again = patch_destination(&patched, &property, &value(json!({"x": 1})), "  ").unwrap();
        assert_eq!(again, patched);
    }

    #[test]
    fn test_nested_destination() {
        let text = "{\n\t\"a\": {\n\t\t\"keep\": 1\n\t}\n}\n";
        let property = PropertyPath::new(["a", "b"]);
        let patched = patch_destination(text, &property, &value(json!({"x": 1})), "  ").unwrap();
        assert_eq!(
            patched,
            "{\n\t\"a\": {\n\t\t\"keep\": 1,\n\t\t\"b\": {\n\t\t\t// #region computed-settings\n\t\t\t\"x\": 1,\n\t\t\t// #endregion computed-settings\n\t\t}\n\t}\n}\n"
        );
    }

    #[test]
    fn test_invalid_destination() {
        let text = r#"{"settings": [1]}"#;
        let err = patch_destination(text, &PropertyPath::new(["settings"]), &value(json!({})), "  ")
            .unwrap_err();
        assert_eq!(
            err,
            PatchError::InvalidDestination {
                path: PropertyPath::new(["settings"]),
                found: "array",
                span: Span::new(13, 16),
            }
        );
        let err = patch_destination("[]", &PropertyPath::root(), &value(json!({})), "  ")
            .unwrap_err();
        assert_eq!(
            err,
            PatchError::InvalidDestination {
                path: PropertyPath::root(),
                found: "array",
                span: Span::new(0, 2),
            }
        );
    }

    #[test]
    fn test_refuses_unparseable_destination() {
        let err = patch_destination("{\"a\": }", &PropertyPath::root(), &value(json!({})), "  ")
            .unwrap_err();
        assert!(matches!(err, PatchError::Parse(errors) if errors.len() == 1));
    }

    #[test]
    fn test_crlf_is_preserved() {
        let text = "{\r\n  \"a\": 1\r\n}\r\n";
        let patched = patch_root(text, json!({"b": [1]}));
        assert_eq!(
            patched,
            "{\r\n  \"a\": 1,\r\n  // #region computed-settings\r\n  \"b\": [\r\n    1\r\n  ],\r\n  // #endregion computed-settings\r\n}\r\n"
        );
        assert_eq!(patch_root(&patched, json!({"b": [1]})), patched);
    }

    #[test]
    fn test_region_round_trip() {
        let uri = Uri::file("/s.json", PathConvention::Posix);
        let computed = value(json!({"s": "a \"quoted\" // value", "n": 1.5, "o": {"k": null}, "l": [true]}));
        let text = "{\n  // hand written\n  \"h\": 0\n}\n";
        let patched = patch_root(text, to_json(&computed));
        let read = region_value(&uri, &patched, &PropertyPath::root()).unwrap().unwrap();
        assert_eq!(read, computed);
        assert!(patched.starts_with("{\n  // hand written\n  \"h\": 0,\n"));
    }

    #[test]
    fn test_detect_indent() {
        assert_eq!(detect_indent("{\n    \"a\": 1\n}").as_deref(), Some("    "));
        assert_eq!(detect_indent("{\n\t\"a\": 1\n}").as_deref(), Some("\t"));
        assert_eq!(detect_indent("{}"), None);
        assert_eq!(detect_indent("{\n   \n  \"a\": 1\n}").as_deref(), Some("  "));
    }
}
