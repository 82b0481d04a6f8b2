//! Finding `import "<path>"` expressions in program text.
//!
//! Only the import graph is needed before evaluation, so this is a scanner
//! rather than a parser: it skips comments and string literals and reports
//! every `import` keyword followed by a plain string literal. Anything it
//! cannot make sense of is left for the evaluator to report.

use std::ops::Range;

/// One `import` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    /// The decoded path literal.
    pub path: String,
    /// Byte span of the path literal, quotes included.
    pub literal: Range<usize>,
    /// Byte span from the `import` keyword to the closing quote.
    pub span: Range<usize>,
}

/// Every import in `text`, in source order.
///
/// ```
/// use computed_settings_ncl::find_imports;
///
/// let sites = find_imports("let b = import \"base.ncl\" in b # import \"no\"");
/// assert_eq!(sites.len(), 1);
/// assert_eq!(sites[0].path, "base.ncl");
/// assert_eq!(sites[0].span, 8..25);
/// ```
pub fn find_imports(text: &str) -> Vec<ImportSite> {
    let bytes = text.as_bytes();
    let mut sites = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => i = skip_line(bytes, i),
            b'"' => i = skip_string(bytes, i),
            b'%' => match multiline_open(bytes, i) {
                Some(percents) => i = skip_multiline(bytes, i + percents + 1, percents),
                None => i += 1,
            },
            b'i' if text[i..].starts_with("import")
                && (i == 0 || !is_ident_byte(bytes[i - 1]))
                && !bytes.get(i + 6).copied().is_some_and(is_ident_byte) =>
            {
                let start = i;
                i += 6;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if bytes.get(i) == Some(&b'"') {
                    let end = skip_string(bytes, i);
                    if let Some(path) = decode_literal(&text[i..end]) {
                        sites.push(ImportSite {
                            path,
                            literal: i..end,
                            span: start..end,
                        });
                    }
                    i = end;
                }
            }
            _ => i += 1,
        }
    }
    sites
}

/// Replace each import literal with the quoted path `rename` returns for
/// it and its position in `sites`.
///
/// `sites` must come from [`find_imports`] on the same text.
pub fn rewrite_imports(
    text: &str,
    sites: &[ImportSite],
    mut rename: impl FnMut(usize, &ImportSite) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (position, site) in sites.iter().enumerate() {
        out.push_str(&text[last..site.literal.start]);
        out.push('"');
        for ch in rename(position, site).chars() {
            if matches!(ch, '"' | '\\' | '%') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
        last = site.literal.end;
    }
    out.push_str(&text[last..]);
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'\'')
}

fn skip_line(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Index just past the string literal opening at `i`.
fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    i += 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Number of `%` when a multiline string (`m%"` or a symbolic `-s%"`)
/// opens at `i`.
fn multiline_open(bytes: &[u8], i: usize) -> Option<usize> {
    let percents = bytes[i..].iter().take_while(|&&b| b == b'%').count();
    (bytes.get(i + percents) == Some(&b'"') && i > 0 && is_ident_byte(bytes[i - 1]))
        .then_some(percents)
}

fn skip_multiline(bytes: &[u8], mut i: usize, percents: usize) -> usize {
    while i < bytes.len() {
        if bytes[i] == b'"'
            && bytes[i + 1..].iter().take_while(|&&b| b == b'%').count() >= percents
        {
            return i + 1 + percents;
        }
        i += 1;
    }
    bytes.len()
}

/// The value of a plain string literal, `None` when it interpolates.
fn decode_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(match chars.next()? {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            }),
            '%' if chars.clone().next() == Some('{') => return None,
            other => out.push(other),
        }
    }
    Some(out)
}
