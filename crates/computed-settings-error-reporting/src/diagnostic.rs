//! The diagnostic value and its two renderings.
//!
//! A diagnostic is a title plus optional code, problem statement, bulleted
//! details, hints and location. Text output uses `✖`/`ℹ`/`•` bullets and
//! `?` hints; when the located file's content is known, ariadne draws the
//! snippet. JSON output is stable for tooling.

use computed_settings_source_map::{SourceContext, SourceInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Blocks the affected target: it is not computed or not written.
    Error,
    Warning,
    Info,
}

impl DiagnosticKind {
    fn heading(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    Error,
    Info,
    Note,
}

impl DetailKind {
    fn bullet(self) -> char {
        match self {
            Self::Error => '✖',
            Self::Info => 'ℹ',
            Self::Note => '•',
        }
    }
}

/// Message text. Markdown uses backticks for code and is what `&str` and
/// `String` convert into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum MessageContent {
    Plain(String),
    Markdown(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        let (Self::Plain(text) | Self::Markdown(text)) = self;
        text
    }

    /// `{"type": "plain" | "markdown", "content": ...}`
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Markdown(text.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Markdown(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A problem found while computing settings.
///
/// Diagnostics built from an [`crate::ErrorKind`] carry its code (for
/// example `CS-1-1`) and use its fixed message as the title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    pub kind: DiagnosticKind,
    /// What went wrong, in a sentence.
    pub problem: Option<MessageContent>,
    pub details: Vec<DetailItem>,
    pub hints: Vec<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// A bare diagnostic. [`crate::DiagnosticMessageBuilder`] and
    /// [`crate::ErrorKind::diagnostic`] are usually more convenient.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        DiagnosticMessage {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: vec![],
            hints: vec![],
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(self, code: impl Into<String>) -> Self {
        DiagnosticMessage {
            code: Some(code.into()),
            ..self
        }
    }

    /// The error kind this diagnostic belongs to, if its code is one of ours.
    pub fn error_kind(&self) -> Option<crate::ErrorKind> {
        crate::ErrorKind::from_code(self.code.as_deref()?)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Error)
    }

    /// Plain text rendering.
    ///
    /// ```text
    /// Error [CS-1-3]: cannot parse file
    ///   --> file:///w/a.json:2:3
    /// Value expected
    /// ✖ detail
    /// ? hint
    /// ```
    ///
    /// If `ctx` holds the content of the located file, the header and
    /// location line are replaced by an ariadne snippet, and details located
    /// in that file become labels in it.
    ///
    /// ```
    /// use computed_settings_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let text = DiagnosticMessageBuilder::error("cannot parse file")
    ///     .problem("Value expected")
    ///     .add_hint("Remove the trailing comma?")
    ///     .build()
    ///     .to_text(None);
    /// assert_eq!(text, "Error: cannot parse file\nValue expected\n? Remove the trailing comma?\n");
    /// ```
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        self.render(ctx, false)
    }

    /// [`DiagnosticMessage::to_text`] with ANSI colors in snippets.
    pub fn to_ansi_text(&self, ctx: Option<&SourceContext>) -> String {
        self.render(ctx, true)
    }

    fn render(&self, ctx: Option<&SourceContext>, color: bool) -> String {
        let snippet = self
            .location
            .as_ref()
            .zip(ctx)
            .and_then(|(location, ctx)| self.snippet(location, ctx, color));

        let mut out = String::new();
        let labelled = |detail: &DetailItem| {
            snippet.is_some()
                && matches!(
                    (&detail.location, &self.location),
                    (Some(at), Some(main)) if at.uri == main.uri
                )
        };

        match &snippet {
            Some(snippet) => out.push_str(snippet),
            None => {
                out.push_str(self.kind.heading());
                if let Some(code) = &self.code {
                    let _ = write!(out, " [{code}]");
                }
                let _ = writeln!(out, ": {}", self.title);
                if let Some(location) = &self.location {
                    let _ = writeln!(out, "  --> {location}");
                }
                if let Some(problem) = &self.problem {
                    let _ = writeln!(out, "{}", problem.as_str());
                }
            }
        }

        for detail in self.details.iter().filter(|d| !labelled(d)) {
            let _ = write!(out, "{} {}", detail.kind.bullet(), detail.content.as_str());
            if let Some(at) = &detail.location {
                let _ = write!(out, " ({at})");
            }
            out.push('\n');
        }
        for hint in &self.hints {
            let _ = writeln!(out, "? {}", hint.as_str());
        }
        out
    }

    /// JSON rendering. Empty parts are omitted and locations carry both
    /// byte offsets and zero-based line/character positions.
    ///
    /// ```
    /// use computed_settings_error_reporting::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::warning("stale").with_code("CS-4-1").to_json();
    /// assert_eq!(json["kind"], "warning");
    /// assert_eq!(json["code"], "CS-4-1");
    /// assert!(json.get("details").is_none());
    /// ```
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("kind".into(), json!(self.kind));
        obj.insert("title".into(), json!(self.title));
        if let Some(code) = &self.code {
            obj.insert("code".into(), json!(code));
        }
        if let Some(problem) = &self.problem {
            obj.insert("problem".into(), problem.to_json());
        }
        if !self.details.is_empty() {
            let details = self.details.iter().map(|detail| {
                let mut entry = json!({
                    "kind": detail.kind,
                    "content": detail.content.to_json(),
                });
                if let Some(at) = &detail.location {
                    entry["location"] = location_json(at);
                }
                entry
            });
            obj.insert("details".into(), Value::Array(details.collect()));
        }
        if !self.hints.is_empty() {
            let hints = self.hints.iter().map(MessageContent::to_json).collect();
            obj.insert("hints".into(), Value::Array(hints));
        }
        if let Some(location) = &self.location {
            obj.insert("location".into(), location_json(location));
        }
        Value::Object(obj)
    }

    /// ariadne report for the main location, or `None` when the file or
    /// the offsets are unknown to `ctx`.
    fn snippet(&self, main: &SourceInfo, ctx: &SourceContext, color: bool) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let content = ctx.get_file(&main.uri)?.content.as_str();
        let id = main.uri.to_string();
        // ariadne counts characters, not bytes
        let span = |info: &SourceInfo| {
            let start = char_index(content, info.start_offset())?;
            let end = char_index(content, info.end_offset())?;
            Some((id.clone(), start..end.max(start)))
        };

        let (report_kind, paint) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
        };
        let main_span = span(main)?;
        let heading = match &self.code {
            Some(code) => format!("[{code}] {}", self.title),
            None => self.title.clone(),
        };
        let main_label = self
            .problem
            .as_ref()
            .map_or(self.title.as_str(), MessageContent::as_str);

        let mut report = Report::build(report_kind, id.clone(), main_span.1.start)
            .with_config(Config::default().with_color(color))
            .with_message(heading)
            .with_label(Label::new(main_span).with_message(main_label).with_color(paint));

        for detail in &self.details {
            let Some(at) = detail.location.as_ref().filter(|at| at.uri == main.uri) else {
                continue;
            };
            let Some(detail_span) = span(at) else {
                continue;
            };
            let paint = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
                DetailKind::Note => Color::Blue,
            };
            report = report.with_label(
                Label::new(detail_span)
                    .with_message(detail.content.as_str())
                    .with_color(paint),
            );
        }

        let mut buffer = Vec::new();
        report
            .finish()
            .write((id, Source::from(content)), &mut buffer)
            .ok()?;
        String::from_utf8(buffer).ok()
    }
}

fn char_index(content: &str, offset: usize) -> Option<usize> {
    content.get(..offset).map(|prefix| prefix.chars().count())
}

fn location_json(location: &SourceInfo) -> Value {
    let position = |p: &computed_settings_source_map::Location| {
        json!({ "offset": p.offset, "line": p.row, "character": p.column })
    };
    json!({
        "uri": location.uri.as_str(),
        "range": {
            "start": position(&location.range.start),
            "end": position(&location.range.end),
        }
    })
}
