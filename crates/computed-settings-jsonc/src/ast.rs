//! Syntax tree with byte spans.

/// A byte range `start..end` in the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Vec<Property>),
    Array(Vec<Node>),
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

/// A value node. Container spans run from the opening to the closing
/// delimiter inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// An object member. `span` covers the key through the end of the value.
///
/// `value` is `None` when the member was cut short by a syntax error.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub key_span: Span,
    pub value: Option<Node>,
    pub span: Span,
}

impl Node {
    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Bool(_) => "boolean",
            NodeKind::Null => "null",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&[Property]> {
        match &self.kind {
            NodeKind::Object(props) => Some(props),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The effective member named `key`: with duplicate keys the last one wins.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties()?
            .iter()
            .rev()
            .find(|p| p.key == key && p.value.is_some())
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.property(key)?.value.as_ref()
    }

    /// Follow object members along `path`.
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        path.iter().try_fold(self, |node, key| node.get(key.as_ref()))
    }
}
