//! Syntax tree to `ConfigValue`, keeping source locations.

use crate::ast::{Node, NodeKind};
use crate::parser::{ParseOutput, parse};
use computed_settings_config::{ConfigValue, ConfigValueKind, Scalar};
use computed_settings_source_map::{FileInformation, SourceInfo, Uri};
use indexmap::IndexMap;

/// Convert a parsed node. Every produced value carries the span of the
/// node it came from in the file `uri`.
///
/// Members whose value was lost to a syntax error are left out; for
/// duplicate keys the later value wins at the position of the first.
pub fn to_config_value(node: &Node, uri: &Uri, text: &str) -> ConfigValue {
    let index = FileInformation::new(text);
    Converter { uri, text, index: &index }.convert(node)
}

/// Parse `text` and convert the root if there is one.
pub fn parse_config(uri: &Uri, text: &str) -> (Option<ConfigValue>, ParseOutput) {
    let output = parse(text);
    let value = output
        .root
        .as_ref()
        .map(|root| to_config_value(root, uri, text));
    (value, output)
}

struct Converter<'a> {
    uri: &'a Uri,
    text: &'a str,
    index: &'a FileInformation,
}

impl Converter<'_> {
    fn convert(&self, node: &Node) -> ConfigValue {
        let kind = match &node.kind {
            NodeKind::Object(properties) => {
                let mut entries = IndexMap::new();
                for property in properties {
                    if let Some(value) = &property.value {
                        entries.insert(property.key.clone(), self.convert(value));
                    }
                }
                ConfigValueKind::Object(entries)
            }
            NodeKind::Array(items) => {
                ConfigValueKind::Array(items.iter().map(|item| self.convert(item)).collect())
            }
            NodeKind::String(s) => ConfigValueKind::Scalar(Scalar::String(s.clone())),
            NodeKind::Number(n) => ConfigValueKind::Scalar(Scalar::Number(n.clone())),
            NodeKind::Bool(b) => ConfigValueKind::Scalar(Scalar::Bool(*b)),
            NodeKind::Null => ConfigValueKind::Scalar(Scalar::Null),
        };

        ConfigValue::new(kind).with_source_info(SourceInfo::from_index(
            self.uri.clone(),
            self.index,
            self.text,
            node.span.start,
            node.span.end,
        ))
    }
}
