//! Layered configuration, merged on demand.
//!
//! Nothing is copied up front: a cursor walks all layers at once and
//! resolves the merge for the path it points at.
//!
//! # Merge rule
//!
//! Layers are applied left to right and later layers win. Two objects merge
//! key by key; in every other combination the later value replaces the
//! earlier one as a whole. Arrays are therefore never concatenated or merged
//! element-wise.
//!
//! A cursor keeps, for its path, the layer values that still take part in
//! the merge: everything after the last non-object value, or only that
//! non-object value when it is the last one. A later scalar or array thus
//! also discards whatever earlier layers nested beneath that path.
//!
//! # Example
//!
//! ```rust
//! use computed_settings_config::{MergedConfig, from_json};
//!
//! let a = from_json(&serde_json::json!({"x": 1, "y": {"p": 1}}));
//! let b = from_json(&serde_json::json!({"y": {"q": 2}}));
//!
//! let merged = MergedConfig::new(vec![&a, &b]);
//! assert!(merged.contains(&["y", "p"]));
//! assert_eq!(merged.cursor().at("y").keys(), vec!["p", "q"]);
//! ```

use crate::types::{ConfigValue, ConfigValueKind};
use indexmap::IndexSet;

/// Borrowed layers, lowest priority first.
///
/// `MergedConfig` borrows its layers; construction never copies values.
#[derive(Debug, Clone)]
pub struct MergedConfig<'a> {
    layers: Vec<&'a ConfigValue>,
}

/// A position in the merged tree.
#[derive(Debug, Clone)]
pub struct MergedCursor<'a> {
    path: Vec<String>,
    /// `(layer index, value at path)` of the layers still participating
    active: Vec<(usize, &'a ConfigValue)>,
}

/// A resolved non-object value with the layer it came from.
#[derive(Clone, Copy, Debug)]
pub struct MergedLeaf<'a> {
    /// A scalar or an array.
    pub value: &'a ConfigValue,
    /// Index of the winning layer.
    pub layer_index: usize,
}

/// A resolved object: the union of the keys of all participating layers.
#[derive(Debug, Clone)]
pub struct MergedObject<'a> {
    cursor: MergedCursor<'a>,
    keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum MergedValue<'a> {
    Leaf(MergedLeaf<'a>),
    Object(MergedObject<'a>),
}

impl<'a> MergedConfig<'a> {
    /// Later layers win.
    pub fn new(layers: Vec<&'a ConfigValue>) -> Self {
        MergedConfig { layers }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// A copy of `self` with `layer` on top.
    pub fn with_layer(&self, layer: &'a ConfigValue) -> MergedConfig<'a> {
        let layers = self.layers.iter().copied().chain([layer]).collect();
        MergedConfig { layers }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn cursor(&self) -> MergedCursor<'a> {
        MergedCursor {
            path: Vec::new(),
            active: participating(self.layers.iter().copied().enumerate().collect()),
        }
    }

    /// Resolve the value at a path.
    pub fn get(&self, path: &[&str]) -> Option<MergedValue<'a>> {
        self.cursor().at_path(path).as_value()
    }

    /// Check if a path exists in the merged result.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.cursor().at_path(path).exists()
    }
}

/// Apply the replacement rule to the values found at one path.
fn participating(values: Vec<(usize, &ConfigValue)>) -> Vec<(usize, &ConfigValue)> {
    if values.is_empty() {
        return values;
    }
    let last = values[values.len() - 1];
    if !last.1.is_object() {
        return vec![last];
    }
    let start = values
        .iter()
        .rposition(|(_, value)| !value.is_object())
        .map_or(0, |idx| idx + 1);
    values[start..].to_vec()
}

impl<'a> MergedCursor<'a> {
    /// Step into `key`. Missing paths give a cursor that resolves to `None`.
    pub fn at(&self, key: &str) -> MergedCursor<'a> {
        let path = self.path.iter().cloned().chain([key.to_owned()]).collect();

        let children = self
            .active
            .iter()
            .filter_map(|&(idx, value)| match &value.value {
                ConfigValueKind::Object(map) => map.get(key).map(|child| (idx, child)),
                _ => None,
            })
            .collect();

        MergedCursor {
            path,
            active: participating(children),
        }
    }

    /// Step through several keys.
    pub fn at_path(&self, path: &[&str]) -> MergedCursor<'a> {
        path.iter().fold(self.clone(), |cursor, key| cursor.at(key))
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Whether any participating layer has a value here.
    pub fn exists(&self) -> bool {
        !self.active.is_empty()
    }

    /// Child keys at this path, in first-appearance order across layers.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = IndexSet::new();
        for (_, value) in &self.active {
            if let ConfigValueKind::Object(map) = &value.value {
                for key in map.keys() {
                    keys.insert(key.clone());
                }
            }
        }
        keys.into_iter().collect()
    }

    /// Resolve the merge at this path.
    pub fn as_value(&self) -> Option<MergedValue<'a>> {
        let (layer_index, value) = *self.active.last()?;
        if value.is_object() {
            Some(MergedValue::Object(MergedObject {
                cursor: self.clone(),
                keys: self.keys(),
            }))
        } else {
            Some(MergedValue::Leaf(MergedLeaf { value, layer_index }))
        }
    }

    /// Resolve as a non-object value (last wins).
    pub fn as_leaf(&self) -> Option<MergedLeaf<'a>> {
        match self.as_value()? {
            MergedValue::Leaf(leaf) => Some(leaf),
            MergedValue::Object(_) => None,
        }
    }

    /// Resolve as an object.
    pub fn as_object(&self) -> Option<MergedObject<'a>> {
        match self.as_value()? {
            MergedValue::Object(object) => Some(object),
            MergedValue::Leaf(_) => None,
        }
    }

    /// The participating layer values, lowest priority first.
    pub fn contributions(&self) -> &[(usize, &'a ConfigValue)] {
        &self.active
    }
}

impl<'a> MergedObject<'a> {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, key: &str) -> Option<MergedCursor<'a>> {
        self.contains_key(key).then(|| self.cursor.at(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|own| own == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MergedCursor<'a>)> {
        self.keys
            .iter()
            .map(move |key| (key.as_str(), self.cursor.at(key)))
    }

    /// The participating object layers, lowest priority first.
    pub fn contributions(&self) -> &[(usize, &'a ConfigValue)] {
        self.cursor.contributions()
    }
}
