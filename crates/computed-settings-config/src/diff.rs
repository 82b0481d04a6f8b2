//! Structural differences between two configuration values.

use crate::path::PropertyPath;
use crate::types::{ConfigValue, ConfigValueKind};

/// One point where two values disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// Path of the disagreeing member, relative to the compared roots
    pub path: PropertyPath,
    pub kind: DifferenceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DifferenceKind {
    /// Present in the expected value only
    Missing { expected: ConfigValue },
    /// Present in the actual value only
    Unexpected { actual: ConfigValue },
    /// Present in both with different values
    Changed {
        expected: ConfigValue,
        actual: ConfigValue,
    },
}

/// List the differences between `expected` and `actual`.
///
/// Objects are compared member by member (order-insensitive); arrays and
/// scalars are compared as a whole, like the merge treats them. Source
/// locations are ignored.
pub fn diff(expected: &ConfigValue, actual: &ConfigValue) -> Vec<Difference> {
    let mut out = Vec::new();
    diff_into(expected, actual, &PropertyPath::root(), &mut out);
    out
}

fn diff_into(
    expected: &ConfigValue,
    actual: &ConfigValue,
    path: &PropertyPath,
    out: &mut Vec<Difference>,
) {
    match (&expected.value, &actual.value) {
        (ConfigValueKind::Object(e), ConfigValueKind::Object(a)) => {
            for (key, expected_child) in e {
                let child_path = path.child(key.clone());
                match a.get(key) {
                    Some(actual_child) => diff_into(expected_child, actual_child, &child_path, out),
                    None => out.push(Difference {
                        path: child_path,
                        kind: DifferenceKind::Missing {
                            expected: expected_child.clone(),
                        },
                    }),
                }
            }
            for (key, actual_child) in a {
                if !e.contains_key(key) {
                    out.push(Difference {
                        path: path.child(key.clone()),
                        kind: DifferenceKind::Unexpected {
                            actual: actual_child.clone(),
                        },
                    });
                }
            }
        }
        _ if expected == actual => {}
        _ => out.push(Difference {
            path: path.clone(),
            kind: DifferenceKind::Changed {
                expected: expected.clone(),
                actual: actual.clone(),
            },
        }),
    }
}
