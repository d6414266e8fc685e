//! Tagged parse tree for lock documents.
//!
//! The lock grammar nests three shapes:
//!
//! ```yaml
//! - github.com/grafana/jsonnet-libs/ksonnet-util@master commit:7ac7da1a
//! - github.com/grafana/jsonnet-libs/oauth2-proxy@master commit:7ac7da1a:
//!     - github.com/grafana/jsonnet-libs/ksonnet-util@master commit:7ac7da1a
//! ```
//!
//! A list of entries, a single-key mapping (lock line to its dependencies),
//! or a plain lock line. This module only deals with those shapes; the
//! lock lines themselves are interpreted by [`crate::lockfile`].

use serde_yaml::{Mapping, Value};

use crate::DecodeError;

/// One node of a lock document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockNode {
    /// A sequence of sibling nodes.
    List(Vec<LockNode>),
    /// A package with dependencies: its lock line and the dependency nodes.
    Entry {
        /// Lock line of the parent package.
        key: String,
        /// Encoded dependencies of the parent.
        children: Vec<LockNode>,
    },
    /// A package without dependencies.
    Leaf(String),
}

impl LockNode {
    /// Parse YAML text into a node tree. An empty document is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Yaml`] for invalid YAML and
    /// [`DecodeError::Malformed`] for shapes outside the lock grammar.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        if text.trim().is_empty() {
            return Ok(LockNode::List(Vec::new()));
        }
        match serde_yaml::from_str::<Value>(text)? {
            Value::Null => Ok(LockNode::List(Vec::new())),
            value => Self::from_value(value),
        }
    }

    /// Render the tree as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Yaml`] if the emitter fails.
    pub fn render(self) -> Result<String, DecodeError> {
        Ok(serde_yaml::to_string(&self.into_value())?)
    }

    /// Convert a generic YAML value into a node.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] for nulls, numbers, booleans,
    /// tagged values, non-string keys and mappings with more than one key.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(line) => Ok(LockNode::Leaf(line)),
            Value::Sequence(items) => items
                .into_iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(LockNode::List),
            Value::Mapping(map) => Self::from_mapping(map),
            other => Err(DecodeError::Malformed(format!(
                "expected a lock line, a single-key mapping or a list, got {}",
                describe(&other)
            ))),
        }
    }

    fn from_mapping(map: Mapping) -> Result<Self, DecodeError> {
        if map.len() != 1 {
            return Err(DecodeError::Malformed(format!(
                "mapping must have exactly one key, found {}",
                map.len()
            )));
        }

        let Some((key, value)) = map.into_iter().next() else {
            return Err(DecodeError::Malformed("empty mapping".to_string()));
        };
        let Value::String(key) = key else {
            return Err(DecodeError::Malformed(format!(
                "mapping key must be a lock line, got {}",
                describe(&key)
            )));
        };

        // Dependencies are normally a list, but a lone line or mapping is
        // accepted as a one-element list.
        let children = match Self::from_value(value)? {
            LockNode::List(children) => children,
            single => vec![single],
        };

        Ok(LockNode::Entry { key, children })
    }

    /// Convert the node into a generic YAML value.
    pub fn into_value(self) -> Value {
        match self {
            LockNode::Leaf(line) => Value::String(line),
            LockNode::List(items) => {
                Value::Sequence(items.into_iter().map(Self::into_value).collect())
            }
            LockNode::Entry { key, children } => {
                let mut map = Mapping::new();
                map.insert(
                    Value::String(key),
                    Value::Sequence(children.into_iter().map(Self::into_value).collect()),
                );
                Value::Mapping(map)
            }
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        let text = "\
- a@v1 commit:1
- b@v1 commit:2:
    - c@v1 commit:3
";
        let node = LockNode::parse(text).unwrap();
        assert_eq!(
            node,
            LockNode::List(vec![
                LockNode::Leaf("a@v1 commit:1".to_string()),
                LockNode::Entry {
                    key: "b@v1 commit:2".to_string(),
                    children: vec![LockNode::Leaf("c@v1 commit:3".to_string())],
                },
            ])
        );
    }

    #[test]
    fn test_single_child_without_list() {
        let node = LockNode::parse("b@v1 commit:2: c@v1 commit:3").unwrap();
        assert_eq!(
            node,
            LockNode::Entry {
                key: "b@v1 commit:2".to_string(),
                children: vec![LockNode::Leaf("c@v1 commit:3".to_string())],
            }
        );
    }

    #[test]
    fn test_empty_document_is_empty_list() {
        assert_eq!(LockNode::parse("").unwrap(), LockNode::List(Vec::new()));
    }

    #[test]
    fn test_rejects_foreign_shapes() {
        for text in ["- 42", "- true", "- ~", "a: 1\nb: 2", "1: [x]"] {
            assert!(
                matches!(LockNode::parse(text), Err(DecodeError::Malformed(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_render_parses_back() {
        let tree = LockNode::List(vec![LockNode::Entry {
            key: "github.com/a/b@v1 commit:2".to_string(),
            children: vec![LockNode::Leaf("github.com/c/d@v1 commit:3".to_string())],
        }]);
        let text = tree.clone().render().unwrap();
        assert_eq!(LockNode::parse(&text).unwrap(), tree);
    }
}
