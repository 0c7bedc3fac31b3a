//! Resource tree model and dotted-path flattening.
//!
//! A resource file is a tree of string keys whose leaves are translatable
//! text or opaque scalars. The batch pipeline works on the flattened form,
//! where every leaf is addressed by its ancestor keys joined with
//! [`PATH_SEPARATOR`], and rebuilds the tree afterwards.
//!
//! ```ignore
//! let tree = ResourceTree::from_json(json!({"auth": {"failed": "Nope"}}))?;
//! let flat = flatten(&tree);
//! assert!(flat.contains_key("auth.failed"));
//! assert_eq!(unflatten(flat)?, tree);
//! ```

use crate::error::{SyncError, SyncResult};
use indexmap::IndexMap;
use serde_json::Value;

/// Separator used to join nested keys into a dotted path
pub const PATH_SEPARATOR: char = '.';

/// A leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Translatable text
    Text(String),
    /// Anything else (numbers, booleans, null, lists), carried through untouched
    Opaque(Value),
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            Scalar::Opaque(_) => None,
        }
    }
}

/// A node of a resource tree
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceNode {
    Leaf(Scalar),
    Branch(ResourceTree),
}

impl ResourceNode {
    pub fn text(text: impl Into<String>) -> Self {
        ResourceNode::Leaf(Scalar::Text(text.into()))
    }

    /// Text of a string leaf, `None` for anything else
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResourceNode::Leaf(scalar) => scalar.as_text(),
            ResourceNode::Branch(_) => None,
        }
    }

    /// Whether this node holds an existing translation worth keeping
    ///
    /// Empty strings, null and empty branches count as missing.
    pub fn is_filled(&self) -> bool {
        match self {
            ResourceNode::Leaf(Scalar::Text(text)) => !text.is_empty(),
            ResourceNode::Leaf(Scalar::Opaque(value)) => !value.is_null(),
            ResourceNode::Branch(tree) => !tree.is_empty(),
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => ResourceNode::text(text),
            Value::Object(map) => ResourceNode::Branch(ResourceTree::from_object(map)),
            other => ResourceNode::Leaf(Scalar::Opaque(other)),
        }
    }

    fn into_json(self) -> Value {
        match self {
            ResourceNode::Leaf(Scalar::Text(text)) => Value::String(text),
            ResourceNode::Leaf(Scalar::Opaque(value)) => value,
            ResourceNode::Branch(tree) => tree.into_json(),
        }
    }
}

/// An insertion-ordered mapping from key to node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceTree(IndexMap<String, ResourceNode>);

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON document whose root must be an object
    pub fn from_json(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(format!(
                "root must be an object, found {}",
                json_kind(&other)
            )),
        }
    }

    fn from_object(map: serde_json::Map<String, Value>) -> Self {
        ResourceTree(
            map.into_iter()
                .map(|(key, value)| (key, ResourceNode::from_json(value)))
                .collect(),
        )
    }

    pub fn into_json(self) -> Value {
        Value::Object(
            self.0
                .into_iter()
                .map(|(key, node)| (key, node.into_json()))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, node: ResourceNode) -> Option<ResourceNode> {
        self.0.insert(key.into(), node)
    }

    pub fn get(&self, key: &str) -> Option<&ResourceNode> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceNode)> {
        self.0.iter()
    }
}

impl FromIterator<(String, ResourceNode)> for ResourceTree {
    fn from_iter<I: IntoIterator<Item = (String, ResourceNode)>>(iter: I) -> Self {
        ResourceTree(iter.into_iter().collect())
    }
}

/// Dotted path → node, in pre-order of the source tree
///
/// Values are always leaves, except for empty branches which are kept as-is
/// so they survive a round-trip.
pub type FlatMap = IndexMap<String, ResourceNode>;

/// Flatten a tree into dotted paths, depth-first, preserving key order
pub fn flatten(tree: &ResourceTree) -> FlatMap {
    let mut flat = FlatMap::new();
    flatten_into(tree, None, &mut flat);
    flat
}

fn flatten_into(tree: &ResourceTree, prefix: Option<&str>, flat: &mut FlatMap) {
    for (key, node) in tree.iter() {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, PATH_SEPARATOR, key),
            None => key.clone(),
        };

        match node {
            ResourceNode::Branch(child) if !child.is_empty() => {
                flatten_into(child, Some(&path), flat);
            }
            _ => {
                flat.insert(path, node.clone());
            }
        }
    }
}

/// Rebuild a tree from dotted paths
///
/// Intermediate branches are created on demand. A path that runs through an
/// existing leaf, or a leaf that lands on an existing branch, fails with
/// [`SyncError::StructuralConflict`].
pub fn unflatten(flat: FlatMap) -> SyncResult<ResourceTree> {
    let mut root = ResourceTree::new();

    for (path, node) in flat {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| SyncError::StructuralConflict { path: path.clone() })?;

        let mut current = &mut root;
        for segment in parents {
            let entry = current
                .0
                .entry(segment.to_string())
                .or_insert_with(|| ResourceNode::Branch(ResourceTree::new()));
            current = match entry {
                ResourceNode::Branch(child) => child,
                ResourceNode::Leaf(_) => {
                    return Err(SyncError::StructuralConflict { path: path.clone() });
                }
            };
        }

        if current.0.contains_key(*last) {
            return Err(SyncError::StructuralConflict { path: path.clone() });
        }
        current.0.insert(last.to_string(), node);
    }

    Ok(root)
}

/// Where a flat entry of a verbatim-keyed resource came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    /// Top-level key, as written in the file
    pub key: String,
    /// Dotted path below `key`, for values inside a nested object
    pub nested: Option<String>,
}

/// Flat key → origin, as produced by [`flatten_entries`]
pub type EntryLayout = IndexMap<String, EntryPath>;

/// Flatten a resource whose top-level keys are opaque strings
///
/// Top-level keys are never split, so `"Log in."` stays one key. Objects
/// below a top-level key are flattened as in [`flatten`] and addressed as
/// `{key}.{path}`. Two entries landing on the same flat key fail with
/// [`SyncError::StructuralConflict`].
pub fn flatten_entries(tree: &ResourceTree) -> SyncResult<(FlatMap, EntryLayout)> {
    let mut flat = FlatMap::new();
    let mut layout = EntryLayout::new();

    for (key, node) in tree.iter() {
        let entries: Vec<(String, Option<String>, ResourceNode)> = match node {
            ResourceNode::Branch(child) if !child.is_empty() => flatten(child)
                .into_iter()
                .map(|(path, leaf)| {
                    let flat_key = format!("{}{}{}", key, PATH_SEPARATOR, path);
                    (flat_key, Some(path), leaf)
                })
                .collect(),
            _ => vec![(key.clone(), None, node.clone())],
        };

        for (flat_key, nested, leaf) in entries {
            if flat.contains_key(&flat_key) {
                return Err(SyncError::StructuralConflict { path: flat_key });
            }
            layout.insert(
                flat_key.clone(),
                EntryPath {
                    key: key.clone(),
                    nested,
                },
            );
            flat.insert(flat_key, leaf);
        }
    }

    Ok((flat, layout))
}

enum Slot {
    Leaf(ResourceNode),
    Nested(FlatMap),
}

/// Inverse of [`flatten_entries`]
///
/// Every flat key must appear in `layout`.
pub fn unflatten_entries(flat: FlatMap, layout: &EntryLayout) -> SyncResult<ResourceTree> {
    let mut slots: IndexMap<String, Slot> = IndexMap::new();

    for (flat_key, node) in flat {
        let Some(origin) = layout.get(&flat_key) else {
            return Err(SyncError::StructuralConflict { path: flat_key });
        };

        match &origin.nested {
            None => {
                slots.insert(origin.key.clone(), Slot::Leaf(node));
            }
            Some(path) => {
                let slot = slots
                    .entry(origin.key.clone())
                    .or_insert_with(|| Slot::Nested(FlatMap::new()));
                match slot {
                    Slot::Nested(children) => {
                        children.insert(path.clone(), node);
                    }
                    Slot::Leaf(_) => return Err(SyncError::StructuralConflict { path: flat_key }),
                }
            }
        }
    }

    let mut tree = ResourceTree::new();
    for (key, slot) in slots {
        let node = match slot {
            Slot::Leaf(node) => node,
            Slot::Nested(children) => ResourceNode::Branch(unflatten(children)?),
        };
        tree.insert(key, node);
    }
    Ok(tree)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
