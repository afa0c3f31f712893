// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The tree node type and its accessors.
//!
//! Accessors come in two flavours:
//!
//! | Accessor | On absent key | On wrong type |
//! |----------|---------------|---------------|
//! | `get` | `Null` | n/a |
//! | `get_string` / `get_int` / `get_float` / `get_bool` | zero value | zero value |
//! | `get_object` / `get_array` | `TypeMismatch` | `TypeMismatch` |
//!
//! The scalar accessors never coerce. `Integer` and `Float` are separate
//! variants, so `get_float` on an integer yields `0.0`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Number, Value};
use tracing::warn;

use crate::error::{Result, TreeError};
use crate::path::Path;

/// Keyed children of an object node.
pub type Object = BTreeMap<String, TreeNode>;

static NULL: TreeNode = TreeNode::Null;
static EMPTY_OBJECT: TreeNode = TreeNode::Object(BTreeMap::new());

/// How malformed JSON input is treated when parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Malformed input is an error.
    #[default]
    Strict,
    /// Malformed input becomes an empty object.
    Lenient,
}

/// A schema-less JSON value.
///
/// JSON integers that fit in `i64` parse as `Integer`. Larger unsigned
/// integers have no exact representation here and parse as the nearest
/// `Float`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TreeNode {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<TreeNode>),
    Object(Object),
}

impl TreeNode {
    /// An empty object node.
    pub fn object() -> Self {
        TreeNode::Object(Object::new())
    }

    /// Runtime type name, as reported in [`TreeError::TypeMismatch`].
    pub fn type_name(&self) -> &'static str {
        match self {
            TreeNode::Null => "null",
            TreeNode::Boolean(_) => "boolean",
            TreeNode::Integer(_) => "integer",
            TreeNode::Float(_) => "float",
            TreeNode::String(_) => "string",
            TreeNode::Array(_) => "array",
            TreeNode::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TreeNode::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TreeNode::Object(_))
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, TreeNode::Array(_) | TreeNode::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TreeNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TreeNode::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TreeNode::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TreeNode::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            TreeNode::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Number of children of an array or object; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            TreeNode::Array(items) => items.len(),
            TreeNode::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Child stored under `key`, or `Null` when absent or when `self` is not
    /// an object.
    pub fn get(&self, key: &str) -> &TreeNode {
        match self {
            TreeNode::Object(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Navigate `path` without modifying the tree.
    ///
    /// Returns the shared empty object when any segment is missing or is not
    /// an object. The root path returns `self` if it is an object.
    pub fn get_object_by_path(&self, path: &Path) -> &TreeNode {
        if !self.is_object() {
            return &EMPTY_OBJECT;
        }
        let mut current = self;
        for segment in path.segments() {
            match current.get(segment) {
                next @ TreeNode::Object(_) => current = next,
                _ => return &EMPTY_OBJECT,
            }
        }
        current
    }

    /// String under `key`, or `""` when absent or not a string.
    pub fn get_string(&self, key: &str) -> &str {
        self.get(key).as_str().unwrap_or("")
    }

    /// Integer under `key`, or `0` when absent or not an integer.
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).as_i64().unwrap_or(0)
    }

    /// Float under `key`, or `0.0` when absent or not a float.
    pub fn get_float(&self, key: &str) -> f64 {
        self.get(key).as_f64().unwrap_or(0.0)
    }

    /// Boolean under `key`, or `false` when absent or not a boolean.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    /// Object under `key`; fails when the stored value is anything else.
    pub fn get_object(&self, key: &str) -> Result<&TreeNode> {
        match self.get(key) {
            node @ TreeNode::Object(_) => Ok(node),
            other => Err(TreeError::TypeMismatch {
                key: key.to_string(),
                expected: "object",
                actual: other.type_name(),
            }),
        }
    }

    /// Array under `key`; fails when the stored value is anything else.
    pub fn get_array(&self, key: &str) -> Result<&[TreeNode]> {
        match self.get(key) {
            TreeNode::Array(items) => Ok(items),
            other => Err(TreeError::TypeMismatch {
                key: key.to_string(),
                expected: "array",
                actual: other.type_name(),
            }),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Navigate `path`, creating empty objects for missing segments, and
    /// return the object at its end ready for [`put`](Self::put).
    ///
    /// Values in the way that are not objects (including `Null`) are replaced
    /// by empty objects.
    pub fn put_object_by_path(&mut self, path: &Path) -> &mut TreeNode {
        let mut current = self;
        for segment in path.segments() {
            let next = current
                .object_mut()
                .entry(segment.to_owned())
                .or_insert_with(TreeNode::object);
            if !next.is_object() {
                *next = TreeNode::object();
            }
            current = next;
        }
        current.object_mut();
        current
    }

    /// Store `value` under `key`. A non-object receiver becomes an empty
    /// object first.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<TreeNode>) -> &mut Self {
        self.object_mut().insert(key.into(), value.into());
        self
    }

    /// Remove and return the child under `key`.
    pub fn remove(&mut self, key: &str) -> Option<TreeNode> {
        match self {
            TreeNode::Object(map) => map.remove(key),
            _ => None,
        }
    }

    /// Append to an array. A non-array receiver becomes an empty array first.
    pub fn push(&mut self, value: impl Into<TreeNode>) -> &mut Self {
        if !matches!(self, TreeNode::Array(_)) {
            *self = TreeNode::Array(Vec::new());
        }
        if let TreeNode::Array(items) = self {
            items.push(value.into());
        }
        self
    }

    /// The receiver's map, replacing a non-object receiver with an empty one.
    fn object_mut(&mut self) -> &mut Object {
        let TreeNode::Object(map) = self else {
            *self = TreeNode::object();
            return self.object_mut();
        };
        map
    }

    // ========================================================================
    // Parsing and serialization
    // ========================================================================

    /// Decode JSON bytes, failing on malformed input.
    pub fn parse(bytes: &[u8]) -> Result<TreeNode> {
        serde_json::from_slice(bytes).map_err(|e| TreeError::MalformedInput(e.to_string()))
    }

    /// Decode JSON bytes; malformed input yields an empty object.
    pub fn parse_lenient(bytes: &[u8]) -> TreeNode {
        match Self::parse(bytes) {
            Ok(node) => node,
            Err(e) => {
                warn!(error = %e, "Malformed JSON input, substituting an empty object");
                TreeNode::object()
            }
        }
    }

    /// Decode JSON bytes according to `mode`.
    pub fn parse_with(bytes: &[u8], mode: ParseMode) -> Result<TreeNode> {
        match mode {
            ParseMode::Strict => Self::parse(bytes),
            ParseMode::Lenient => Ok(Self::parse_lenient(bytes)),
        }
    }

    /// Compact JSON text. Object keys are emitted in sorted order, so the
    /// output is stable for a given tree.
    pub fn to_compact_string(&self) -> String {
        // Every map key is a string, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// JSON text indented with three spaces.
    pub fn to_indented_string(&self) -> String {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"   "));
        if self.serialize(&mut serializer).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

/// View an array as strings; fails on the first element that is not one.
pub fn strings_of(items: &[TreeNode]) -> Result<Vec<&str>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().ok_or_else(|| TreeError::TypeMismatch {
                key: index.to_string(),
                expected: "string",
                actual: item.type_name(),
            })
        })
        .collect()
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact_string())
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TreeNode::Null => serializer.serialize_unit(),
            TreeNode::Boolean(b) => serializer.serialize_bool(*b),
            TreeNode::Integer(i) => serializer.serialize_i64(*i),
            TreeNode::Float(f) => serializer.serialize_f64(*f),
            TreeNode::String(s) => serializer.serialize_str(s),
            TreeNode::Array(items) => serializer.collect_seq(items),
            TreeNode::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TreeNode::from)
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Value> for TreeNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TreeNode::Null,
            Value::Bool(b) => TreeNode::Boolean(b),
            // u64 values past i64::MAX fall through to Float
            Value::Number(n) => match n.as_i64() {
                Some(i) => TreeNode::Integer(i),
                None => TreeNode::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => TreeNode::String(s),
            Value::Array(items) => TreeNode::Array(items.into_iter().map(TreeNode::from).collect()),
            Value::Object(map) => TreeNode::Object(
                map.into_iter()
                    .map(|(k, v)| (k, TreeNode::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&TreeNode> for Value {
    fn from(node: &TreeNode) -> Self {
        match node {
            TreeNode::Null => Value::Null,
            TreeNode::Boolean(b) => Value::Bool(*b),
            TreeNode::Integer(i) => Value::Number(Number::from(*i)),
            TreeNode::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TreeNode::String(s) => Value::String(s.clone()),
            TreeNode::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            TreeNode::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<TreeNode> for Value {
    fn from(node: TreeNode) -> Self {
        Value::from(&node)
    }
}

impl From<&str> for TreeNode {
    fn from(s: &str) -> Self {
        TreeNode::String(s.to_string())
    }
}

impl From<String> for TreeNode {
    fn from(s: String) -> Self {
        TreeNode::String(s)
    }
}

impl From<i64> for TreeNode {
    fn from(i: i64) -> Self {
        TreeNode::Integer(i)
    }
}

impl From<i32> for TreeNode {
    fn from(i: i32) -> Self {
        TreeNode::Integer(i64::from(i))
    }
}

impl From<f64> for TreeNode {
    fn from(f: f64) -> Self {
        TreeNode::Float(f)
    }
}

impl From<bool> for TreeNode {
    fn from(b: bool) -> Self {
        TreeNode::Boolean(b)
    }
}

impl From<Vec<TreeNode>> for TreeNode {
    fn from(items: Vec<TreeNode>) -> Self {
        TreeNode::Array(items)
    }
}

impl From<Object> for TreeNode {
    fn from(map: Object) -> Self {
        TreeNode::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> TreeNode {
        TreeNode::from(value)
    }

    #[test]
    fn test_integer_beyond_i64_parses_as_float() {
        let root =
            TreeNode::parse(br#"{"small": 9223372036854775807, "big": 18446744073709551615}"#)
                .unwrap();
        assert_eq!(root.get_int("small"), i64::MAX);
        assert_eq!(root.get("big").type_name(), "float");
        assert_eq!(root.get_float("big"), u64::MAX as f64);
    }

    #[test]
    fn test_put_replaces_scalar_receiver() {
        let mut node = TreeNode::Integer(7);
        node.put("k", true);
        assert_eq!(node, tree(json!({"k": true})));
    }

    #[test]
    fn test_path_navigation_scenario() {
        let root = tree(json!({"order": {"customer": {"name": "Ada"}}}));
        let customer = root.get_object_by_path(&Path::parse("order.customer"));
        assert_eq!(customer.get_string("name"), "Ada");
    }

    #[test]
    fn test_get_absent_key_is_null() {
        let root = tree(json!({"a": 1}));
        assert!(root.get("missing").is_null());
        assert!(TreeNode::Integer(3).get("a").is_null());
    }

    #[test]
    fn test_read_path_does_not_create() {
        let root = tree(json!({"a": {"b": 1}}));
        let before = root.clone();

        let missing = root.get_object_by_path(&Path::parse("a.x.y"));
        assert_eq!(missing, &TreeNode::object());

        // "a.b" runs through a scalar
        let through_scalar = root.get_object_by_path(&Path::parse("a.b.c"));
        assert_eq!(through_scalar, &TreeNode::object());

        assert_eq!(root, before);
    }

    #[test]
    fn test_root_path_returns_self() {
        let root = tree(json!({"k": "v"}));
        assert_eq!(root.get_object_by_path(&Path::root()), &root);
    }

    #[test]
    fn test_put_object_by_path_round_trip() {
        let mut root = tree(json!({"existing": true}));
        let path = Path::parse("profile.contact.primary");

        root.put_object_by_path(&path).put("email", "a@b.com");
        let created = root.put_object_by_path(&path).clone();

        assert_eq!(root.get_object_by_path(&path), &created);
        assert_eq!(created.get_string("email"), "a@b.com");
        assert!(root.get_bool("existing"));
    }

    #[test]
    fn test_put_object_by_path_replaces_scalar_in_the_way() {
        let mut root = tree(json!({"a": 5}));
        root.put_object_by_path(&Path::parse("a.b")).put("c", 1);
        assert_eq!(Value::from(&root), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_fail_soft_defaults_for_absent_keys() {
        let root = TreeNode::object();
        assert_eq!(root.get_string("k"), "");
        assert_eq!(root.get_int("k"), 0);
        assert_eq!(root.get_float("k"), 0.0);
        assert!(!root.get_bool("k"));
    }

    #[test]
    fn test_fail_soft_defaults_for_wrong_types() {
        let root = tree(json!({"s": "text", "i": 7, "f": 1.5, "b": true}));
        assert_eq!(root.get_string("i"), "");
        assert_eq!(root.get_int("f"), 0);
        assert_eq!(root.get_float("i"), 0.0);
        assert!(!root.get_bool("s"));

        assert_eq!(root.get_string("s"), "text");
        assert_eq!(root.get_int("i"), 7);
        assert_eq!(root.get_float("f"), 1.5);
        assert!(root.get_bool("b"));
    }

    #[test]
    fn test_get_object_type_mismatch() {
        let root = tree(json!({"name": "Ada", "list": [1]}));

        let err = root.get_object("name").unwrap_err();
        assert_eq!(
            err,
            TreeError::TypeMismatch {
                key: "name".to_string(),
                expected: "object",
                actual: "string",
            }
        );

        let err = root.get_object("missing").unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { actual: "null", .. }));

        assert!(root.get_object("list").is_err());
    }

    #[test]
    fn test_get_array() {
        let root = tree(json!({"tags": ["a", "b"], "obj": {}}));
        let tags = root.get_array("tags").unwrap();
        assert_eq!(strings_of(tags).unwrap(), vec!["a", "b"]);

        let err = root.get_array("obj").unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { actual: "object", .. }));
    }

    #[test]
    fn test_strings_of_rejects_mixed() {
        let items = vec![TreeNode::from("a"), TreeNode::Integer(1)];
        let err = strings_of(&items).unwrap_err();
        assert!(matches!(
            err,
            TreeError::TypeMismatch { ref key, actual: "integer", .. } if key == "1"
        ));
    }

    #[test]
    fn test_parse_strict_and_lenient() {
        let bad = b"{not json";
        assert!(matches!(
            TreeNode::parse(bad),
            Err(TreeError::MalformedInput(_))
        ));
        assert_eq!(TreeNode::parse_lenient(bad), TreeNode::object());
        assert_eq!(
            TreeNode::parse_with(bad, ParseMode::Lenient).unwrap(),
            TreeNode::object()
        );
        assert!(TreeNode::parse_with(bad, ParseMode::Strict).is_err());

        let good = TreeNode::parse(br#"{"n": 1, "x": 2.5}"#).unwrap();
        assert_eq!(good.get_int("n"), 1);
        assert_eq!(good.get_float("x"), 2.5);
    }

    #[test]
    fn test_compact_string_is_stable() {
        let mut a = TreeNode::object();
        a.put("z", 1).put("a", "x");
        let mut b = TreeNode::object();
        b.put("a", "x").put("z", 1);

        assert_eq!(a.to_compact_string(), r#"{"a":"x","z":1}"#);
        assert_eq!(a.to_compact_string(), b.to_compact_string());
        assert_eq!(a.to_string(), a.to_compact_string());
    }

    #[test]
    fn test_indented_string_uses_three_spaces() {
        let root = tree(json!({"a": 1}));
        assert_eq!(root.to_indented_string(), "{\n   \"a\": 1\n}");
    }

    #[test]
    fn test_remove_and_push() {
        let mut root = tree(json!({"a": 1, "b": 2}));
        assert_eq!(root.remove("a"), Some(TreeNode::Integer(1)));
        assert_eq!(root.len(), 1);

        let mut list = TreeNode::Null;
        list.push("x").push(2);
        assert_eq!(Value::from(&list), json!(["x", 2]));
    }

    #[test]
    fn test_value_conversion_round_trip() {
        let value = json!({"a": [1, 2.5, "s", true, null], "b": {"c": {}}});
        assert_eq!(Value::from(tree(value.clone())), value);
    }
}
