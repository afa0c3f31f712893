// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scalar field types, coercion and converters.
//!
//! Coercion bridges loosely-typed upstream data (numbers sent as strings and
//! the like) and the declared destination type of a mapping entry.
//!
//! # Supported Coercions
//!
//! | From | To | Example |
//! |------|-----|---------|
//! | String | float | `"18.5"` → `18.5` |
//! | String | integer | `"42"` → `42` |
//! | String | boolean | `"true"`, `"1"`, `"yes"` → `true` |
//! | Integer | float | `3` → `3.0` |
//! | Integer/Float | string | `42` → `"42"` |
//! | Boolean | string | `true` → `"true"` |
//! | Integer/Float | boolean | `1` → `true`, `0` → `false` |
//!
//! Anything else is returned unchanged.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use flowgate_tree::TreeNode;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::error::{MappingError, Result};

/// Declared type of a mapped field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    /// Parse a configured type name.
    pub fn parse(name: &str) -> Result<Self> {
        FieldType::from_str(name).map_err(|_| MappingError::UnknownType(name.to_string()))
    }

    /// Read `key` from `node` with the fail-soft accessor for this type.
    pub fn extract(self, node: &TreeNode, key: &str) -> TreeNode {
        match self {
            FieldType::String => TreeNode::String(node.get_string(key).to_owned()),
            FieldType::Integer => TreeNode::Integer(node.get_int(key)),
            FieldType::Float => TreeNode::Float(node.get_float(key)),
            FieldType::Boolean => TreeNode::Boolean(node.get_bool(key)),
        }
    }
}

/// Coerce a scalar to `target`, returning it unchanged when not possible.
pub fn coerce_to_type(value: TreeNode, target: FieldType) -> TreeNode {
    match (target, &value) {
        (FieldType::Float, TreeNode::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(TreeNode::Float)
            .unwrap_or(value),
        (FieldType::Float, TreeNode::Integer(i)) => TreeNode::Float(*i as f64),

        (FieldType::Integer, TreeNode::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(TreeNode::Integer)
            .unwrap_or(value),

        (FieldType::String, TreeNode::Integer(i)) => TreeNode::String(i.to_string()),
        (FieldType::String, TreeNode::Float(f)) => TreeNode::String(f.to_string()),
        (FieldType::String, TreeNode::Boolean(b)) => TreeNode::String(b.to_string()),

        (FieldType::Boolean, TreeNode::String(s)) => {
            let s_lower = s.trim().to_lowercase();
            TreeNode::Boolean(s_lower == "true" || s_lower == "1" || s_lower == "yes")
        }
        (FieldType::Boolean, TreeNode::Integer(i)) => TreeNode::Boolean(*i != 0),
        (FieldType::Boolean, TreeNode::Float(f)) => TreeNode::Boolean(*f != 0.0),

        _ => value,
    }
}

type ConvertFn = dyn Fn(TreeNode) -> TreeNode + Send + Sync;

/// A scalar-to-scalar function applied to a mapped value before it is
/// written.
#[derive(Clone)]
pub struct Converter {
    name: String,
    func: Arc<ConvertFn>,
}

impl Converter {
    /// Names accepted by [`Converter::named`].
    pub const BUILTINS: &'static [&'static str] = &[
        "trim",
        "uppercase",
        "lowercase",
        "to_string",
        "to_integer",
        "to_float",
        "to_boolean",
    ];

    pub fn new(
        name: impl Into<String>,
        func: impl Fn(TreeNode) -> TreeNode + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Look up a built-in converter by name.
    pub fn named(name: &str) -> Result<Self> {
        let converter = match name {
            "trim" => Self::new(name, |v| map_string(v, |s| s.trim().to_string())),
            "uppercase" => Self::new(name, |v| map_string(v, |s| s.to_uppercase())),
            "lowercase" => Self::new(name, |v| map_string(v, |s| s.to_lowercase())),
            "to_string" => Self::new(name, |v| coerce_to_type(v, FieldType::String)),
            "to_integer" => Self::new(name, |v| coerce_to_type(v, FieldType::Integer)),
            "to_float" => Self::new(name, |v| coerce_to_type(v, FieldType::Float)),
            "to_boolean" => Self::new(name, |v| coerce_to_type(v, FieldType::Boolean)),
            other => return Err(MappingError::UnknownConverter(other.to_string())),
        };
        Ok(converter)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: TreeNode) -> TreeNode {
        (self.func)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn map_string(value: TreeNode, f: impl FnOnce(&str) -> String) -> TreeNode {
    match value {
        TreeNode::String(s) => TreeNode::String(f(&s)),
        other => other,
    }
}
