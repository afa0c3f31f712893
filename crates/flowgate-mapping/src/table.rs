// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mapping tables and their application.

use flowgate_tree::{Path, TreeNode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coercion::{Converter, FieldType, coerce_to_type};
use crate::error::Result;

/// Where a mapped value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceField {
    pub path: Path,
    pub key: String,
    pub field_type: FieldType,
}

impl SourceField {
    pub fn new(path: &str, key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: Path::parse(path),
            key: key.into(),
            field_type,
        }
    }
}

/// Where a mapped value is written to.
///
/// When `field_type` is set the value is coerced to it before writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetField {
    pub path: Path,
    pub key: String,
    pub field_type: Option<FieldType>,
}

impl TargetField {
    pub fn new(path: &str, key: impl Into<String>) -> Self {
        Self {
            path: Path::parse(path),
            key: key.into(),
            field_type: None,
        }
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

/// One field copy from a source tree to a destination tree.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub from: SourceField,
    pub to: TargetField,
    pub converter: Option<Converter>,
}

impl MappingEntry {
    pub fn new(from: SourceField, to: TargetField) -> Self {
        Self {
            from,
            to,
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Build an entry from its configuration, validating names.
    pub fn from_config(config: &MappingEntryConfig) -> Result<Self> {
        let from = SourceField {
            path: Path::parse(&config.from.path),
            key: config.from.key.clone(),
            field_type: FieldType::parse(config.from.field_type.as_deref().unwrap_or("string"))?,
        };
        let to = TargetField {
            path: Path::parse(&config.to.path),
            key: config.to.key.clone(),
            field_type: config
                .to
                .field_type
                .as_deref()
                .map(FieldType::parse)
                .transpose()?,
        };
        let converter = config
            .converter
            .as_deref()
            .map(Converter::named)
            .transpose()?;

        Ok(Self {
            from,
            to,
            converter,
        })
    }

    /// Resolve the value this entry writes for `source`.
    fn resolve(&self, source: &TreeNode) -> TreeNode {
        let sub_source = source.get_object_by_path(&self.from.path);
        let mut value = self.from.field_type.extract(sub_source, &self.from.key);
        if let Some(converter) = &self.converter {
            value = converter.apply(value);
        }
        if let Some(target_type) = self.to.field_type {
            value = coerce_to_type(value, target_type);
        }
        value
    }
}

/// An ordered list of mapping entries.
///
/// Entries are applied in insertion order; when two entries write the same
/// destination key the later one wins.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: MappingEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push(&mut self, entry: MappingEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a table from configuration entries. Unknown type or converter
    /// names are rejected here rather than skipped at runtime.
    pub fn from_config(entries: &[MappingEntryConfig]) -> Result<Self> {
        entries
            .iter()
            .map(MappingEntry::from_config)
            .collect::<Result<Vec<_>>>()
            .map(|entries| Self { entries })
    }

    /// Shape `source` into a new tree.
    ///
    /// Never fails: unresolvable source paths and type mismatches produce the
    /// zero value of the declared type at the destination.
    pub fn apply(&self, source: &TreeNode) -> TreeNode {
        let mut destination = TreeNode::object();
        for entry in &self.entries {
            let value = entry.resolve(source);
            trace!(
                from_path = %entry.from.path,
                from_key = %entry.from.key,
                to_path = %entry.to.path,
                to_key = %entry.to.key,
                "Applying mapping entry"
            );
            destination
                .put_object_by_path(&entry.to.path)
                .put(entry.to.key.clone(), value);
        }
        destination
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configured side of a mapping entry: `{ "path": "user", "key": "email", "type": "string" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingElementConfig {
    #[serde(default)]
    pub path: String,
    pub key: String,
    /// Defaults to `string` for the source side; optional for the target side.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

/// Configured mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntryConfig {
    pub from: MappingElementConfig,
    pub to: MappingElementConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}
