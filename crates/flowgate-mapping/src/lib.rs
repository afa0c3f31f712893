// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate Mapping - declarative response shaping
//!
//! A [`MappingTable`] is an ordered list of entries, each copying one field
//! from a source tree to a destination tree:
//!
//! ```text
//! from: { path: "user",    key: "email",   type: "string" }
//! to:   { path: "profile", key: "contact" }
//! ```
//!
//! Applying a table is a pure function of the table and the source and never
//! fails. Configuration mistakes (unknown type or converter names) are
//! rejected when the table is built.
//!
//! ```
//! use flowgate_mapping::{FieldType, MappingEntry, MappingTable, SourceField, TargetField};
//! use flowgate_tree::TreeNode;
//!
//! let table = MappingTable::new().with_entry(MappingEntry::new(
//!     SourceField::new("user", "email", FieldType::String),
//!     TargetField::new("profile", "contact"),
//! ));
//! let source = TreeNode::parse(br#"{"user":{"email":"a@b.com"}}"#).unwrap();
//! assert_eq!(
//!     table.apply(&source).to_compact_string(),
//!     r#"{"profile":{"contact":"a@b.com"}}"#
//! );
//! ```

pub mod coercion;
pub mod error;
pub mod table;

pub use coercion::{Converter, FieldType, coerce_to_type};
pub use error::{MappingError, Result};
pub use table::{
    MappingElementConfig, MappingEntry, MappingEntryConfig, MappingTable, SourceField,
    TargetField,
};
