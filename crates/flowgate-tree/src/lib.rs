// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate Tree - schema-less JSON values
//!
//! Routes and mapping tables are configured at runtime, so responses are
//! navigated without a schema. [`TreeNode`] is a tagged union over the JSON
//! types with dotted-path navigation ([`Path`]), fail-soft scalar accessors
//! and strict structural accessors.
//!
//! ```
//! use flowgate_tree::{Path, TreeNode};
//!
//! let order = TreeNode::parse(br#"{"order":{"customer":{"name":"Ada"}}}"#).unwrap();
//! let customer = order.get_object_by_path(&Path::parse("order.customer"));
//! assert_eq!(customer.get_string("name"), "Ada");
//! assert_eq!(customer.get_int("name"), 0);
//! ```

pub mod error;
pub mod node;
pub mod path;

pub use error::{Result, TreeError};
pub use node::{Object, ParseMode, TreeNode, strings_of};
pub use path::Path;
