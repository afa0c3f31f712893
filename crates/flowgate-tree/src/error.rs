// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the tree model.

use thiserror::Error;

/// Errors raised by the strict tree accessors and the strict parser.
///
/// The fail-soft scalar accessors (`get_string`, `get_int`, ...) never produce
/// these; they return zero values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// A strict accessor found a value of a different runtime type.
    #[error("type mismatch for '{key}': expected {expected}, found {actual}")]
    TypeMismatch {
        /// The key (or array index) that was looked up.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The runtime type actually stored (`null` when absent).
        actual: &'static str,
    },

    /// Input bytes are not valid JSON.
    #[error("malformed JSON input: {0}")]
    MalformedInput(String),
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
