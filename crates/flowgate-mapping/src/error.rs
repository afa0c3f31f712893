// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mapping configuration errors.
//!
//! Applying a table never fails; these are raised only while building a
//! [`MappingTable`](crate::MappingTable) from configuration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A field type outside `string`, `integer`, `float`, `boolean`.
    #[error("unknown field type '{0}' (expected one of: string, integer, float, boolean)")]
    UnknownType(String),

    /// A converter name with no built-in implementation.
    #[error("unknown converter '{0}'")]
    UnknownConverter(String),
}

pub type Result<T> = std::result::Result<T, MappingError>;
