// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate Cache - key/value store with per-entry expiry
//!
//! The request boundary uses a [`CacheStore`] to short-circuit pipeline runs.
//! Callers only issue `get`/`set`; concurrency is the store's concern.
//! [`TtlCache`] is the in-memory implementation.

mod store;

pub use store::{CacheStore, TtlCache};
