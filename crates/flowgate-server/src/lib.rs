// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate Server
//!
//! HTTP boundary for the pipeline engine. Routes are loaded from a JSON file;
//! each becomes an axum route whose requests run the route's job pipeline and
//! answer with its final result.
//!
//! Failed runs are answered with a JSON `{"error", "code"}` body: 502 when an
//! outbound call got no response, 503 when the run was cancelled, 500
//! otherwise.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ServerError};
pub use routes::{CachePolicy, RouteConfig, RouteMethod, load_routes, parse_routes};
pub use server::{AppState, CachedResponse, REQUEST_KEY, build_router, cache_headers, start};
