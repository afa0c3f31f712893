// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Server error types.

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flowgate_pipeline::{BuildError, PipelineError};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read route file {path}: {source}")]
    ReadRoutes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse route file: {0}")]
    ParseRoutes(#[source] serde_json::Error),

    #[error("invalid route '{route}': {message}")]
    InvalidRoute { route: String, message: String },

    #[error("route '{route}': {source}")]
    BuildRoute {
        route: String,
        #[source]
        source: BuildError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed pipeline run, rendered for the inbound caller.
///
/// | Failure | Status |
/// |---------|--------|
/// | outbound call got no response | 502 Bad Gateway |
/// | run cancelled | 503 Service Unavailable |
/// | anything else | 500 Internal Server Error |
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_transport() {
            StatusCode::BAD_GATEWAY
        } else if self.0.is_cancelled() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.error_code(),
        }));
        (self.status(), body).into_response()
    }
}
