// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Outbound request descriptors.
//!
//! A [`RequestDescriptor`] describes one outbound HTTP call:
//! - Method (GET, POST, PUT, DELETE, HEAD, OPTIONS, PATCH)
//! - Base URL and path, concatenated verbatim
//! - Query parameters and headers
//! - Optional bearer token, sent as `Authorization: Bearer <token>`
//! - Optional JSON body for POST, PUT and PATCH
//!
//! Any HTTP response counts as success here, whatever its status code.
//! Classifying statuses is left to later jobs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use flowgate_tree::{ParseMode, TreeError, TreeNode};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use tracing::debug;

use crate::error::RequestError;

// ============================================================================
// Method
// ============================================================================

/// HTTP method of an outbound call
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, VariantNames,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }

    /// Parse a method name, ignoring ASCII case.
    pub fn parse(name: &str) -> Result<Self, RequestError> {
        Self::VARIANTS
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(name))
            .map(|index| Self::ALL[index])
            .ok_or_else(|| RequestError::UnsupportedMethod(name.to_string()))
    }

    /// Whether a configured body is sent with this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    const ALL: [HttpMethod; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::Patch,
    ];

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Response
// ============================================================================

/// A received HTTP response, body unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl RawResponse {
    /// True if the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON according to `mode`.
    pub fn body_tree(&self, mode: ParseMode) -> Result<TreeNode, TreeError> {
        TreeNode::parse_with(&self.body, mode)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Immutable description of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    base_url: String,
    path: String,
    query_params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    bearer_token: Option<String>,
    body: Option<TreeNode>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, base_url: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            path: String::new(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            bearer_token: None,
            body: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// JSON body, sent only for POST, PUT and PATCH.
    pub fn body(mut self, body: impl Into<TreeNode>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Build a descriptor from configuration, validating the method.
    pub fn from_config(config: &RequestConfig) -> Result<Self, RequestError> {
        Ok(Self {
            method: HttpMethod::parse(&config.method)?,
            base_url: config.base_url.clone(),
            path: config.path.clone(),
            query_params: config.query_params.clone(),
            headers: config.headers.clone(),
            bearer_token: config.token.clone().filter(|t| !t.is_empty()),
            body: config.body.clone(),
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Target URL: base URL followed by path, without query parameters.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Dispatch the call and wait for the complete response.
    ///
    /// Fails only when no response is received. Non-2xx responses are
    /// returned as `Ok`.
    pub async fn execute(&self, client: &reqwest::Client) -> Result<RawResponse, RequestError> {
        let url = self.url();
        let mut request = client.request(self.method.to_reqwest(), &url);

        if !self.query_params.is_empty() {
            request = request.query(&self.query_params);
        }
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if self.method.carries_body() {
            if let Some(body) = &self.body {
                let has_content_type = self
                    .headers
                    .keys()
                    .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
                if !has_content_type {
                    request = request.header(CONTENT_TYPE, "application/json");
                }
                request = request.body(body.to_compact_string());
            }
        }

        let response = request.send().await.map_err(|e| classify(&url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| classify(&url, e))?;

        debug!(
            method = %self.method,
            url = %url,
            status,
            body_length = body.len(),
            "Outbound call completed"
        );

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(url: &str, err: reqwest::Error) -> RequestError {
    if err.is_builder() {
        RequestError::InvalidRequest {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        RequestError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configured outbound call.
///
/// ```json
/// {
///   "method": "GET",
///   "base_url": "https://api.example.com",
///   "path": "/v1/users",
///   "query_params": {"page": "1"},
///   "headers": {"Accept": "application/json"},
///   "token": "secret"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(alias = "baseUrl")]
    pub base_url: String,

    #[serde(default)]
    pub path: String,

    #[serde(default, alias = "queryParams", skip_serializing_if = "BTreeMap::is_empty")]
    pub query_params: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, alias = "bearer_token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TreeNode>,
}

fn default_method() -> String {
    HttpMethod::Get.as_str().to_string()
}
