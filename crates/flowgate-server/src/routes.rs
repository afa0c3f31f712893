// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Route definitions.
//!
//! A route file is a JSON list of routes. Each route binds an inbound method
//! and path to a pipeline of steps:
//!
//! ```json
//! [
//!   {
//!     "method": "GET",
//!     "path": "/profile/{id}",
//!     "cache": {"public": true, "max_age_secs": 300},
//!     "steps": [
//!       {"call": {"key": "user", "request": {"base_url": "https://api.example.com", "path": "/users/1"}}},
//!       {"map": {"source": "user", "entries": [
//!         {"from": {"path": "user", "key": "email"}, "to": {"path": "profile", "key": "contact"}}
//!       ]}}
//!     ]
//!   }
//! ]
//! ```
//!
//! Paths use axum's `{param}` syntax. Captured parameters, the query string
//! and the inbound body are seeded into the context under the `request` key.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use axum::routing::{MethodFilter, MethodRouter, any, on};
use flowgate_pipeline::StepConfig;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Inbound method a route answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    /// Every method.
    Any,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Head => "HEAD",
            RouteMethod::Any => "ANY",
        }
    }

    /// Wrap `handler` in a method router for this method.
    pub fn method_router<H, T, S>(self, handler: H) -> MethodRouter<S>
    where
        H: axum::handler::Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let filter = match self {
            RouteMethod::Get => MethodFilter::GET,
            RouteMethod::Post => MethodFilter::POST,
            RouteMethod::Put => MethodFilter::PUT,
            RouteMethod::Delete => MethodFilter::DELETE,
            RouteMethod::Patch => MethodFilter::PATCH,
            RouteMethod::Head => MethodFilter::HEAD,
            RouteMethod::Any => return any(handler),
        };
        on(filter, handler)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response caching for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachePolicy {
    /// `Cache-Control: public` when set, `private` otherwise.
    #[serde(default)]
    pub public: bool,
    /// Falls back to the server's default cache TTL when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
}

impl CachePolicy {
    pub fn max_age(&self, default_ttl: Duration) -> Duration {
        self.max_age_secs
            .map(Duration::from_secs)
            .unwrap_or(default_ttl)
    }
}

/// One configured route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub method: RouteMethod,
    pub path: String,
    /// Name used in logs; defaults to `"<METHOD> <path>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CachePolicy>,
    pub steps: Vec<StepConfig>,
}

impl RouteConfig {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}

/// Parse route definitions from JSON text.
pub fn parse_routes(json: &str) -> Result<Vec<RouteConfig>, ServerError> {
    let routes: Vec<RouteConfig> = serde_json::from_str(json).map_err(ServerError::ParseRoutes)?;
    validate(&routes)?;
    Ok(routes)
}

/// Read and parse a route file.
pub fn load_routes(path: &Path) -> Result<Vec<RouteConfig>, ServerError> {
    let json = std::fs::read_to_string(path).map_err(|source| ServerError::ReadRoutes {
        path: path.to_path_buf(),
        source,
    })?;
    parse_routes(&json)
}

/// Reject definitions axum would refuse at router build time.
pub(crate) fn validate(routes: &[RouteConfig]) -> Result<(), ServerError> {
    let mut seen: HashSet<(&str, RouteMethod)> = HashSet::new();
    let mut any_paths: HashSet<&str> = HashSet::new();
    // normalised shape -> the path that registered it
    let mut shapes: HashMap<String, &str> = HashMap::new();

    for route in routes {
        let invalid = |message: String| ServerError::InvalidRoute {
            route: route.display_name(),
            message,
        };

        if !route.path.starts_with('/') {
            return Err(invalid("path must start with '/'".to_string()));
        }
        let path = route.path.as_str();
        let shape = path_shape(path).map_err(invalid)?;

        match shapes.get(shape.as_str()) {
            Some(existing) if *existing != path => {
                return Err(invalid(format!(
                    "captures conflict with route path '{existing}'"
                )));
            }
            Some(_) => {}
            None => {
                shapes.insert(shape, path);
            }
        }

        let conflicts = if route.method == RouteMethod::Any {
            seen.iter().any(|(p, _)| *p == path)
        } else {
            any_paths.contains(path) || seen.contains(&(path, route.method))
        };
        if conflicts {
            return Err(invalid(
                "another route already handles this method and path".to_string(),
            ));
        }

        if route.method == RouteMethod::Any {
            any_paths.insert(path);
        }
        seen.insert((path, route.method));
    }
    Ok(())
}

/// `path` with capture names erased: `/u/{id}/{*rest}` becomes `/u/{}/{*}`.
///
/// Two paths with the same shape but different capture names cannot both be
/// registered.
fn path_shape(path: &str) -> Result<String, String> {
    let mut shape = String::with_capacity(path.len());
    for (index, segment) in path.split('/').enumerate() {
        if index > 0 {
            shape.push('/');
        }
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(format!(
                "segment '{segment}' uses legacy capture syntax, write '{{param}}' or '{{*param}}'"
            ));
        }
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                let (wildcard, name) = match name.strip_prefix('*') {
                    Some(rest) => (true, rest),
                    None => (false, name),
                };
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(format!("segment '{segment}' has an invalid capture"));
                }
                shape.push_str(if wildcard { "{*}" } else { "{}" });
            }
            None if segment.contains(['{', '}']) => {
                return Err(format!(
                    "segment '{segment}' must be a whole '{{param}}' capture"
                ));
            }
            None => shape.push_str(segment),
        }
    }
    Ok(shape)
}
