// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Axum router that turns configured routes into pipeline runs.
//!
//! Every inbound request gets a fresh context seeded with the request under
//! [`REQUEST_KEY`], runs the route's pipeline and answers with the final
//! result as JSON. Routes with a [`CachePolicy`] are answered from the
//! response cache while an entry is fresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, HeaderName, LAST_MODIFIED};
use axum::http::{HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, TimeDelta, Utc};
use flowgate_cache::{CacheStore, TtlCache};
use flowgate_pipeline::{CancellationToken, Pipeline, PipelineContext};
use flowgate_tree::TreeNode;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{ApiError, ServerError};
use crate::routes::{CachePolicy, RouteConfig, load_routes, validate};

/// Context key holding the inbound request.
pub const REQUEST_KEY: &str = "request";

/// A serialized final result held by the response cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
    pub max_age: Duration,
}

/// Shared state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<dyn CacheStore<CachedResponse>>,
    default_ttl: Duration,
}

impl AppState {
    pub fn new(cache: Arc<dyn CacheStore<CachedResponse>>, default_ttl: Duration) -> Self {
        Self { cache, default_ttl }
    }

    /// State backed by an in-memory [`TtlCache`].
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(TtlCache::new(default_ttl)), default_ttl)
    }
}

/// A route's pipeline, built once and shared by its requests.
struct RouteState {
    name: String,
    pipeline: Pipeline<String>,
    cache: Option<CachePolicy>,
}

/// The parts of an inbound request a pipeline can see.
#[derive(Debug)]
struct InboundRequest {
    method: Method,
    uri: Uri,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Bytes,
}

impl InboundRequest {
    fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.uri)
    }

    /// `{"method", "path", "params", "query", "body"}`; a body that is not
    /// JSON is kept as a string, an empty one becomes null.
    fn to_tree(&self) -> TreeNode {
        let body = if self.body.is_empty() {
            TreeNode::Null
        } else {
            TreeNode::parse(&self.body)
                .unwrap_or_else(|_| TreeNode::String(String::from_utf8_lossy(&self.body).into_owned()))
        };

        let mut params = TreeNode::object();
        for (key, value) in &self.params {
            params.put(key.clone(), value.as_str());
        }
        let mut query = TreeNode::object();
        for (key, value) in &self.query {
            query.put(key.clone(), value.as_str());
        }

        let mut tree = TreeNode::object();
        tree.put("method", self.method.as_str())
            .put("path", self.uri.path())
            .put("params", params)
            .put("query", query)
            .put("body", body);
        tree
    }
}

/// Build the router for `routes`.
///
/// Paths and every route's steps are validated here; a path axum cannot
/// register or an unknown method, field type or converter fails the whole
/// build.
pub fn build_router(
    routes: &[RouteConfig],
    client: &reqwest::Client,
    state: AppState,
) -> Result<Router, ServerError> {
    validate(routes)?;
    let mut router = Router::new();

    for route in routes {
        let name = route.display_name();
        let pipeline = Pipeline::<String>::from_config(name.clone(), &route.steps, client)
            .map_err(|source| ServerError::BuildRoute {
                route: name.clone(),
                source,
            })?;
        info!(route = %name, jobs = pipeline.len(), cached = route.cache.is_some(), "Registered route");

        let route_state = Arc::new(RouteState {
            name,
            pipeline,
            cache: route.cache,
        });
        let handler = move |State(app): State<AppState>,
                            method: Method,
                            uri: Uri,
                            params: Option<Path<HashMap<String, String>>>,
                            Query(query): Query<HashMap<String, String>>,
                            body: Bytes| {
            let route_state = route_state.clone();
            async move {
                let inbound = InboundRequest {
                    method,
                    uri,
                    params: params.map(|Path(p)| p).unwrap_or_default(),
                    query,
                    body,
                };
                handle(route_state, app, inbound).await
            }
        };

        router = router.route(&route.path, route.method.method_router(handler));
    }

    Ok(router.layer(TraceLayer::new_for_http()).with_state(state))
}

async fn handle(route: Arc<RouteState>, app: AppState, inbound: InboundRequest) -> Response {
    let cache_key = inbound.cache_key();

    if let Some(policy) = route.cache {
        if let Some(cached) = app.cache.get(&cache_key) {
            debug!(route = %route.name, key = %cache_key, "Serving cached response");
            return cached_response(cached, &policy, Utc::now());
        }
    }

    let ctx = PipelineContext::new().with_value(REQUEST_KEY.to_string(), inbound.to_tree());

    // Dropping the handler future (client went away) cancels the run.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match route.pipeline.run(ctx, cancel).await.into_result() {
        Ok(result) => {
            let body = Bytes::from(result.to_compact_string());
            match route.cache {
                Some(policy) => {
                    let stored_at = Utc::now();
                    let cached = CachedResponse {
                        body,
                        stored_at,
                        max_age: policy.max_age(app.default_ttl),
                    };
                    app.cache.set(&cache_key, cached.clone(), cached.max_age);
                    cached_response(cached, &policy, stored_at)
                }
                None => json_response(body),
            }
        }
        Err(e) => {
            error!(route = %route.name, error = %e, code = e.error_code(), "Route failed");
            ApiError(e).into_response()
        }
    }
}

fn json_response(body: Bytes) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

fn cached_response(cached: CachedResponse, policy: &CachePolicy, now: DateTime<Utc>) -> Response {
    let headers = cache_headers(policy, cached.stored_at, cached.max_age, now);
    let mut response = json_response(cached.body);
    for (name, value) in headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

/// `Cache-Control`, `Last-Modified` and `Expires` for a response stored at
/// `stored_at` and served at `now`.
///
/// `max-age` counts down from the stored entry's TTL in whole seconds, and
/// `Expires` stays fixed at `stored_at + max_age`, so a hit never promises
/// freshness beyond the server-side entry.
pub fn cache_headers(
    policy: &CachePolicy,
    stored_at: DateTime<Utc>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> [(HeaderName, String); 3] {
    let visibility = if policy.public { "public" } else { "private" };
    let age = (now - stored_at).to_std().unwrap_or_default();
    let remaining = max_age.as_secs().saturating_sub(age.as_secs());
    let expires = i64::try_from(max_age.as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| stored_at.checked_add_signed(delta))
        .unwrap_or(stored_at);

    [
        (CACHE_CONTROL, format!("{visibility}, max-age={remaining}")),
        (LAST_MODIFIED, http_date(stored_at)),
        (EXPIRES, http_date(expires)),
    ]
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Load routes, bind and serve until Ctrl-C.
pub async fn start(config: &Config) -> Result<(), ServerError> {
    let routes = load_routes(&config.routes_file)?;
    info!(
        routes = routes.len(),
        file = %config.routes_file.display(),
        "Loaded route definitions"
    );

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let router = build_router(&routes, &client, AppState::in_memory(config.cache_ttl))?;

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "Flowgate listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
