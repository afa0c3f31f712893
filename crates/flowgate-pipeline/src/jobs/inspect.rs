// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Debug job that logs a stored response.

use async_trait::async_trait;
use flowgate_tree::TreeNode;
use tracing::info;

use super::{Control, Job};
use crate::context::{ContextKey, ContextValue, PipelineContext};
use crate::error::JobError;

/// Logs the status, headers and body of the value stored under `key`.
///
/// Never modifies the context. A missing key is an error, so a misplaced
/// inspect step shows up at the boundary instead of logging nothing.
#[derive(Debug, Clone)]
pub struct InspectJob<K> {
    name: String,
    key: K,
    status: bool,
    headers: bool,
    body: bool,
}

impl<K: ContextKey> InspectJob<K> {
    /// Inspect status and body.
    pub fn new(key: K) -> Self {
        Self {
            name: format!("inspect:{key:?}"),
            key,
            status: true,
            headers: false,
            body: true,
        }
    }

    pub fn with_status(mut self, enabled: bool) -> Self {
        self.status = enabled;
        self
    }

    pub fn with_headers(mut self, enabled: bool) -> Self {
        self.headers = enabled;
        self
    }

    pub fn with_body(mut self, enabled: bool) -> Self {
        self.body = enabled;
        self
    }

    /// Render the parts of `value` this job is configured to show.
    pub fn render(&self, value: &ContextValue) -> String {
        let mut lines = Vec::new();
        match value {
            ContextValue::Response(response) => {
                if self.status {
                    lines.push(format!("status: {}", response.status));
                }
                if self.headers {
                    lines.extend(
                        response
                            .headers
                            .iter()
                            .map(|(name, value)| format!("{name}: {value}")),
                    );
                }
                if self.body {
                    // Pretty-print JSON bodies; other bodies verbatim.
                    let body = TreeNode::parse(&response.body)
                        .map(|tree| tree.to_indented_string())
                        .unwrap_or_else(|_| response.body_text());
                    lines.push(body);
                }
            }
            ContextValue::Tree(tree) => {
                if self.body {
                    lines.push(tree.to_indented_string());
                }
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl<K: ContextKey> Job<K> for InspectJob<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext<K>, _control: &Control) -> Result<(), JobError> {
        let value = ctx
            .get(&self.key)
            .ok_or_else(|| JobError::MissingContextValue(format!("{:?}", self.key)))?;

        info!(
            job = %self.name,
            kind = value.kind(),
            "{}",
            self.render(value)
        );
        Ok(())
    }
}
