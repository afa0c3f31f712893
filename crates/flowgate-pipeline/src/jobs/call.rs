// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Outbound call job.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Control, Job};
use crate::context::{ContextKey, PipelineContext};
use crate::error::JobError;
use crate::request::RequestDescriptor;

/// Executes one outbound call and stores the raw response under `key`.
///
/// Any HTTP response counts as success, including 4xx and 5xx. The job fails
/// only when no response arrives, or when the run is cancelled while the call
/// is in flight.
#[derive(Debug, Clone)]
pub struct CallJob<K> {
    key: K,
    name: String,
    descriptor: Arc<RequestDescriptor>,
    client: reqwest::Client,
}

impl<K: ContextKey> CallJob<K> {
    pub fn new(key: K, descriptor: RequestDescriptor, client: reqwest::Client) -> Self {
        Self {
            name: format!("call:{key:?}"),
            key,
            descriptor: Arc::new(descriptor),
            client,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl<K: ContextKey> Job<K> for CallJob<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext<K>, control: &Control) -> Result<(), JobError> {
        debug!(
            job = %self.name,
            method = %self.descriptor.method(),
            url = %self.descriptor.url(),
            "Dispatching outbound call"
        );

        let response = tokio::select! {
            biased;
            _ = control.cancelled() => return Err(JobError::Cancelled),
            result = self.descriptor.execute(&self.client) => result?,
        };

        ctx.insert(self.key.clone(), response);
        Ok(())
    }
}
