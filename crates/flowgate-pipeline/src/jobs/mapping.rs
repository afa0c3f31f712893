// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Response mapping job.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use flowgate_mapping::MappingTable;
use flowgate_tree::{ParseMode, TreeNode};
use tracing::debug;

use super::{Control, Job};
use crate::context::{ContextKey, ContextValue, PipelineContext};
use crate::error::JobError;

/// Shapes a stored value into the final result of the run.
///
/// The source is either a raw response (its body is parsed as JSON with the
/// job's [`ParseMode`]) or a tree stored by an earlier job.
#[derive(Debug, Clone)]
pub struct MappingJob<K> {
    name: String,
    source: K,
    table: Arc<MappingTable>,
    parse_mode: ParseMode,
    target: Option<K>,
}

impl<K: ContextKey> MappingJob<K> {
    pub fn new(source: K, table: MappingTable) -> Self {
        Self {
            name: format!("map:{source:?}"),
            source,
            table: Arc::new(table),
            parse_mode: ParseMode::Strict,
            target: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Treat a malformed body as an empty object instead of failing.
    pub fn lenient(self) -> Self {
        self.with_parse_mode(ParseMode::Lenient)
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// Also store the mapped tree under `key` so later jobs can read it.
    pub fn also_store_as(mut self, key: K) -> Self {
        self.target = Some(key);
        self
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    fn source_tree<'a>(&self, ctx: &'a PipelineContext<K>) -> Result<Cow<'a, TreeNode>, JobError> {
        match ctx.get(&self.source) {
            Some(ContextValue::Response(response)) => {
                Ok(Cow::Owned(response.body_tree(self.parse_mode)?))
            }
            Some(ContextValue::Tree(tree)) => Ok(Cow::Borrowed(tree)),
            None => Err(JobError::MissingContextValue(format!("{:?}", self.source))),
        }
    }
}

#[async_trait]
impl<K: ContextKey> Job<K> for MappingJob<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext<K>, _control: &Control) -> Result<(), JobError> {
        let mapped = {
            let source = self.source_tree(ctx)?;
            self.table.apply(&source)
        };

        debug!(
            job = %self.name,
            entries = self.table.len(),
            "Mapped response into final result"
        );

        if let Some(target) = &self.target {
            ctx.insert(target.clone(), mapped.clone());
        }
        ctx.set_final_result(mapped);
        Ok(())
    }
}
