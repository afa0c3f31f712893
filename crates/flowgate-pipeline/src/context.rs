// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-run pipeline context

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use flowgate_tree::TreeNode;

use crate::request::RawResponse;

/// Key type for context values.
///
/// Pipelines built in code typically use an enum so the set of keys a route
/// touches is known statically; pipelines built from configuration use
/// `String`.
pub trait ContextKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> ContextKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// A value stored in the context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Response(RawResponse),
    Tree(TreeNode),
}

impl ContextValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ContextValue::Response(_) => "response",
            ContextValue::Tree(_) => "tree",
        }
    }
}

impl From<RawResponse> for ContextValue {
    fn from(response: RawResponse) -> Self {
        ContextValue::Response(response)
    }
}

impl From<TreeNode> for ContextValue {
    fn from(tree: TreeNode) -> Self {
        ContextValue::Tree(tree)
    }
}

/// A write made while a job checkpoint is open, with what it replaced.
#[derive(Debug)]
enum Undo<K> {
    Value(K, Option<ContextValue>),
    FinalResult(Option<TreeNode>),
}

/// State shared by the jobs of one pipeline run.
///
/// Created fresh for every inbound request and dropped when the run ends.
/// The final result has its own slot rather than a reserved key.
///
/// The executor opens a checkpoint around every job. Writes made by a job
/// that fails are rolled back, so a failed run leaves only what earlier
/// jobs wrote.
#[derive(Debug)]
pub struct PipelineContext<K> {
    values: HashMap<K, ContextValue>,
    final_result: Option<TreeNode>,
    journal: Vec<Undo<K>>,
    checkpoints: Vec<usize>,
}

impl<K: ContextKey> Default for PipelineContext<K> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            final_result: None,
            journal: Vec::new(),
            checkpoints: Vec::new(),
        }
    }
}

impl<K: ContextKey> PipelineContext<K> {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value before the run starts.
    pub fn with_value(mut self, key: K, value: impl Into<ContextValue>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Store a value, returning the one it replaced.
    pub fn insert(&mut self, key: K, value: impl Into<ContextValue>) -> Option<ContextValue> {
        let previous = self.values.insert(key.clone(), value.into());
        if !self.checkpoints.is_empty() {
            self.journal.push(Undo::Value(key, previous.clone()));
        }
        previous
    }

    pub fn get(&self, key: &K) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// The response stored under `key`, if that is what it holds.
    pub fn response(&self, key: &K) -> Option<&RawResponse> {
        match self.values.get(key) {
            Some(ContextValue::Response(response)) => Some(response),
            _ => None,
        }
    }

    /// The tree stored under `key`, if that is what it holds.
    pub fn tree(&self, key: &K) -> Option<&TreeNode> {
        match self.values.get(key) {
            Some(ContextValue::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }

    /// Number of keyed values (the final result is not counted).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.final_result.is_none()
    }

    pub fn set_final_result(&mut self, result: TreeNode) {
        let previous = self.final_result.replace(result);
        if !self.checkpoints.is_empty() {
            self.journal.push(Undo::FinalResult(previous));
        }
    }

    pub fn final_result(&self) -> Option<&TreeNode> {
        self.final_result.as_ref()
    }

    pub fn into_final_result(self) -> Option<TreeNode> {
        self.final_result
    }

    // ========================================================================
    // Job checkpoints
    // ========================================================================

    /// Start journaling writes. Checkpoints nest.
    pub(crate) fn begin_job(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    /// Keep the writes made since the matching [`begin_job`](Self::begin_job).
    pub(crate) fn commit_job(&mut self) {
        self.checkpoints.pop();
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }

    /// Undo the writes made since the matching [`begin_job`](Self::begin_job).
    pub(crate) fn rollback_job(&mut self) {
        let Some(start) = self.checkpoints.pop() else {
            return;
        };
        while self.journal.len() > start {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            match undo {
                Undo::Value(key, Some(previous)) => {
                    self.values.insert(key, previous);
                }
                Undo::Value(key, None) => {
                    self.values.remove(&key);
                }
                Undo::FinalResult(previous) => self.final_result = previous,
            }
        }
    }
}
