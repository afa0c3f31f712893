// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipeline jobs.
//!
//! A job is one step of a pipeline. It reads what earlier jobs stored in the
//! [`PipelineContext`], does its work and stores its own output:
//! - `call`: dispatch an outbound HTTP call
//! - `mapping`: shape a stored response into the final result
//! - `inspect`: log a stored response

pub mod call;
pub mod inspect;
pub mod mapping;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::{ContextKey, PipelineContext};
use crate::error::JobError;

pub use call::CallJob;
pub use inspect::InspectJob;
pub use mapping::MappingJob;

/// One step of a pipeline.
///
/// Jobs hold only immutable configuration, so a pipeline built once per route
/// is shared by every concurrent run of that route.
#[async_trait]
pub trait Job<K: ContextKey>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Run against the context of the current run.
    ///
    /// Returning an error aborts the run; no later job is started.
    async fn run(&self, ctx: &mut PipelineContext<K>, control: &Control) -> Result<(), JobError>;
}

/// Run-scoped handle given to every job.
///
/// Carries the cancellation token of the run and lets a job finish the run
/// early without running the remaining jobs.
#[derive(Debug, Default)]
pub struct Control {
    cancel: CancellationToken,
    completed: AtomicBool,
}

impl Control {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            completed: AtomicBool::new(false),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the run is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Finish the run successfully once the current job returns.
    pub fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

type StepFn<K> = dyn Fn(&mut PipelineContext<K>, &Control) -> Result<(), JobError> + Send + Sync;

/// A job backed by a closure.
///
/// Used for seeding values, small custom steps and tests.
pub struct FnJob<K> {
    name: String,
    func: Box<StepFn<K>>,
}

impl<K: ContextKey> FnJob<K> {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut PipelineContext<K>, &Control) -> Result<(), JobError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl<K> fmt::Debug for FnJob<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnJob")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<K: ContextKey> Job<K> for FnJob<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext<K>, control: &Control) -> Result<(), JobError> {
        (self.func)(ctx, control)
    }
}
