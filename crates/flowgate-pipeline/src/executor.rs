// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipeline executor.
//!
//! A [`Pipeline`] is an ordered list of jobs, built once per route and shared
//! by every run. [`Pipeline::run`] drives one run:
//!
//! ```text
//! Pending -> Running -> Succeeded
//!                    \-> Failed
//! ```
//!
//! Jobs run strictly in order. The first error fails the run and no later job
//! starts. Context writes made by the failing job are rolled back.
//! Cancellation is checked before each job and raced against in-flight calls.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use flowgate_tree::TreeNode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::context::{ContextKey, PipelineContext};
use crate::error::{JobError, PipelineError};
use crate::jobs::{Control, Job};

/// Lifecycle state of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// An ordered sequence of jobs.
pub struct Pipeline<K: ContextKey> {
    name: String,
    jobs: Vec<Arc<dyn Job<K>>>,
}

impl<K: ContextKey> Pipeline<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: Vec::new(),
        }
    }

    /// Append a job.
    pub fn then(mut self, job: impl Job<K> + 'static) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    /// Append an already shared job.
    pub fn then_shared(mut self, job: Arc<dyn Job<K>>) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job against `ctx` until one fails, the run is cancelled or a
    /// job requests early completion.
    #[instrument(skip_all, fields(pipeline = %self.name))]
    pub async fn run(&self, mut ctx: PipelineContext<K>, cancel: CancellationToken) -> PipelineRun<K> {
        let control = Control::new(cancel);
        debug!(jobs = self.jobs.len(), "Pipeline run started");

        match self.run_jobs(&mut ctx, &control).await {
            Ok(()) => {
                info!(has_result = ctx.final_result().is_some(), "Pipeline run succeeded");
                PipelineRun {
                    state: PipelineState::Succeeded,
                    context: ctx,
                    error: None,
                }
            }
            Err(error) => {
                warn!(error = %error, "Pipeline run failed");
                PipelineRun {
                    state: PipelineState::Failed,
                    context: ctx,
                    error: Some(error),
                }
            }
        }
    }

    async fn run_jobs(
        &self,
        ctx: &mut PipelineContext<K>,
        control: &Control,
    ) -> Result<(), PipelineError> {
        for job in &self.jobs {
            if control.is_completed() {
                debug!("Early completion requested, skipping remaining jobs");
                break;
            }
            if control.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    job: job.name().to_string(),
                });
            }

            debug!(job = job.name(), "Running job");
            ctx.begin_job();
            match job.run(ctx, control).await {
                Ok(()) => ctx.commit_job(),
                Err(JobError::Cancelled) => {
                    ctx.rollback_job();
                    return Err(PipelineError::Cancelled {
                        job: job.name().to_string(),
                    });
                }
                Err(source) => {
                    ctx.rollback_job();
                    return Err(PipelineError::Job {
                        job: job.name().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<K: ContextKey> fmt::Debug for Pipeline<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jobs: Vec<&str> = self.jobs.iter().map(|job| job.name()).collect();
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("jobs", &jobs)
            .finish()
    }
}

/// A pipeline nested in another runs against the same context and shares its
/// cancellation and early-completion handle.
#[async_trait]
impl<K: ContextKey> Job<K> for Pipeline<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext<K>, control: &Control) -> Result<(), JobError> {
        match self.run_jobs(ctx, control).await {
            Ok(()) => Ok(()),
            Err(PipelineError::Cancelled { .. }) => Err(JobError::Cancelled),
            Err(e) => Err(JobError::Nested(Box::new(e))),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun<K> {
    pub state: PipelineState,
    pub context: PipelineContext<K>,
    pub error: Option<PipelineError>,
}

impl<K: ContextKey> PipelineRun<K> {
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Succeeded
    }

    /// The context as the last job left it.
    pub fn context(&self) -> &PipelineContext<K> {
        &self.context
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn into_parts(self) -> (PipelineState, PipelineContext<K>, Option<PipelineError>) {
        (self.state, self.context, self.error)
    }

    /// The final result, or the error that ended the run.
    pub fn into_result(self) -> Result<TreeNode, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.context
            .into_final_result()
            .ok_or(PipelineError::MissingFinalResult)
    }
}
